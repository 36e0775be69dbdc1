pub mod application;
pub mod export;
pub mod job;
pub mod profile;
pub mod score_check;
