pub mod api_client;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exchange;
pub mod models;
pub mod orchestrator;
pub mod poller;
pub mod score_table;
pub mod session;
pub mod share;
pub mod view;

#[cfg(test)]
mod testing;
