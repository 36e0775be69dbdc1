// Job orchestration: one module per view that drives backend jobs.
// Every flow takes the Session explicitly and reports through a ViewSender;
// poll sessions live inside the flow and are stopped when it returns or is dropped.

pub mod export;
pub mod launch;
pub mod results;
pub mod status;
pub mod tracker;
pub mod wizard;
