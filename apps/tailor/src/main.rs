use clap::Parser;
use tracing::error;

use tailor::cli::{dispatch, Args};

#[tokio::main]
async fn main() {
    if let Err(e) = dispatch(Args::parse()).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}
