use clap::Parser;
use harbor_migrate::cli::{Args, Runner};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    Runner::new(args).run().await
}
