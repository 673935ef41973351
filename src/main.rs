use colored::*;
use spec_runner::{cli, core::builtins};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    spec_runner::init();

    match cli::run(builtins::builtin_registry()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
