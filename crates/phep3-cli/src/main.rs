use clap::Parser;
use phep3_cli::cli::{Cli, Command};
use phep3_cli::{CiEnvironment, commands};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ci = CiEnvironment::from_env();

    let result = match &cli.command {
        Command::Check(args) => commands::check(args, &ci, chrono::Utc::now()),
        Command::Compat(args) => commands::compat(args, &ci).await,
        Command::Interpret(args) => commands::interpret(args),
    };

    match result {
        Ok(run) => {
            print!("{}", run.render());
            ExitCode::from(u8::try_from(run.exit_code).unwrap_or(1))
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
