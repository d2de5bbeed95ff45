use clap::Parser;
use colored::*;
use seqsim::cli::{Cli, Commands, Context};
use seqsim::SeqsimError;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // SEQSIM_LOG sets the default level; RUST_LOG still takes precedence
    let log_level = match cli.verbose {
        0 => std::env::var("SEQSIM_LOG").unwrap_or_else(|_| "info".to_string()),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(exit_code(&e));
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::from_cli(&cli)?;

    match cli.command {
        Commands::Matrix(args) => seqsim::cli::commands::matrix::run(ctx, args),
        Commands::Align(args) => seqsim::cli::commands::align::run(ctx, args),
        Commands::Extremes(args) => seqsim::cli::commands::extremes::run(args),
        Commands::Tree(args) => seqsim::cli::commands::tree::run(ctx, args),
    }
}

fn exit_code(e: &anyhow::Error) -> i32 {
    if e.downcast_ref::<seqsim::bio::alignment::AlignmentError>().is_some() {
        return 6;
    }
    match e.downcast_ref::<SeqsimError>() {
        Some(SeqsimError::Config(_)) => 2,
        Some(SeqsimError::Io(_)) => 3,
        Some(SeqsimError::Parse(_)) | Some(SeqsimError::NotFound(_)) => 4,
        Some(SeqsimError::Worker { .. }) => 5,
        Some(SeqsimError::InsufficientData(_))
        | Some(SeqsimError::InvalidInput(_))
        | Some(SeqsimError::InvalidDistance(_)) => 6,
        _ => 1,
    }
}
