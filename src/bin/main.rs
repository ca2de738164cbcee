use std::process::ExitCode;

use clap::Parser;
use log::error;

use idr_rs::cli::Cli;
use idr_rs::errs::IdrError;
use idr_rs::logging::init_logging;

#[derive(Parser, Debug)]
#[command(
    name = "idrs",
    about = "Compute the Irreproducible Discovery Rate (IDR) between two \
             replicate peak-call experiments"
)]
struct TopLevel {
    #[command(flatten)]
    cli: Cli,
}

fn main() -> ExitCode {
    let args = TopLevel::parse();
    init_logging(
        args.cli.verbose,
        args.cli.quiet,
        args.cli.log_output_file.as_deref(),
    );

    match idr_rs::cli::run(args.cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}

/// Maps error kinds to process exit codes per spec.md §6: 0 success;
/// non-zero on unrecognized rank specifier, negative signal, fewer than 20
/// merged peaks (merged set still written), or non-finite parameter
/// divergence. An unrecognized `--input-file-type` value never reaches
/// here: it's a `clap::ValueEnum`, so `clap::Parser::parse()` rejects it
/// (and exits) before `main` ever calls `cli::run`.
fn exit_code_for(err: &IdrError) -> u8 {
    match err {
        IdrError::UnrecognizedRank { .. } => 2,
        IdrError::NegativeSignal { .. } | IdrError::MalformedRecord { .. } => 3,
        IdrError::InsufficientData { .. } => 4,
        IdrError::NonFiniteLikelihood
        | IdrError::BracketFailure { .. }
        | IdrError::NonFiniteParams(_) => 5,
        IdrError::Io(_) => 6,
    }
}
