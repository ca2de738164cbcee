use std::fs::File;
use std::io::Write;

use env_logger::Target;
use log::LevelFilter;

/// Initializes the `log`/`env_logger` sink from `--verbose`/`--quiet`/
/// `--log-output-file`, following `dmr/subcommands.rs`'s reference to
/// `crate::logging::init_logging` (the module it names but the retrieval
/// pack never included). `--verbose` raises the default filter to
/// `Debug`, `--quiet` drops it to `Error`; diagnostic text itself stays
/// free-form per spec.md §6 ("not part of any stable interface").
pub fn init_logging(verbose: bool, quiet: bool, log_output_file: Option<&str>) {
    let level = match (verbose, quiet) {
        (_, true) => LevelFilter::Error,
        (true, false) => LevelFilter::Debug,
        (false, false) => LevelFilter::Info,
    };

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);

    if let Some(path) = log_output_file {
        match File::create(path) {
            Ok(file) => {
                builder.target(Target::Pipe(Box::new(file) as Box<dyn Write + Send>));
            }
            Err(e) => {
                eprintln!("failed to open log output file {path}: {e}");
            }
        }
    }

    builder.init();
}
