// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::{error::SignCheckError, inspect::inspect_paths, signing_information},
    clap::{ArgAction, CommandFactory, Parser},
    log::LevelFilter,
    std::path::PathBuf,
};

/// Inspect the code signing certificates of Apple application bundles.
///
/// For every path given, prints the signing certificate's SHA-256
/// fingerprint, the developer identifier, and the developer display name.
/// Missing information is reported on stderr and does not stop processing
/// of the remaining paths.
#[derive(Parser)]
#[command(name = "rsigncheck", author, version)]
struct Cli {
    /// Increase logging verbosity. Can be specified multiple times
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Paths to application bundles or code objects to inspect
    paths: Vec<PathBuf>,
}

pub fn main_impl() -> Result<i32, SignCheckError> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level.as_str()),
    );

    // Disable log context except at higher log levels.
    if log_level <= LevelFilter::Info {
        builder
            .format_timestamp(None)
            .format_level(false)
            .format_target(false);
    }

    builder.init();

    if cli.paths.is_empty() {
        println!("{}", Cli::command().render_usage());
        return Ok(0);
    }

    inspect_paths(
        &cli.paths,
        signing_information::query_path,
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    )
}
