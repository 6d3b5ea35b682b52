//! appleseed-maya packager.
//!
//! Builds a relocatable appleseed-maya package and zips it. Exits with code 1
//! on any packaging failure.

use appleseed_maya_package::cli;
use std::process;

#[tokio::main]
async fn main() {
    let args = cli::Args::parse_args();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let exit_code = match cli::run(&args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
