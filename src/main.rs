use clap::Parser;
use colored::*;
use env_logger::Builder;
use log::{debug, LevelFilter};

use frrcheck::cli::{run, Args};

fn main() {
    let args = Args::parse();

    let (frrcheck_level, other_level) = match args.verbose {
        0 => (LevelFilter::Info, LevelFilter::Warn),
        1 => (LevelFilter::Debug, LevelFilter::Warn),
        2 => (LevelFilter::Trace, LevelFilter::Warn),
        _ => (LevelFilter::Trace, LevelFilter::Trace),
    };
    Builder::new()
        .filter(Some("frrcheck"), frrcheck_level)
        .filter(None, other_level)
        .init();
    debug!("Logging at levels {}/{}", frrcheck_level, other_level);

    let code = match run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}", err.to_string().red());
            2
        }
    };
    std::process::exit(code);
}
