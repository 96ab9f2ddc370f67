//! # frrcheck CLI
//!
//! Validate, analyze and fix FRR (`bgpd.conf`, `frr.conf`, `zebra.conf`)
//! configuration files.
//!
//! ## Validate
//! ```sh
//! $ frrcheck validate /etc/frr/bgpd.conf
//! ======================================================================
//! BGP Configuration Validation Report: /etc/frr/bgpd.conf
//! ======================================================================
//!
//! ERRORS:
//!   - Line 1: No BGP router-id configured for router bgp 65001
//!
//! WARNINGS:
//!   - Line 2: Neighbor 10.0.1.1 is not activated in any address-family
//!   - Line 2: Neighbor 10.0.1.1 has no description
//!
//! Configuration validation failed
//!
//! Summary: 1 errors, 2 warnings
//! ======================================================================
//! ```
//! Exits 1 when any error is found, 0 otherwise.
//!
//! ## Analyze
//! ```sh
//! $ frrcheck analyze /etc/frr/bgpd.conf /etc/frr/zebra.conf
//! ```
//! Peer, policy, network, route-map and interface summaries plus best practice
//! recommendations. `--json` prints the same data as JSON.
//!
//! ## Fix
//! ```sh
//! $ frrcheck fix --backup --validate /etc/frr/bgpd.conf
//! ```
//! Adds missing neighbor descriptions, activations and soft-reconfiguration,
//! then prints a diff of the change.

use std::path::PathBuf;

use clap::Parser;
use log::debug;

use crate::analyze::{analyze, FileAnalysis};
use crate::config::{self, Settings};
use crate::document::ConfigDocument;
use crate::error::Result;
use crate::fix::{self, FixOptions};
use crate::validate::validate;

mod display;
mod table;

#[derive(Parser, Debug)]
#[clap(name = "frrcheck", version, rename_all = "kebab-case")]
/// Validate, analyze and fix FRR BGP configuration
pub struct Args {
    #[clap(subcommand)]
    pub cmd: Command,
    /// Show debug logs (additive for trace logs)
    #[clap(long, parse(from_occurrences), global = true)]
    pub verbose: u8,
    /// Path to a settings.toml
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[clap(rename_all = "kebab-case")]
pub enum Command {
    /// Check a BGP config against common policy rules
    #[clap(alias = "v")]
    Validate {
        /// Print the report as JSON
        #[clap(long)]
        json: bool,
        /// FRR config file
        path: PathBuf,
    },
    /// Summarize peers, policies and interfaces
    #[clap(alias = "a")]
    Analyze {
        /// Print the analysis as JSON
        #[clap(long)]
        json: bool,
        /// FRR config file(s)
        #[clap(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Add missing descriptions, activations and soft-reconfiguration in place
    Fix {
        /// Copy the original file to a timestamped backup directory first
        #[clap(short, long)]
        backup: bool,
        /// Validate the file after fixing it
        #[clap(short, long)]
        validate: bool,
        /// FRR config file
        path: PathBuf,
    },
}

fn load_settings(args: &Args) -> Result<Settings> {
    match &args.config {
        Some(path) => config::from_file(path),
        None => Ok(Settings::default()),
    }
}

/// Run the requested command, returning the process exit code
pub fn run(args: &Args) -> Result<i32> {
    let settings = load_settings(args)?;
    match &args.cmd {
        Command::Validate { json, path } => {
            let document = ConfigDocument::from_file(path)?;
            let report = validate(&document, &settings.validate);
            if *json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                display::print_report(&report);
            }
            Ok(report.exit_code())
        }
        Command::Analyze { json, paths } => {
            // Every file must load before anything is printed
            let analyses = paths
                .iter()
                .map(|path| {
                    ConfigDocument::from_file(path)
                        .map(|document| analyze(&document, &settings.validate))
                })
                .collect::<Result<Vec<FileAnalysis>>>()?;
            debug!("Analyzed {} file(s)", analyses.len());
            if *json {
                println!("{}", serde_json::to_string_pretty(&analyses)?);
            } else {
                for analysis in &analyses {
                    print!("{}", display::analysis_text(analysis));
                    println!();
                }
            }
            Ok(0)
        }
        Command::Fix {
            backup,
            validate,
            path,
        } => {
            let options = FixOptions {
                backup: *backup,
                validate: *validate,
            };
            let run = fix::run(path, options, &settings)?;
            display::print_fix(&run);
            if let Some(report) = &run.validation {
                println!();
                display::print_report(report);
            }
            // Post-fix validation failures are informational
            Ok(0)
        }
    }
}
