use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use covgate::cli::{self, Style};

/// covgate: coverage aggregation and release gating for CI.
#[derive(Parser)]
#[command(name = "covgate", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a coverage report against the gate.
    ///
    /// Exits 0 when the gate passes, 1 when it fails, 2 on internal errors
    /// (unreadable report, invalid configuration, no valid entries).
    Check {
        /// Path to the coverage report (cobertura XML, LCOV, or summary JSON).
        report: PathBuf,

        /// Path to the gate configuration.
        #[arg(long, default_value = "covgate.toml")]
        config: PathBuf,

        /// Override format detection (cobertura, lcov, summary-json).
        #[arg(long)]
        format: Option<String>,

        /// Output style.
        #[arg(long, value_enum, default_value = "text")]
        style: Style,
    },

    /// Print per-component aggregation without gating.
    Components {
        /// Path to the coverage report.
        report: PathBuf,

        /// Path to the gate configuration.
        #[arg(long, default_value = "covgate.toml")]
        config: PathBuf,

        /// Override format detection (cobertura, lcov, summary-json).
        #[arg(long)]
        format: Option<String>,

        /// Sort by coverage rate ascending (worst components first).
        #[arg(long)]
        sort_by_coverage: bool,
    },

    /// Validate the configuration and print the compiled rule set.
    Rules {
        /// Path to the gate configuration.
        #[arg(long, default_value = "covgate.toml")]
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Check {
            report,
            config,
            format,
            style,
        } => {
            let (output, verdict) = cli::cmd_check(&report, format.as_deref(), &config, &style)?;
            print!("{output}");
            Ok(ExitCode::from(verdict.exit_code()))
        }
        Commands::Components {
            report,
            config,
            format,
            sort_by_coverage,
        } => {
            let output =
                cli::cmd_components(&report, format.as_deref(), &config, sort_by_coverage)?;
            print!("{output}");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Rules { config } => {
            let output = cli::cmd_rules(&config)?;
            print!("{output}");
            Ok(ExitCode::SUCCESS)
        }
    }
}
