use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use fbc::core::diag::format_error;
use fbc::driver::config::CheckerConfig;
use fbc::driver::{CheckReport, check_unit_source, dump_stores};
use fbc::telemetry;

#[derive(Parser)]
#[command(author, version, about = "Object initialization checker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a unit manifest
    Check {
        unit: PathBuf,

        /// Checker configuration; defaults apply when the file is absent
        #[arg(long, default_value = "fbc.toml")]
        config: PathBuf,

        /// Comma-separated list of things to dump: classes,stores
        #[arg(long)]
        dump: Option<String>,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run() -> anyhow::Result<bool> {
    let cli = Cli::parse();
    match cli.command {
        Command::Check { unit, config, dump } => check(&unit, &config, dump.as_deref()),
    }
}

fn check(unit: &Path, config: &Path, dump: Option<&str>) -> anyhow::Result<bool> {
    let config = CheckerConfig::load(config)?;
    telemetry::init(&config.log);

    let source = std::fs::read_to_string(unit)
        .with_context(|| format!("could not read {}", unit.display()))?;
    let path = unit.display();

    let report = match check_unit_source(&source, &config) {
        Ok(report) => report,
        Err(errors) => {
            for error in errors {
                println!("{path}:{}", format_error(&source, error.span(), &error));
            }
            return Ok(false);
        }
    };

    let mut dump_classes = false;
    let mut dump_flow = false;
    for item in dump.unwrap_or("").split(',').map(|s| s.trim().to_lowercase()) {
        match item.as_str() {
            "classes" => dump_classes = true,
            "stores" => dump_flow = true,
            "" => {}
            _ => eprintln!("[WARN] unknown dump flag: {item}"),
        }
    }
    if dump_classes {
        println!("Classes:");
        println!("--------------------------------");
        print!("{}", report.classes);
        println!("--------------------------------");
    }
    if dump_flow {
        println!("Exit stores:");
        println!("--------------------------------");
        print!("{}", dump_stores(&report));
        println!("--------------------------------");
    }

    print_report(&source, &path.to_string(), &report);
    Ok(report.is_clean())
}

fn print_report(source: &str, path: &str, report: &CheckReport) {
    for error in &report.invariant_errors {
        println!("{path}:{}", format_error(source, error.span, error));
    }
    for error in &report.diagnostics {
        println!(
            "{path}:{} [{}]",
            format_error(source, error.span, error),
            error.kind.key()
        );
    }
}
