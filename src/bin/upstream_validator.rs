use anyhow::Context;
use clap::Parser;
use sched_examples::utils::logger;
use sched_examples::validator::{FileStatus, SchemaChecker};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "upstream-validator")]
#[command(about = "Validate upstream data files against a JSON Schema")]
struct Args {
    /// Files to validate
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Schema file (JSON or YAML)
    #[arg(short, long, default_value = "schema.yml")]
    schema: PathBuf,

    /// File extensions to check; other files are skipped
    #[arg(long, value_delimiter = ',', default_value = "json,ndjson,yml,yaml")]
    ext: Vec<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    tracing::info!("🔍 Validating against schema {}", args.schema.display());
    let checker = SchemaChecker::from_path(&args.schema)
        .with_context(|| format!("failed to load schema {}", args.schema.display()))?;

    let summary = checker.check_files(&args.files, &args.ext);

    for report in &summary.reports {
        match &report.status {
            FileStatus::Passed { .. } => println!("PASS {}", report.path.display()),
            FileStatus::Failed(violations) => {
                println!("FAIL {}", report.path.display());
                for violation in violations {
                    println!("  {}", violation);
                }
            }
            FileStatus::Unreadable(reason) => {
                println!("FAIL {}", report.path.display());
                println!("  {}", reason);
            }
        }
    }
    for skipped in &summary.skipped {
        println!("SKIP {}", skipped.display());
    }

    println!(
        "{} passed, {} failed, {} skipped",
        summary.passed_count(),
        summary.failed_count(),
        summary.skipped.len()
    );

    if summary.all_passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
