use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use verbaudit::cli::{AuditArgs, Cli, Commands};
use verbaudit::reporter::{ConsoleReporter, HtmlExporter, JsonExporter};
use verbaudit::{Auditor, CancellationFlag, HttpClient};

const EXIT_NO_ENDPOINTS: u8 = 2;
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let verbose = matches!(&cli.command, Commands::Audit(args) if args.verbose);
    init_logging(verbose);

    match cli.command {
        Commands::Audit(args) => run_audit(args).await,
        Commands::Report {
            input,
            format,
            output,
        } => {
            let report = JsonExporter::load(&input)?;

            match format.as_str() {
                "html" => {
                    let output = output.unwrap_or_else(|| "report.html".to_string());
                    HtmlExporter::export(&report, &output)?;
                    println!("{} HTML report saved to {}", "✓".green(), output);
                }
                "json" => match output {
                    Some(path) => {
                        JsonExporter::export(&report, &path)?;
                        println!("{} JSON report saved to {}", "✓".green(), path);
                    }
                    None => println!("{}", JsonExporter::to_string(&report)?),
                },
                "console" => ConsoleReporter::new().print_report(&report),
                other => bail!("Unknown format '{}'. Use html, json or console", other),
            }

            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "verbaudit=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run_audit(args: AuditArgs) -> Result<ExitCode> {
    let config = args.to_config()?;

    let format = match args.format.as_deref() {
        None if args.output.is_none() => None,
        None | Some("json") => Some("json"),
        Some("html") => Some("html"),
        Some(other) => bail!("Unknown format '{}'. Use json or html", other),
    };
    // Machine-readable output on stdout replaces the console view.
    let console = format.is_none() || args.output.is_some();

    if console {
        println!("\n{}", "verbaudit - HTTP Method Audit".cyan().bold());
        println!("{}", "=".repeat(50).dimmed());
        println!("{}: {}", "Target".bold(), config.target);
        println!(
            "{}: {}",
            "Methods".bold(),
            config
                .methods
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        if config.discover {
            println!(
                "{}: depth {}, max {} endpoints",
                "Discovery".bold(),
                config.limits.max_depth,
                config.limits.max_endpoints
            );
        }
        println!();
    }

    let cancel = CancellationFlag::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if on_signal.interrupt() {
                eprintln!("{}", "Aborted".red());
                std::process::exit(EXIT_INTERRUPTED);
            }
            warn!("Interrupt received; finishing in-flight probes (press Ctrl-C again to quit)");
        }
    });

    let client = HttpClient::new().context("Failed to initialise HTTP client")?;
    let auditor = Auditor::new(Arc::new(client))
        .with_cancellation(cancel)
        .with_progress(console, args.verbose);

    let report = auditor.run(&config).await?;

    if console {
        ConsoleReporter::new().print_report(&report);
    }

    match (format, &args.output) {
        (Some("html"), Some(path)) => {
            HtmlExporter::export(&report, path)?;
            println!("{} HTML report saved to {}", "✓".green(), path);
        }
        (Some(_), Some(path)) => {
            JsonExporter::export(&report, path)?;
            println!("{} JSON report saved to {}", "✓".green(), path);
        }
        (Some("html"), None) => println!("{}", HtmlExporter::render(&report)?),
        (Some(_), None) => println!("{}", JsonExporter::to_string(&report)?),
        (None, _) => {}
    }

    if report.no_endpoints_tested() {
        return Ok(ExitCode::from(EXIT_NO_ENDPOINTS));
    }
    Ok(ExitCode::SUCCESS)
}
