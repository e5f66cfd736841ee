use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;
use indicatif::{ProgressBar, ProgressStyle};
use lodestone::handlers::{expand_out_dir, run_arcgis_scan, run_openapi_scan};
use lodestone_core::print_banner;
use lodestone_core::report::{generate_text_summary, RunStatus, ScanReport};
use lodestone_scanner::walker::ProgressCallback;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

mod commands;

fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    let outcome = match chosen_command.subcommand() {
        Some(("arcgis", primary_command)) => handle_arcgis(primary_command),
        Some(("openapi", primary_command)) => handle_openapi(primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    match outcome {
        Ok(report) => {
            print!("{}", generate_text_summary(&report));
            match report.status {
                RunStatus::Complete => {
                    println!("{}", "✓ Export complete!".green());
                }
                RunStatus::LimitReached => {
                    println!(
                        "{}",
                        "✓ Export complete (scan limit reached, partial catalog)".yellow()
                    );
                }
                RunStatus::Aborted => {
                    eprintln!("{}", "✗ Scan aborted; partial bundle was written".red());
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("{} {}", "✗ Export failed:".red(), e);
            std::process::exit(1);
        }
    }
}

// Handler functions
fn handle_arcgis(args: &ArgMatches) -> anyhow::Result<ScanReport> {
    tracing_subscriber::fmt::init();

    let url = args.get_one::<Url>("url").unwrap();
    let limit = *args.get_one::<u64>("limit").unwrap() as usize;
    let out_dir = expand_out_dir(args.get_one::<String>("out").unwrap());
    let allowed: Vec<String> = args
        .get_many::<String>("allow")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    println!("Scanning services directory {}", url);
    let spinner = scan_spinner();
    let report = run_arcgis_scan(
        url.as_str(),
        limit,
        out_dir,
        allowed,
        Some(spinner_callback(&spinner)),
    );
    spinner.finish_and_clear();
    report
}

fn handle_openapi(args: &ArgMatches) -> anyhow::Result<ScanReport> {
    tracing_subscriber::fmt::init();

    let file = args.get_one::<PathBuf>("FILE").unwrap();
    let limit = *args.get_one::<u64>("limit").unwrap() as usize;
    let out_dir = expand_out_dir(args.get_one::<String>("out").unwrap());

    println!("Scanning document {}", file.display());
    let spinner = scan_spinner();
    let report = run_openapi_scan(file, limit, out_dir, Some(spinner_callback(&spinner)));
    spinner.finish_and_clear();
    report
}

fn scan_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("starting scan");
    spinner
}

fn spinner_callback(spinner: &ProgressBar) -> ProgressCallback {
    let spinner = spinner.clone();
    Arc::new(move |node: String| {
        spinner.set_message(node);
    })
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
