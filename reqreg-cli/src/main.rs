mod cli;
mod pipeline;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use reqreg_core::{export_json, renumber_dir, update_register, validate_collection, Config};

use crate::cli::{Cli, Command};
use crate::pipeline::{
    open_store, print_dry_run_notice, print_register_update, print_renumber_report,
    print_validation_report, resolve_readme, run_all, run_priority, run_project, PipelineOptions,
};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "[ERROR]".red(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::resolve(cli.config.as_deref())?;
    log::debug!("Effective config: {:?}", config);

    match cli.command {
        Command::Run {
            req_dir,
            readme,
            req_root,
            dry_run,
            steps,
        } => {
            let options = PipelineOptions {
                dry_run,
                skip_renumber: steps.skip_renumber,
                skip_validate: steps.skip_validate,
                strict_validate: steps.strict_validate,
                skip_priority: steps.skip_priority,
                skip_register: steps.skip_register,
            };

            match req_dir {
                Some(dir) => {
                    let readme = resolve_readme(&config, &dir, readme);
                    run_project(&dir, &readme, &config, &options)?;
                }
                None => {
                    let root = req_root.unwrap_or_else(|| config.req_root.clone());
                    run_all(&root, &config, &options)?;
                }
            }
        }
        Command::Renumber { req_dir, dry_run } => {
            let scheme = config.scheme()?;
            let report = renumber_dir(&req_dir, &config.extension, &scheme, dry_run)?;
            print_renumber_report(&report);
            if report.dry_run {
                print_dry_run_notice();
            }
        }
        Command::Validate { req_dir, strict } => {
            let scheme = config.scheme()?;
            let store = open_store(&req_dir, &config)?;
            let report = validate_collection(&store, &scheme)?;
            print_validation_report(&report);
            if strict && !report.is_ok() {
                anyhow::bail!(
                    "{} document(s) failed template validation",
                    report.failures.len()
                );
            }
        }
        Command::Priority {
            req_dir,
            readme,
            dry_run,
        } => {
            run_priority(&req_dir, readme, &config, dry_run)?;
        }
        Command::Register {
            req_dir,
            readme,
            dry_run,
        } => {
            let scheme = config.scheme()?;
            let store = open_store(&req_dir, &config)?;
            let readme = resolve_readme(&config, &req_dir, readme);
            let update = update_register(&store, &scheme, &readme, dry_run)
                .with_context(|| format!("Failed to update register {}", readme.display()))?;
            print_register_update(&update, &readme, dry_run);
        }
        Command::Export { req_dir, output } => {
            let scheme = config.scheme()?;
            let store = open_store(&req_dir, &config)?;
            export_json(&store, &scheme, output.as_deref())?;
        }
    }

    Ok(())
}
