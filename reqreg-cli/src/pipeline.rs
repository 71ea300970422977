//! Full processing pipeline: renumber, validate, priority, register

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

use reqreg_core::{
    assign_priorities, discover_projects, refresh_priority_column, renumber_dir, update_register,
    validate_collection, Config, DirStore, IdScheme, PriorityReport, RegisterUpdate,
    RenumberReport, ValidationReport,
};

const BANNER_WIDTH: usize = 60;

const DRY_RUN_NOTICE: &str = "[DRY RUN] No files were modified.";

/// Which steps of the pipeline run and how
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub dry_run: bool,
    pub skip_renumber: bool,
    pub skip_validate: bool,
    pub strict_validate: bool,
    pub skip_priority: bool,
    pub skip_register: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Renumber,
    Validate,
    Priority,
    Register,
}

impl Step {
    pub fn description(self) -> &'static str {
        match self {
            Step::Renumber => "Renumbering requirement documents",
            Step::Validate => "Validating requirement documents",
            Step::Priority => "Assigning MoSCoW priorities",
            Step::Register => "Rebuilding README requirements register",
        }
    }
}

impl PipelineOptions {
    /// Steps that will run, in execution order
    pub fn active_steps(&self) -> Vec<Step> {
        let mut steps = Vec::with_capacity(4);
        if !self.skip_renumber {
            steps.push(Step::Renumber);
        }
        if !self.skip_validate {
            steps.push(Step::Validate);
        }
        if !self.skip_priority {
            steps.push(Step::Priority);
        }
        if !self.skip_register {
            steps.push(Step::Register);
        }
        steps
    }
}

fn print_banner(text: &str) {
    let border = "=".repeat(BANNER_WIDTH);
    println!("\n{}", border);
    println!("  {}", text.bold());
    println!("{}", border);
}

/// Runs the active steps over one project directory
pub fn run_project(
    dir: &Path,
    readme: &Path,
    config: &Config,
    options: &PipelineOptions,
) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Requirements directory not found: {}", dir.display());
    }
    let scheme = config.scheme()?;
    let steps = options.active_steps();

    for (index, step) in steps.iter().enumerate() {
        print_banner(&format!(
            "Step {} of {}: {}",
            index + 1,
            steps.len(),
            step.description()
        ));

        match step {
            Step::Renumber => {
                let report = renumber_dir(dir, &config.extension, &scheme, options.dry_run)?;
                print_renumber_report(&report);
            }
            Step::Validate => {
                let store = open_store(dir, config)?;
                let report = validate_collection(&store, &scheme)?;
                print_validation_report(&report);
                if !report.is_ok() {
                    if options.strict_validate {
                        anyhow::bail!(
                            "{} document(s) failed template validation in {}",
                            report.failures.len(),
                            dir.display()
                        );
                    }
                    eprintln!(
                        "  {} {} document(s) have template violations; \
                         run with --strict-validate to abort on errors.",
                        "[WARN]".yellow(),
                        report.failures.len()
                    );
                }
            }
            Step::Priority => {
                let mut store = open_store(dir, config)?;
                let report = assign_priorities(&mut store, &scheme, options.dry_run)?;
                print_priority_report(&report);

                // The register rebuild rewrites the whole table, so the
                // column-only update is for runs that skip it
                if options.skip_register && !options.dry_run {
                    update_priority_column(readme, &report, &scheme)?;
                }
            }
            Step::Register => {
                let store = open_store(dir, config)?;
                let update = update_register(&store, &scheme, readme, options.dry_run)?;
                print_register_update(&update, readme, options.dry_run);
                println!("\nRegister contains {} requirements.", update.total);
            }
        }
    }

    if options.dry_run {
        print_dry_run_notice();
    } else {
        println!("\n{}", "Pipeline complete.".green());
    }
    Ok(())
}

/// Discovers every project under `root` and runs the pipeline over each
pub fn run_all(root: &Path, config: &Config, options: &PipelineOptions) -> Result<()> {
    let scheme = config.scheme()?;
    let projects = discover_projects(root, &config.extension, &scheme)
        .with_context(|| format!("Requirements root not found: {}", root.display()))?;

    if projects.is_empty() {
        println!(
            "{} No project directories with {}-*.{} documents found under {}.",
            "[WARN]".yellow(),
            scheme.prefix(),
            config.extension,
            root.display()
        );
        return Ok(());
    }

    println!(
        "Discovered {} project(s): {}",
        projects.len(),
        project_names(&projects).join(", ")
    );

    for project in &projects {
        print_banner(&format!("Project: {}", project_name(project)));
        run_project(project, &config.readme_for(project), config, options)?;
        println!();
    }
    Ok(())
}

fn project_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn project_names(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| project_name(p)).collect()
}

pub fn open_store(dir: &Path, config: &Config) -> Result<DirStore> {
    DirStore::open(dir, &config.extension)
        .with_context(|| format!("Failed to open requirements directory {}", dir.display()))
}

/// Explicit README path, or the configured register inside `dir`
pub fn resolve_readme(config: &Config, dir: &Path, explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| config.readme_for(dir))
}

/// Standalone priority pass; the register's Priority column follows unless
/// this is a dry run
pub fn run_priority(
    dir: &Path,
    readme: Option<PathBuf>,
    config: &Config,
    dry_run: bool,
) -> Result<PriorityReport> {
    let scheme = config.scheme()?;
    let mut store = open_store(dir, config)?;
    let report = assign_priorities(&mut store, &scheme, dry_run)?;
    print_priority_report(&report);

    if dry_run {
        print_dry_run_notice();
    } else {
        let readme = resolve_readme(config, dir, readme);
        update_priority_column(&readme, &report, &scheme)?;
    }
    Ok(report)
}

/// Writes the Priority column of `readme` from a priority pass
pub fn update_priority_column(
    readme: &Path,
    report: &PriorityReport,
    scheme: &IdScheme,
) -> Result<()> {
    println!("\nUpdating register: {}", readme.display());
    if refresh_priority_column(readme, &report.priorities(), scheme)? {
        println!("Done.");
    }
    Ok(())
}

pub fn print_renumber_report(report: &RenumberReport) {
    if report.map.is_empty() {
        println!(
            "\nNo gaps or padding inconsistencies found in {} requirement(s). Nothing to renumber.",
            report.total
        );
        return;
    }

    println!(
        "\nFound {} ID(s) to renumber (pad={}):",
        report.map.len(),
        report.pad
    );
    for mapping in report.map.iter() {
        println!("  {}  →  {}", mapping.old, mapping.new.green());
    }

    if let Some(summary) = renumber_summary(report) {
        println!("\n{}", summary);
    }
}

/// Closing line of a renumber report; none for dry runs, whose notice is
/// printed once by the command
fn renumber_summary(report: &RenumberReport) -> Option<String> {
    (!report.dry_run).then(|| {
        format!(
            "Renumber complete: {} file(s) renamed, {} unchanged.",
            report.renamed,
            report.unchanged()
        )
    })
}

pub fn print_dry_run_notice() {
    println!("\n{}", DRY_RUN_NOTICE.yellow());
}

pub fn print_validation_report(report: &ValidationReport) {
    for (key, violations) in &report.failures {
        eprintln!("  {} {}", "[FAIL]".red(), key);
        for violation in violations {
            eprintln!("         • {}", violation);
        }
    }

    let label = if report.is_ok() {
        "OK".green()
    } else {
        "FAILED".red()
    };
    println!(
        "\n  Validation: {}/{} passed, {} failed: {}",
        report.passed(),
        report.total,
        report.failures.len(),
        label
    );
}

pub fn print_priority_report(report: &PriorityReport) {
    let header = format!(
        "{:<10}  {:>3}  {:>3}  {:>5}  {:<8}  Note",
        "ID", "CS", "CD", "Sum", "Priority"
    );
    println!("\n{}", header);
    println!("{}", "-".repeat(header.len()));

    for row in &report.rows {
        let note = if row.cd_override() {
            "(CD=5 override)"
        } else {
            ""
        };
        println!(
            "{:<10}  {:>3}  {:>3}  {:>5}  {:<8}  {}",
            row.id,
            row.cs,
            row.cd,
            row.cs + row.cd,
            row.priority.to_string(),
            note
        );
    }
    for (key, reason) in &report.skipped {
        eprintln!("  {} {}: {}", "[SKIP]".yellow(), key, reason);
    }

    println!("{}", "-".repeat(header.len()));
    println!(
        "\n{} requirements processed, {} skipped.",
        report.rows.len(),
        report.skipped.len()
    );
}

pub fn print_register_update(update: &RegisterUpdate, readme: &Path, dry_run: bool) {
    if !update.skipped.is_empty() {
        eprintln!(
            "{} {} document(s) skipped due to parse errors: {}",
            "[WARN]".yellow(),
            update.skipped.len(),
            update.skipped.join(", ")
        );
    }
    if update.total == 0 {
        eprintln!("{} No parseable requirement documents found.", "[WARN]".yellow());
        return;
    }

    if dry_run {
        println!(
            "\n--- Generated metrics block ({} requirements) ---\n",
            update.total
        );
        println!("{}", update.metrics_block);
        println!("\n--- Generated table ({} requirements) ---\n", update.total);
        println!("{}", update.table);
        println!("\n{}", "[DRY RUN] README not modified.".yellow());
        return;
    }

    if update.created {
        println!("Created README: {}", readme.display());
    }
    println!(
        "Register updated: {} requirements written to {}",
        update.total,
        readme.display()
    );
}
