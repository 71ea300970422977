//! README register generation
//!
//! The register is a markdown README holding a metrics block delimited by
//! `<!-- metrics:start -->` / `<!-- metrics:end -->` and a table with one row
//! per requirement. Both are regenerated from the documents; the rest of the
//! README is left as written.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use log::{info, warn};
use regex::{NoExpand, Regex};
use serde::Serialize;

use crate::fields;
use crate::ident::IdScheme;
use crate::models::{Priority, Requirement, DEFAULT_STATUS, DEFAULT_TYPE};
use crate::storage::DocumentStore;

pub const METRICS_START: &str = "<!-- metrics:start -->";
pub const METRICS_END: &str = "<!-- metrics:end -->";

static METRICS_BLOCK: OnceLock<Regex> = OnceLock::new();
static LEGACY_TOTAL: OnceLock<Regex> = OnceLock::new();

fn metrics_block_regex() -> &'static Regex {
    METRICS_BLOCK.get_or_init(|| {
        Regex::new(r"(?s)<!-- metrics:start -->.*?<!-- metrics:end -->")
            .expect("literal metrics pattern")
    })
}

fn legacy_total_regex() -> &'static Regex {
    LEGACY_TOTAL.get_or_init(|| {
        Regex::new(r"\*\*Total requirements:\*\*\s*\d+").expect("literal total pattern")
    })
}

/// Summary counts over a set of requirements
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub total: usize,

    pub must: usize,
    pub should: usize,
    pub could: usize,
    pub wont: usize,

    pub functional: usize,
    pub non_functional: usize,
    pub constraint: usize,
    pub interface: usize,
    pub environmental: usize,
    pub other_type: usize,

    pub draft: usize,
    pub reviewed: usize,
    pub approved: usize,
    pub deprecated: usize,
    pub other_status: usize,

    pub avg_cs: f64,
    pub avg_cd: f64,
}

impl Metrics {
    pub fn compute(records: &[Requirement]) -> Self {
        let mut m = Metrics {
            total: records.len(),
            ..Default::default()
        };

        for req in records {
            match req.priority.as_deref().and_then(Priority::from_label) {
                Some(Priority::Must) => m.must += 1,
                Some(Priority::Should) => m.should += 1,
                Some(Priority::Could) => m.could += 1,
                Some(Priority::Wont) => m.wont += 1,
                None => {}
            }

            let req_type = req.req_type.as_deref().unwrap_or("").trim().to_lowercase();
            match req_type.as_str() {
                "functional" => m.functional += 1,
                "non-functional" | "non_functional" => m.non_functional += 1,
                "constraint" => m.constraint += 1,
                "interface" => m.interface += 1,
                "environmental" => m.environmental += 1,
                _ => m.other_type += 1,
            }

            let status = req.status.as_deref().unwrap_or("").trim().to_lowercase();
            match status.as_str() {
                "draft" => m.draft += 1,
                "reviewed" => m.reviewed += 1,
                "approved" => m.approved += 1,
                "deprecated" => m.deprecated += 1,
                _ => m.other_status += 1,
            }
        }

        if !records.is_empty() {
            let n = records.len() as f64;
            m.avg_cs = records.iter().map(|r| f64::from(r.cs)).sum::<f64>() / n;
            m.avg_cd = records.iter().map(|r| f64::from(r.cd)).sum::<f64>() / n;
        }
        m
    }
}

fn push_count_table(lines: &mut Vec<String>, heading: &str, rows: &[(&str, usize)], total: usize) {
    lines.push(format!("### {}", heading));
    lines.push(String::new());
    lines.push(format!("| {} | Count |", heading));
    lines.push(format!("| {} | ----: |", "-".repeat(heading.len())));
    for (label, count) in rows {
        lines.push(format!("| {} | {} |", label, count));
    }
    lines.push(format!("| **Total** | **{}** |", total));
    lines.push(String::new());
}

/// Renders the delimited metrics block: priority, type and status tables
pub fn render_metrics(m: &Metrics) -> String {
    let mut lines = vec![
        METRICS_START.to_string(),
        String::new(),
        "## Metrics".to_string(),
        String::new(),
    ];
    push_count_table(
        &mut lines,
        "Priority",
        &[
            ("Must", m.must),
            ("Should", m.should),
            ("Could", m.could),
            ("Won't", m.wont),
        ],
        m.total,
    );
    push_count_table(
        &mut lines,
        "Type",
        &[
            ("Functional", m.functional),
            ("Non-functional", m.non_functional),
            ("Constraint", m.constraint),
            ("Interface", m.interface),
            ("Environmental", m.environmental),
        ],
        m.total,
    );
    push_count_table(
        &mut lines,
        "Status",
        &[
            ("Draft", m.draft),
            ("Reviewed", m.reviewed),
            ("Approved", m.approved),
            ("Deprecated", m.deprecated),
        ],
        m.total,
    );
    lines.push(METRICS_END.to_string());
    lines.join("\n")
}

/// Renders the requirements table, without a trailing newline.
///
/// The Priority column is present only when some record carries a priority.
/// Titles missing from the documents are taken from `fallback_titles`.
pub fn render_table(records: &[Requirement], fallback_titles: &HashMap<String, String>) -> String {
    let has_priority = records.iter().any(|r| r.priority.is_some());

    let mut rows = if has_priority {
        vec![
            "| ID | Title | Type | CS | CD | Status | Priority | File |".to_string(),
            "| -- | ----- | ---- | -- | -- | ------ | -------- | ---- |".to_string(),
        ]
    } else {
        vec![
            "| ID | Title | Type | CS | CD | Status | File |".to_string(),
            "| -- | ----- | ---- | -- | -- | ------ | ---- |".to_string(),
        ]
    };

    for req in records {
        let id = req.id.as_str();
        let title = req
            .title
            .as_deref()
            .or_else(|| fallback_titles.get(id).map(String::as_str))
            .unwrap_or("");
        let req_type = req.req_type.as_deref().unwrap_or(DEFAULT_TYPE);
        let status = req.status.as_deref().unwrap_or(DEFAULT_STATUS);
        let link = format!("[{id}.md]({id}.md)");

        if has_priority {
            rows.push(format!(
                "| {} | {} | {} | {} | {} | {} | {} | {} |",
                id,
                title,
                req_type,
                req.cs,
                req.cd,
                status,
                req.priority.as_deref().unwrap_or(""),
                link
            ));
        } else {
            rows.push(format!(
                "| {} | {} | {} | {} | {} | {} | {} |",
                id, title, req_type, req.cs, req.cd, status, link
            ));
        }
    }

    rows.join("\n")
}

/// Replaces the metrics block in `text`, or the legacy
/// `**Total requirements:** N` line when there is no block
pub fn replace_metrics(text: &str, block: &str) -> String {
    let delimited = metrics_block_regex();
    if delimited.is_match(text) {
        return delimited.replace_all(text, NoExpand(block)).into_owned();
    }
    let legacy = legacy_total_regex();
    if legacy.is_match(text) {
        return legacy.replace_all(text, NoExpand(block)).into_owned();
    }
    text.to_string()
}

fn is_table_header(line: &str) -> bool {
    line.starts_with('|') && line.contains("| ID |") && line.contains("| Title |")
}

/// Replaces the requirements table in `text` with `table`.
///
/// The table is the run of consecutive `|` lines starting at a header that
/// contains both `| ID |` and `| Title |`. Text without such a header is
/// returned unchanged.
pub fn replace_table(text: &str, table: &str) -> String {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < lines.len() {
        if is_table_header(lines[i].trim()) {
            while i < lines.len() && lines[i].trim().starts_with('|') {
                i += 1;
            }
            out.push_str(table);
            out.push('\n');
            continue;
        }
        out.push_str(lines[i]);
        i += 1;
    }
    out
}

fn table_cells(line: &str) -> Option<Vec<&str>> {
    let inner = line.trim().strip_prefix('|')?;
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    Some(inner.split('|').map(str::trim).collect())
}

/// Titles of the rows already present in a register, keyed by identifier
pub fn fallback_titles(readme_text: &str, scheme: &IdScheme) -> HashMap<String, String> {
    readme_text
        .lines()
        .filter_map(table_cells)
        .filter(|cells| cells.len() >= 2 && scheme.is_identifier(cells[0]))
        .map(|cells| (cells[0].to_string(), cells[1].to_string()))
        .collect()
}

/// Skeleton README for a project that does not have one yet
pub fn readme_template(project_name: &str) -> String {
    let lines = [
        format!("# Requirements Register: {}", project_name),
        String::new(),
        format!(
            "This folder contains the requirements for **{}**.",
            project_name
        ),
        String::new(),
        "Each requirement is documented in its own file following the Volere-inspired \
         template. This README serves as the central register and entry point for all \
         requirements in this project."
            .to_string(),
        String::new(),
        render_metrics(&Metrics::default()),
        String::new(),
        "## Requirements".to_string(),
        String::new(),
        "| ID | Title | Type | CS | CD | Status | Priority | File |".to_string(),
        "| -- | ----- | ---- | -- | -- | ------ | -------- | ---- |".to_string(),
        String::new(),
    ];
    lines.join("\n")
}

/// Result of a register rebuild
#[derive(Debug, Clone, Default)]
pub struct RegisterUpdate {
    /// Requirements listed in the table
    pub total: usize,
    /// Documents left out because they could not be parsed
    pub skipped: Vec<String>,
    pub metrics: Metrics,
    pub metrics_block: String,
    pub table: String,
    /// Whether the README was created from the template
    pub created: bool,
    /// Whether the README was written
    pub written: bool,
}

/// Rebuilds the metrics block and table of `readme` from the documents in
/// `store`. The README is created from [`readme_template`] when absent.
///
/// Nothing is written when `dry_run` is set or no document parses.
pub fn update_register(
    store: &dyn DocumentStore,
    scheme: &IdScheme,
    readme: &Path,
    dry_run: bool,
) -> Result<RegisterUpdate> {
    let (records, skipped) = fields::load_all(store, scheme)
        .with_context(|| format!("Failed to list documents in {}", store.location()))?;
    let mut update = RegisterUpdate {
        skipped,
        ..Default::default()
    };

    if records.is_empty() {
        warn!("No parseable {}-* documents found in {}", scheme.prefix(), store.location());
        return Ok(update);
    }
    if !update.skipped.is_empty() {
        warn!(
            "{} document(s) skipped due to parse errors: {}",
            update.skipped.len(),
            update.skipped.join(", ")
        );
    }

    let existing = if readme.exists() {
        Some(
            fs::read_to_string(readme)
                .with_context(|| format!("Failed to read register: {:?}", readme))?,
        )
    } else {
        None
    };
    let titles = existing
        .as_deref()
        .map(|text| fallback_titles(text, scheme))
        .unwrap_or_default();

    update.total = records.len();
    update.metrics = Metrics::compute(&records);
    update.metrics_block = render_metrics(&update.metrics);
    update.table = render_table(&records, &titles);

    if dry_run {
        return Ok(update);
    }

    let text = match existing {
        Some(text) => text,
        None => {
            let project = readme
                .parent()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "requirements".to_string());
            info!("Creating register {:?} for project {}", readme, project);
            update.created = true;
            readme_template(&project)
        }
    };

    let text = replace_metrics(&text, &update.metrics_block);
    let text = replace_table(&text, &update.table);
    fs::write(readme, text).with_context(|| format!("Failed to write register: {:?}", readme))?;
    update.written = true;

    info!("Register updated: {} requirements written to {:?}", update.total, readme);
    Ok(update)
}

/// Adds or refreshes only the Priority column of the register table.
///
/// Without a Priority column one is appended to the header, the separator
/// and every data row. Rows whose identifier has no entry get an empty cell.
pub fn update_priority_column(
    readme_text: &str,
    priorities: &BTreeMap<String, Priority>,
    scheme: &IdScheme,
) -> String {
    let mut out = String::with_capacity(readme_text.len());
    let mut column: Option<usize> = None;
    let mut in_table = false;

    for line in readme_text.split_inclusive('\n') {
        let body = line.trim_end_matches(['\n', '\r']);
        let ending = &line[body.len()..];
        let trimmed = body.trim();

        if is_table_header(trimmed) {
            in_table = true;
            let cells = table_cells(trimmed).unwrap_or_default();
            column = cells.iter().position(|c| *c == "Priority");
            if column.is_none() {
                out.push_str(&append_cell(body, "Priority"));
                out.push_str(ending);
                continue;
            }
        } else if in_table && trimmed.is_empty() {
            in_table = false;
        } else if in_table && trimmed.starts_with('|') {
            let cells = table_cells(trimmed).unwrap_or_default();
            let is_separator = cells
                .iter()
                .all(|c| !c.is_empty() && c.chars().all(|ch| ch == '-' || ch == ':'));

            let rewritten = if is_separator {
                match column {
                    Some(_) => None,
                    None => Some(append_cell(body, "--------")),
                }
            } else if scheme.is_identifier(cells.first().copied().unwrap_or("")) {
                let label = priorities
                    .get(cells[0])
                    .map(|p| p.to_string())
                    .unwrap_or_default();
                match column {
                    Some(index) => Some(set_cell(&cells, index, &label)),
                    None => Some(append_cell(body, &label)),
                }
            } else {
                None
            };

            if let Some(rewritten) = rewritten {
                out.push_str(&rewritten);
                out.push_str(ending);
                continue;
            }
        }

        out.push_str(line);
    }
    out
}

fn append_cell(row: &str, value: &str) -> String {
    let row = row.trim_end();
    if row.ends_with('|') {
        format!("{} {} |", row, value)
    } else {
        format!("{} | {} |", row, value)
    }
}

fn set_cell(cells: &[&str], index: usize, value: &str) -> String {
    let mut cells: Vec<&str> = cells.to_vec();
    if index < cells.len() {
        cells[index] = value;
    } else {
        cells.resize(index, "");
        cells.push(value);
    }
    format!("| {} |", cells.join(" | "))
}

/// Applies [`update_priority_column`] to the README at `readme`.
///
/// A missing README is reported and left alone; returns whether it was
/// written.
pub fn refresh_priority_column(
    readme: &Path,
    priorities: &BTreeMap<String, Priority>,
    scheme: &IdScheme,
) -> Result<bool> {
    if !readme.exists() {
        warn!("README not found: {:?}", readme);
        return Ok(false);
    }
    let text = fs::read_to_string(readme)
        .with_context(|| format!("Failed to read register: {:?}", readme))?;
    let updated = update_priority_column(&text, priorities, scheme);
    if updated == text {
        return Ok(false);
    }
    fs::write(readme, updated).with_context(|| format!("Failed to write register: {:?}", readme))?;
    Ok(true)
}
