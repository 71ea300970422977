//! Structural checks of requirement documents against the template

use std::collections::HashMap;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use log::warn;
use regex::Regex;

use crate::fields::{self, CD_FIELD, CS_FIELD};
use crate::ident::IdScheme;
use crate::models::{MAX_SCORE, REQUIRED_FIELDS, VALID_STATUSES, VALID_TYPES};
use crate::storage::DocumentStore;

static FIELD_LABEL: OnceLock<Regex> = OnceLock::new();

/// Labelled value blocks of a document: `**Name:**` followed by everything
/// up to the next line that starts with `**`
fn field_blocks(text: &str) -> HashMap<String, String> {
    let label = FIELD_LABEL
        .get_or_init(|| Regex::new(r"\*\*([^*]+):\*\*").expect("literal label pattern"));

    let mut blocks = HashMap::new();
    let mut pos = 0;
    while let Some(caps) = label.captures_at(text, pos) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let rest = &text[whole.end()..];
        let len = rest.find("\n**").unwrap_or(rest.len());
        blocks.insert(name.as_str().trim().to_string(), rest[..len].trim().to_string());
        pos = whole.end() + len;
    }
    blocks
}

fn check_vocabulary(
    violations: &mut Vec<String>,
    blocks: &HashMap<String, String>,
    field: &str,
    accepted: &[&str],
) {
    if let Some(value) = blocks.get(field) {
        if !value.is_empty() && !accepted.contains(&value.as_str()) {
            violations.push(format!(
                "Invalid **{}:** '{}': expected one of: {}",
                field,
                value,
                accepted.join(", ")
            ));
        }
    }
}

/// Checks one document and returns its violations; empty means compliant
pub fn validate_document(key: &str, text: &str, scheme: &IdScheme) -> Vec<String> {
    let mut violations = Vec::new();

    if fields::title(text).is_none() {
        violations
            .push("Missing title heading: file must start with '# Requirement title'".to_string());
    }

    let blocks = field_blocks(text);

    for field in REQUIRED_FIELDS {
        match blocks.get(*field) {
            None => violations.push(format!("Missing field: **{}:**", field)),
            Some(value) if value.is_empty() => {
                violations.push(format!("Empty field: **{}:**", field))
            }
            Some(_) => {}
        }
    }

    if let Some(declared) = scheme.declared_id(text) {
        if declared != key {
            violations.push(format!(
                "ID mismatch: file is '{}' but **ID:** declares '{}'",
                key, declared
            ));
        }
    }

    check_vocabulary(&mut violations, &blocks, "Type", VALID_TYPES);
    check_vocabulary(&mut violations, &blocks, "Status", VALID_STATUSES);

    let priorities: Vec<String> = {
        let mut labels: Vec<String> = crate::models::Priority::all()
            .iter()
            .map(|p| p.to_string())
            .collect();
        labels.sort();
        labels
    };
    let priority_refs: Vec<&str> = priorities.iter().map(String::as_str).collect();
    check_vocabulary(&mut violations, &blocks, "Priority", &priority_refs);

    for field in [CS_FIELD, CD_FIELD] {
        let Some(block) = blocks.get(field).filter(|b| !b.is_empty()) else {
            continue;
        };
        match fields::extract_score(block) {
            None => violations.push(format!("Could not parse integer score from **{}:**", field)),
            Some(score) if score > MAX_SCORE => violations.push(format!(
                "Score out of range in **{}:** got {}, expected 0-{}",
                field, score, MAX_SCORE
            )),
            Some(_) => {}
        }
    }

    violations
}

/// Outcome of validating a whole collection
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub total: usize,
    /// Failing documents with their violations, in key order
    pub failures: Vec<(String, Vec<String>)>,
}

impl ValidationReport {
    pub fn passed(&self) -> usize {
        self.total - self.failures.len()
    }

    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Validates every identifier document in `store`
pub fn validate_collection(store: &dyn DocumentStore, scheme: &IdScheme) -> Result<ValidationReport> {
    let keys = store
        .list_matching(scheme)
        .with_context(|| format!("Failed to list documents in {}", store.location()))?;
    if keys.is_empty() {
        warn!("No {}-* documents found in {}", scheme.prefix(), store.location());
    }

    let mut report = ValidationReport {
        total: keys.len(),
        ..Default::default()
    };
    for key in keys {
        let text = store
            .read(&key)
            .with_context(|| format!("Failed to read {}", key))?;
        let violations = validate_document(&key, &text, scheme);
        if !violations.is_empty() {
            report.failures.push((key, violations));
        }
    }
    Ok(report)
}
