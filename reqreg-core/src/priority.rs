//! MoSCoW priority derivation from CS / CD scores
//!
//! Rule, first match wins:
//! 1. `CD == 5` is always Must
//! 2. `CS + CD >= 8` is Must
//! 3. `CS + CD >= 6` is Should
//! 4. `CS + CD >= 4` is Could
//! 5. anything lower is Won't

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use log::{debug, warn};
use thiserror::Error;

use crate::fields::{self, FieldUpdates};
use crate::ident::IdScheme;
use crate::models::{Priority, DEFAULT_STATUS, MAX_SCORE};
use crate::storage::DocumentStore;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PriorityError {
    #[error("CS and CD must each be in [0, 5]; received CS={cs}, CD={cd}")]
    OutOfRange { cs: u8, cd: u8 },
}

impl Priority {
    /// Derives the MoSCoW label for a pair of scores
    pub fn compute(cs: u8, cd: u8) -> Result<Self, PriorityError> {
        if cs > MAX_SCORE || cd > MAX_SCORE {
            return Err(PriorityError::OutOfRange { cs, cd });
        }
        if cd == MAX_SCORE {
            return Ok(Priority::Must);
        }

        let combined = cs + cd;
        if combined >= 8 {
            Ok(Priority::Must)
        } else if combined >= 6 {
            Ok(Priority::Should)
        } else if combined >= 4 {
            Ok(Priority::Could)
        } else {
            Ok(Priority::Wont)
        }
    }
}

/// One processed document of a priority pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityRow {
    pub id: String,
    pub cs: u8,
    pub cd: u8,
    pub priority: Priority,
    /// Whether the document was written back
    pub written: bool,
}

impl PriorityRow {
    /// True when only the CD=5 rule made this a Must
    pub fn cd_override(&self) -> bool {
        self.cd == MAX_SCORE && self.cs + self.cd < 8
    }
}

#[derive(Debug, Clone, Default)]
pub struct PriorityReport {
    pub rows: Vec<PriorityRow>,
    /// Documents that could not be processed, with the reason
    pub skipped: Vec<(String, String)>,
}

impl PriorityReport {
    /// Assigned label per requirement identifier
    pub fn priorities(&self) -> BTreeMap<String, Priority> {
        self.rows
            .iter()
            .map(|row| (row.id.clone(), row.priority))
            .collect()
    }
}

/// Computes the priority of every document and, unless `dry_run`, writes the
/// `Priority` field back, adding `Status: Draft` where the status is missing.
///
/// Documents whose scores cannot be parsed or are out of range are skipped.
pub fn assign_priorities(
    store: &mut dyn DocumentStore,
    scheme: &IdScheme,
    dry_run: bool,
) -> Result<PriorityReport> {
    let keys = store
        .list_matching(scheme)
        .with_context(|| format!("Failed to list documents in {}", store.location()))?;
    if keys.is_empty() {
        anyhow::bail!(
            "No {}-* documents found in {}",
            scheme.prefix(),
            store.location()
        );
    }

    let mut report = PriorityReport::default();
    for key in &keys {
        let req = match fields::load(&*store, key, scheme) {
            Ok(req) => req,
            Err(e) => {
                warn!("Skipping {}: {}", key, e);
                report.skipped.push((key.clone(), e.to_string()));
                continue;
            }
        };

        let priority = match Priority::compute(req.cs, req.cd) {
            Ok(priority) => priority,
            Err(e) => {
                warn!("Skipping {}: {}", key, e);
                report.skipped.push((key.clone(), e.to_string()));
                continue;
            }
        };

        let mut written = false;
        if !dry_run {
            let label = priority.to_string();
            let updates = FieldUpdates {
                status: Some(req.status.as_deref().unwrap_or(DEFAULT_STATUS)),
                priority: Some(&label),
                ..Default::default()
            };
            written = fields::save(store, &req, &updates)
                .with_context(|| format!("Failed to write priority to {}", key))?;
            debug!("{} -> {} (written: {})", req.id, priority, written);
        }

        report.rows.push(PriorityRow {
            id: req.id,
            cs: req.cs,
            cd: req.cd,
            priority,
            written,
        });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::{DEFAULT_PREFIX, DEFAULT_QUARANTINE_MARKER};
    use crate::storage::MemoryStore;

    fn scheme() -> IdScheme {
        IdScheme::new(DEFAULT_PREFIX, DEFAULT_QUARANTINE_MARKER).unwrap()
    }

    fn doc(id: &str, cs: u8, cd: u8) -> String {
        format!(
            "# Title of {id}\n\n**ID:** {id}\n\n**Customer Satisfaction (0–5):**\n- {cs}: x\n\n\
             **Customer Dissatisfaction (0–5):**\n- {cd}: y\n\n\
             **Dependencies / Conflicts:**\nNone\n\n**History:**\n- created\n"
        )
    }

    #[test]
    fn test_compute_rule() {
        assert_eq!(Priority::compute(5, 5), Ok(Priority::Must));
        assert_eq!(Priority::compute(1, 5), Ok(Priority::Must));
        assert_eq!(Priority::compute(0, 5), Ok(Priority::Must));
        assert_eq!(Priority::compute(4, 4), Ok(Priority::Must));
        assert_eq!(Priority::compute(4, 3), Ok(Priority::Should));
        assert_eq!(Priority::compute(3, 3), Ok(Priority::Should));
        assert_eq!(Priority::compute(3, 2), Ok(Priority::Could));
        assert_eq!(Priority::compute(2, 2), Ok(Priority::Could));
        assert_eq!(Priority::compute(2, 1), Ok(Priority::Wont));
        assert_eq!(Priority::compute(0, 0), Ok(Priority::Wont));
    }

    #[test]
    fn test_compute_rejects_out_of_range() {
        assert_eq!(
            Priority::compute(6, 1),
            Err(PriorityError::OutOfRange { cs: 6, cd: 1 })
        );
        assert!(Priority::compute(1, 9).is_err());
    }

    #[test]
    fn test_cd_override_note() {
        let row = PriorityRow {
            id: "REQ-1".into(),
            cs: 1,
            cd: 5,
            priority: Priority::Must,
            written: false,
        };
        assert!(row.cd_override());
        let row = PriorityRow { cs: 4, ..row };
        assert!(!row.cd_override());
    }

    #[test]
    fn test_assign_priorities_writes_fields() {
        let mut store = MemoryStore::with_documents([
            ("REQ-1", doc("REQ-1", 4, 4)),
            ("REQ-2", doc("REQ-2", 1, 1)),
        ]);

        let report = assign_priorities(&mut store, &scheme(), false).unwrap();
        assert_eq!(report.rows.len(), 2);
        assert!(report.rows.iter().all(|r| r.written));

        let first = &store.documents()["REQ-1"];
        assert!(first.contains("**Status:**\nDraft\n\n**Priority:**\nMust\n\n**History:**"));
        assert!(store.documents()["REQ-2"].contains("**Priority:**\nWon't"));

        let priorities = report.priorities();
        assert_eq!(priorities["REQ-1"], Priority::Must);
        assert_eq!(priorities["REQ-2"], Priority::Wont);
    }

    #[test]
    fn test_assign_priorities_keeps_existing_status() {
        let text = doc("REQ-1", 3, 3).replace(
            "**History:**",
            "**Status:**\nApproved\n\n**History:**",
        );
        let mut store = MemoryStore::with_documents([("REQ-1", text)]);

        assign_priorities(&mut store, &scheme(), false).unwrap();
        let updated = &store.documents()["REQ-1"];
        assert!(updated.contains("**Status:**\nApproved\n\n**Priority:**\nShould"));
    }

    #[test]
    fn test_assign_priorities_skips_bad_documents() {
        let mut store = MemoryStore::with_documents([
            ("REQ-1", doc("REQ-1", 2, 2)),
            ("REQ-2", "**ID:** REQ-2\n".to_string()),
            ("REQ-3", doc("REQ-3", 2, 7)),
        ]);

        let report = assign_priorities(&mut store, &scheme(), true).unwrap();
        assert_eq!(report.rows.len(), 1);
        let skipped: Vec<&str> = report.skipped.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(skipped, vec!["REQ-2", "REQ-3"]);
    }

    #[test]
    fn test_assign_priorities_dry_run_writes_nothing() {
        let mut store = MemoryStore::with_documents([("REQ-1", doc("REQ-1", 5, 0))]);
        let report = assign_priorities(&mut store, &scheme(), true).unwrap();
        assert_eq!(report.rows[0].priority, Priority::Could);
        assert!(!report.rows[0].written);
        assert!(store.writes().is_empty());
    }

    #[test]
    fn test_assign_priorities_empty_collection() {
        let mut store = MemoryStore::new();
        assert!(assign_priorities(&mut store, &scheme(), false).is_err());
    }
}
