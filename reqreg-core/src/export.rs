use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::fields;
use crate::ident::IdScheme;
use crate::models::Requirement;
use crate::register::Metrics;
use crate::storage::DocumentStore;

/// Machine-readable snapshot of a requirements collection
#[derive(Debug, Serialize)]
pub struct CollectionExport {
    pub location: String,
    pub requirements: Vec<Requirement>,
    /// Documents that could not be parsed
    pub skipped: Vec<String>,
    pub metrics: Metrics,
}

impl CollectionExport {
    /// Parses every document of `store` into an export
    pub fn collect(store: &dyn DocumentStore, scheme: &IdScheme) -> Result<Self> {
        let (requirements, skipped) = fields::load_all(store, scheme)
            .with_context(|| format!("Failed to list documents in {}", store.location()))?;
        let metrics = Metrics::compute(&requirements);
        Ok(Self {
            location: store.location(),
            requirements,
            skipped,
            metrics,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize export")
    }
}

/// Export requirements to JSON, written to `output` or printed to stdout
pub fn export_json(store: &dyn DocumentStore, scheme: &IdScheme, output: Option<&Path>) -> Result<()> {
    let export = CollectionExport::collect(store, scheme)?;
    let json = export.to_json()?;

    match output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write export to {:?}", path))?;
            println!("Exported to JSON: {}", path.display());
            println!("  Total requirements: {}", export.requirements.len());
            if !export.skipped.is_empty() {
                println!("  Skipped: {}", export.skipped.join(", "));
            }
        }
        None => println!("{}", json),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::{DEFAULT_PREFIX, DEFAULT_QUARANTINE_MARKER};
    use crate::storage::MemoryStore;
    use tempfile::TempDir;

    fn scheme() -> IdScheme {
        IdScheme::new(DEFAULT_PREFIX, DEFAULT_QUARANTINE_MARKER).unwrap()
    }

    fn store() -> MemoryStore {
        MemoryStore::with_documents([
            (
                "REQ-1",
                "# Search\n\n**ID:** REQ-1\n\n**Customer Satisfaction (0–5):**\n- 4: a\n\n\
                 **Customer Dissatisfaction (0–5):**\n- 5: b\n\n**Priority:**\nMust\n",
            ),
            ("REQ-2", "# Unscored\n\n**ID:** REQ-2\n"),
        ])
    }

    #[test]
    fn test_collect() {
        let export = CollectionExport::collect(&store(), &scheme()).unwrap();
        assert_eq!(export.requirements.len(), 1);
        assert_eq!(export.skipped, vec!["REQ-2".to_string()]);
        assert_eq!(export.metrics.must, 1);
        assert_eq!(export.location, "<memory>");
    }

    #[test]
    fn test_export_json_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.json");
        export_json(&store(), &scheme(), Some(&path)).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["requirements"][0]["id"], "REQ-1");
        assert_eq!(value["requirements"][0]["cd"], 5);
        assert_eq!(value["metrics"]["total"], 1);
        assert!(value["requirements"][0].get("raw_text").is_none());
    }
}
