//! Reading and writing the field block of a requirement document
//!
//! Documents follow a fixed markdown template:
//!
//! ```text
//! # Short descriptive title
//!
//! **ID:** REQ-01
//!
//! **Type:** Functional
//!
//! **Customer Satisfaction (0–5):**
//! - 4: Nice to have
//!
//! **Dependencies / Conflicts:**
//! REQ-02
//!
//! **Status:**
//! Draft
//!
//! **Priority:**
//! Should
//!
//! **History:**
//! ...
//! ```
//!
//! Missing `Status` / `Priority` fields are inserted next to their anchors
//! when written back.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use thiserror::Error;

use crate::ident::IdScheme;
use crate::models::{Requirement, MAX_SCORE};
use crate::storage::{DocumentStore, StoreError};

/// Errors raised while reading the field block
#[derive(Error, Debug)]
pub enum ParseError {
    #[error(
        "Could not parse CS or CD scores from '{key}'. \
         Ensure the file follows the standard REQ template"
    )]
    MissingScores { key: String },

    #[error("Score out of range in '{key}': {field} is {value}, expected 0-5")]
    ScoreOutOfRange {
        key: String,
        field: &'static str,
        value: u8,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Labels of the two score fields as they appear in documents
pub const CS_FIELD: &str = "Customer Satisfaction (0–5)";
pub const CD_FIELD: &str = "Customer Dissatisfaction (0–5)";

struct Patterns {
    title: Regex,
    req_type: Regex,
    cs: Regex,
    cd: Regex,
    status: Regex,
    priority: Regex,
    score_bullet: Regex,
    score_plain: Regex,
    deps_block: Regex,
    status_block: Regex,
    history: Regex,
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| {
        let re = |pattern: &str| Regex::new(pattern).expect("literal field pattern");
        Patterns {
            title: re(r"(?m)^#\s+(.+)"),
            req_type: re(r"\*\*Type:\*\*\s*(\S[^\n]*)"),
            cs: re(r"\*\*Customer Satisfaction \(0.5\):\*\*\s*"),
            cd: re(r"\*\*Customer Dissatisfaction \(0.5\):\*\*\s*"),
            status: re(r"\*\*Status:\*\*\s*\n(\S[^\n]*)"),
            priority: re(r"\*\*Priority:\*\*\s*\n(\S[^\n]*)"),
            score_bullet: re(r"(?m)^\s*-\s*([0-9])"),
            score_plain: re(r"(?m)^\s*([0-9])\s*$"),
            deps_block: re(r"(\*\*Dependencies / Conflicts:\*\*\s*\n\S[^\n]*)"),
            status_block: re(r"(\*\*Status:\*\*\s*\n\S[^\n]*)"),
            history: re(r"\*\*History:\*\*"),
        }
    })
}

/// Text following the match of `label` up to the next `\n**` or the end
fn block_after<'a>(text: &'a str, label: &Regex) -> Option<&'a str> {
    let start = label.find(text)?.end();
    let rest = &text[start..];
    let end = rest.find("\n**").unwrap_or(rest.len());
    Some(&rest[..end])
}

fn first_capture(text: &str, regex: &Regex) -> Option<String> {
    regex
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Extracts a single-digit score from a CS / CD value block.
///
/// Accepts the bulleted form (`- 4: description`) and a lone digit on its
/// own line.
pub fn extract_score(block: &str) -> Option<u8> {
    let p = patterns();
    p.score_bullet
        .captures(block)
        .or_else(|| p.score_plain.captures(block))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Text of the leading `# Title` heading
pub fn title(text: &str) -> Option<String> {
    first_capture(text, &patterns().title)
}

/// Parses a document into a [`Requirement`].
///
/// The declared identifier falls back to the storage key; `title`, `status`,
/// `priority` and `req_type` are `None` when absent. Scores are mandatory.
pub fn parse(key: &str, text: &str, scheme: &IdScheme) -> Result<Requirement, ParseError> {
    let p = patterns();

    let cs = block_after(text, &p.cs).and_then(extract_score);
    let cd = block_after(text, &p.cd).and_then(extract_score);
    let (cs, cd) = match (cs, cd) {
        (Some(cs), Some(cd)) => (cs, cd),
        _ => {
            return Err(ParseError::MissingScores {
                key: key.to_string(),
            })
        }
    };

    Ok(Requirement {
        id: scheme
            .declared_id(text)
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string()),
        key: key.to_string(),
        title: first_capture(text, &p.title),
        req_type: first_capture(text, &p.req_type),
        cs,
        cd,
        status: first_capture(text, &p.status),
        priority: first_capture(text, &p.priority),
        raw_text: text.to_string(),
    })
}

/// Reads and parses the document stored under `key`
pub fn load(
    store: &dyn DocumentStore,
    key: &str,
    scheme: &IdScheme,
) -> Result<Requirement, ParseError> {
    let text = store.read(key)?;
    parse(key, &text, scheme)
}

/// Parses every identifier document in `store`.
///
/// Documents that fail to parse are logged and returned by key in the second
/// list; only a failure to list the store is an error.
pub fn load_all(
    store: &dyn DocumentStore,
    scheme: &IdScheme,
) -> Result<(Vec<Requirement>, Vec<String>), StoreError> {
    let mut records = Vec::new();
    let mut skipped = Vec::new();
    for key in store.list_matching(scheme)? {
        match load(store, &key, scheme) {
            Ok(req) => records.push(req),
            Err(e) => {
                log::warn!("Skipping {}: {}", key, e);
                skipped.push(key);
            }
        }
    }
    Ok((records, skipped))
}

/// Checks that both scores lie within the template range
pub fn check_scores(req: &Requirement) -> Result<(), ParseError> {
    for (field, value) in [(CS_FIELD, req.cs), (CD_FIELD, req.cd)] {
        if value > MAX_SCORE {
            return Err(ParseError::ScoreOutOfRange {
                key: req.key.clone(),
                field,
                value,
            });
        }
    }
    Ok(())
}

/// Replaces the first `# Title` heading, or prepends one
pub fn upsert_title(text: &str, title: &str) -> String {
    let p = patterns();
    if p.title.is_match(text) {
        return p
            .title
            .replacen(text, 1, |_: &Captures| format!("# {}", title))
            .into_owned();
    }
    format!("# {}\n\n{}", title, text.trim_start())
}

/// Updates a single-line bold field, inserting it when absent.
///
/// Insertion anchors: `Priority` goes after the Status block, else after the
/// Dependencies / Conflicts block; `Status` goes after Dependencies /
/// Conflicts. Anything else, or a missing anchor, goes right before
/// `**History:**`, or at the end of the document.
pub fn upsert_field(text: &str, field: &str, value: &str) -> String {
    let existing = match Regex::new(&format!(
        r"(\*\*{}:\*\*\s*\n)(\S[^\n]*)",
        regex::escape(field)
    )) {
        Ok(regex) => regex,
        Err(_) => return append_field(text, field, value),
    };
    if existing.is_match(text) {
        return existing
            .replace_all(text, |caps: &Captures| format!("{}{}", &caps[1], value))
            .into_owned();
    }

    let p = patterns();
    let insert_after = |anchor: &Regex| -> Option<String> {
        if !anchor.is_match(text) {
            return None;
        }
        Some(
            anchor
                .replacen(text, 1, |caps: &Captures| {
                    format!("{}\n\n**{}:**\n{}", &caps[1], field, value)
                })
                .into_owned(),
        )
    };

    let inserted = match field {
        "Priority" => insert_after(&p.status_block).or_else(|| insert_after(&p.deps_block)),
        "Status" => insert_after(&p.deps_block),
        _ => None,
    };
    if let Some(updated) = inserted {
        return updated;
    }

    if p.history.is_match(text) {
        return p
            .history
            .replacen(text, 1, |caps: &Captures| {
                format!("**{}:**\n{}\n\n{}", field, value, &caps[0])
            })
            .into_owned();
    }

    append_field(text, field, value)
}

fn append_field(text: &str, field: &str, value: &str) -> String {
    format!("{}\n\n**{}:**\n{}\n", text, field, value)
}

/// Field values to write back into a document; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct FieldUpdates<'a> {
    pub title: Option<&'a str>,
    pub status: Option<&'a str>,
    pub priority: Option<&'a str>,
}

/// Applies `updates` to the text of `req`
pub fn apply_updates(req: &Requirement, updates: &FieldUpdates<'_>) -> String {
    let mut text = req.raw_text.clone();
    if let Some(title) = updates.title {
        text = upsert_title(&text, title);
    }
    if let Some(status) = updates.status {
        text = upsert_field(&text, "Status", status);
    }
    if let Some(priority) = updates.priority {
        text = upsert_field(&text, "Priority", priority);
    }
    text
}

/// Writes `updates` back to the document of `req`.
///
/// Returns `false` without writing when the text would not change.
pub fn save(
    store: &mut dyn DocumentStore,
    req: &Requirement,
    updates: &FieldUpdates<'_>,
) -> Result<bool, StoreError> {
    let text = apply_updates(req, updates);
    if text == req.raw_text {
        return Ok(false);
    }
    store.write(&req.key, &text)?;
    Ok(true)
}
