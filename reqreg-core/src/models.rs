use serde::{Deserialize, Serialize};
use std::fmt;

/// Fields every requirement document must carry, in template order
pub const REQUIRED_FIELDS: &[&str] = &[
    "ID",
    "Type",
    "Originator",
    "Description",
    "Rationale",
    "Fit Criterion",
    "Customer Satisfaction (0–5)",
    "Customer Dissatisfaction (0–5)",
    "Dependencies / Conflicts",
    "Status",
    "Priority",
    "History",
];

/// Accepted values of the `Type` field
pub const VALID_TYPES: &[&str] = &[
    "Constraint",
    "Environmental",
    "Functional",
    "Interface",
    "Non-Functional",
    "Non-functional",
];

/// Accepted values of the `Status` field
pub const VALID_STATUSES: &[&str] = &["Approved", "Deprecated", "Draft", "Reviewed"];

/// Status written into documents that do not declare one
pub const DEFAULT_STATUS: &str = "Draft";

/// Type assumed in the register for documents that do not declare one
pub const DEFAULT_TYPE: &str = "Functional";

/// Highest valid CS / CD score
pub const MAX_SCORE: u8 = 5;

/// MoSCoW priority label
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Priority {
    Must,
    Should,
    Could,
    #[serde(rename = "Won't")]
    Wont,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Must => write!(f, "Must"),
            Priority::Should => write!(f, "Should"),
            Priority::Could => write!(f, "Could"),
            Priority::Wont => write!(f, "Won't"),
        }
    }
}

impl Priority {
    /// All labels in descending order
    pub fn all() -> &'static [Priority] {
        &[Priority::Must, Priority::Should, Priority::Could, Priority::Wont]
    }

    /// Parses a label as written in documents, case-insensitively.
    ///
    /// Accepts `Wont` and the typographic `Won’t` alongside `Won't`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "must" => Some(Priority::Must),
            "should" => Some(Priority::Should),
            "could" => Some(Priority::Could),
            "won't" | "wont" | "won\u{2019}t" => Some(Priority::Wont),
            _ => None,
        }
    }
}

/// A parsed requirement document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Requirement {
    /// Identifier declared in the `**ID:**` field, or the storage key when
    /// the field is absent
    pub id: String,
    /// Storage key the document was read from
    pub key: String,
    /// Text of the leading `# Title` heading
    pub title: Option<String>,
    pub req_type: Option<String>,
    /// Customer satisfaction score
    pub cs: u8,
    /// Customer dissatisfaction score
    pub cd: u8,
    pub status: Option<String>,
    pub priority: Option<String>,
    /// Full document text as read
    #[serde(skip)]
    pub raw_text: String,
}

impl Requirement {
    /// Combined CS + CD score
    pub fn combined_score(&self) -> u8 {
        self.cs + self.cd
    }
}
