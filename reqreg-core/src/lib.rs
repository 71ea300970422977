pub mod config;
pub mod export;
pub mod fields;
pub mod ident;
pub mod models;
pub mod priority;
pub mod register;
pub mod renumber;
pub mod storage;
pub mod validate;

// Re-export commonly used types
pub use config::{find_config_path, Config};
pub use export::{export_json, CollectionExport};
pub use fields::{FieldUpdates, ParseError};
pub use ident::{compare_digits, pad_width, IdScheme};
pub use models::{Priority, Requirement};
pub use priority::{assign_priorities, PriorityError, PriorityReport, PriorityRow};
pub use register::{
    refresh_priority_column, update_priority_column, update_register, Metrics, RegisterUpdate,
};
pub use renumber::{
    build_id_map, renumber, renumber_dir, rewrite_references, IdMap, IdMapping, RenumberError,
    RenumberReport,
};
pub use storage::{discover_projects, DirStore, DocumentStore, MemoryStore, StoreError, StoreOp};
pub use validate::{validate_collection, validate_document, ValidationReport};
