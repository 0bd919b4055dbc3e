// Bibliographic Catalog - Core Library
// Versioned entities, editgroups and an ordered changelog over SQLite

pub mod catalog;
pub mod changelog;
pub mod config;
pub mod db;
pub mod editgroups;
pub mod editors;
pub mod edits;
pub mod entities;
pub mod error;
pub mod expand;
pub mod ident;
pub mod identities;
pub mod revisions;
pub mod validation;

// Re-export commonly used types
pub use catalog::{Catalog, EntityView, HistoryEntry, ReleaseExpansion};
pub use changelog::{ChangelogEntry, ChangelogIter};
pub use config::{CatalogConfig, DatabaseLocation};
pub use editgroups::{Editgroup, EditgroupStatus};
pub use editors::Editor;
pub use edits::{Edit, EditAction, IdentityRef};
pub use entities::{
    Container, Creator, EntityBody, EntityKind, EntityType, Extra, File, FileUrl, Release,
    ReleaseAbstract, ReleaseContrib, ReleaseRef, Work,
};
pub use error::{CatalogError, FieldError, Result};
pub use expand::{ExpandFlags, HideFlags};
pub use ident::{EditId, EditgroupId, EditorId, EntityId, RevisionId};
pub use identities::{EntityState, Identity, Resolution};
pub use revisions::Revision;
pub use validation::ExternalId;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
