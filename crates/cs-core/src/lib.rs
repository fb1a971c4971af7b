//! # cs-core
//!
//! Core domain models and business logic for ClipStash.
//!
//! This crate contains pure business logic without any infrastructure dependencies.

// Public module exports
pub mod clipboard;
pub mod dedup;
pub mod ids;
pub mod ports;
pub mod recommend;
pub mod settings;

// Re-export commonly used types at the crate root
pub use clipboard::{ClipboardRecord, ClipboardSnapshot, ContentKind};
pub use ids::{BlobKey, RecordId};
pub use settings::Settings;
