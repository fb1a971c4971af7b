pub mod content;
pub mod hash;
pub mod record;
pub mod snapshot;

pub use content::ContentKind;
pub use record::{ClipboardRecord, IMAGE_CONTENT_PLACEHOLDER};
pub use snapshot::ClipboardSnapshot;
