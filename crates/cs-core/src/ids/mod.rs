mod id_macro;

use serde::{Deserialize, Serialize};

/// Identifier of a captured clipboard record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(String);

/// Opaque key into the blob cache (image payloads and thumbnails).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobKey(String);

id_macro::impl_id!(RecordId, BlobKey);
