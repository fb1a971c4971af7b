//! # cs-infra
//!
//! Infrastructure adapters for ClipStash: the Diesel/SQLite record store,
//! the filesystem blob cache, the image capture pipeline and the system
//! clock. Everything here implements a port from `cs-core`.

pub mod clock;
pub mod db;
pub mod fs;
pub mod image;

pub use clock::SystemClock;
pub use db::pool::{init_db_pool, DbPool};
pub use db::repositories::DieselRecordStore;
pub use fs::blob_cache::FsBlobCache;
pub use image::encoder::CaptureImageEncoder;
