pub mod blob_cache;
