pub mod blob_store;
pub mod content_type;
pub mod resolver;
