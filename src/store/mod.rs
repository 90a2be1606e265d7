pub mod directory_index;
pub mod metadata_store;
