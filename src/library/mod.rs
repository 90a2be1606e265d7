pub mod import;
pub mod navigator;
pub mod path;
pub mod sample_library;
