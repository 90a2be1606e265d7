pub mod file_ops;
pub mod notify;
pub mod reporting;
