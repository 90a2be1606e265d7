pub mod hasher;
pub mod metadata;
