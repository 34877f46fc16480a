//! Name normalization and cross-source linking.

pub mod linker;
pub mod normalizer;
