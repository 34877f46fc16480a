//! Dashboard page rendering.

pub mod assets;
pub mod renderer;
pub mod snapshot;
