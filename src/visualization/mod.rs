pub mod render;
pub mod snapshot;
