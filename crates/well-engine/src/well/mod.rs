pub mod render;
pub mod surface;
pub mod sync;
pub mod word;
