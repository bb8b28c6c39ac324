pub mod color;
pub mod frame;
pub mod loader;
pub mod resize;
