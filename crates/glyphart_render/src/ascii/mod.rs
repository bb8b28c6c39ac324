pub mod compositor;
pub mod effects;
pub mod gradient;
pub mod grid;
pub mod mapping;
pub mod text;
