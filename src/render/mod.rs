pub mod color;
pub mod compositor;
pub mod sink;
