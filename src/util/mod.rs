pub mod geometry;
pub mod vec2;
