pub mod collision;
pub mod dynamics;
