//! Plain integer vectors backing the position wrappers.

pub mod vector2;
pub mod vector3;
