//! Core simulation types

pub mod entity;
pub mod math;

pub use math::{Rgba, Vector2, Vector3};
