//! Small value classes shared between host and scripts
//!
//! These cross the script boundary as maps (`#{ x, y, z }`, `#{ r, g, b, a }`)
//! so they can be stored in metadata and replicated like any other value.

use crate::value::{FromValue, Value, ValueMap};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

fn number_field(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::Number(n) => Some(*n),
        _ => None,
    }
}

fn byte_field(value: &Value, key: &str) -> Option<u8> {
    let n = number_field(value, key)?;
    to_byte(n)
}

/// Integral number in `0..=255`
pub fn to_byte(n: f64) -> Option<u8> {
    if n.fract() == 0.0 && (0.0..=255.0).contains(&n) {
        Some(n as u8)
    } else {
        None
    }
}

fn map_of(fields: &[(&str, f64)]) -> Value {
    let entries: ValueMap = fields
        .iter()
        .map(|(key, n)| (key.to_string(), Value::Number(*n)))
        .collect();
    Value::Map(entries)
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }
}

impl Add for Vector3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vector3({}, {}, {})", self.x, self.y, self.z)
    }
}

impl From<Vector3> for Value {
    fn from(v: Vector3) -> Self {
        map_of(&[("x", v.x), ("y", v.y), ("z", v.z)])
    }
}

impl FromValue for Vector3 {
    fn from_value(value: Value) -> Option<Self> {
        Some(Self::new(
            number_field(&value, "x")?,
            number_field(&value, "y")?,
            number_field(&value, "z")?,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }
}

impl Add for Vector2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl fmt::Display for Vector2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vector2({}, {})", self.x, self.y)
    }
}

impl From<Vector2> for Value {
    fn from(v: Vector2) -> Self {
        map_of(&[("x", v.x), ("y", v.y)])
    }
}

impl FromValue for Vector2 {
    fn from_value(value: Value) -> Option<Self> {
        Some(Self::new(
            number_field(&value, "x")?,
            number_field(&value, "y")?,
        ))
    }
}

/// 8-bit color with alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::new(0, 0, 0, 255)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RGBA({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl From<Rgba> for Value {
    fn from(c: Rgba) -> Self {
        map_of(&[
            ("r", c.r as f64),
            ("g", c.g as f64),
            ("b", c.b as f64),
            ("a", c.a as f64),
        ])
    }
}

impl FromValue for Rgba {
    fn from_value(value: Value) -> Option<Self> {
        // Alpha is optional and defaults to opaque
        let a = match value.get("a") {
            None => 255,
            Some(_) => byte_field(&value, "a")?,
        };
        Some(Self::new(
            byte_field(&value, "r")?,
            byte_field(&value, "g")?,
            byte_field(&value, "b")?,
            a,
        ))
    }
}
