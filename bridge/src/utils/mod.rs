//! Small stateless helpers

pub mod hash;

pub use hash::sha256_hex;
