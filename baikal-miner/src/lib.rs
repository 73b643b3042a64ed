//! Work correlation and share validation for Baikal USB hash boards.
//!
//! Each [`board::BaikalBoard`] takes work from a scheduler, sends it to the
//! device under one of 255 slots, and matches the device's asynchronous
//! nonce reports back to the work that produced them. Nonces whose hash beats
//! the bound difficulty come back to the owner as share events.
//!
//! The USB layer and the hashing algorithms are collaborators behind the
//! [`transport::Transport`] and [`algorithm::Algorithm`] traits.

pub mod algorithm;
pub mod backplane;
pub mod board;
pub mod config;
pub mod error;
pub mod tracing;
pub mod transport;
pub mod types;
pub mod u256;
pub mod work_log;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
