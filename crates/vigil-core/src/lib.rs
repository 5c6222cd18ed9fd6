//! Core types and trait definitions for the Vigil ticket watcher.
//!
//! This crate is deliberately free of HTTP, database, and runtime
//! dependencies. All other crates depend on it; it depends on nothing
//! proprietary.

pub mod diff;
pub mod error;
pub mod notify;
pub mod service;
pub mod state;
pub mod ticket;
pub mod unread;

pub use error::{Error, Result};
