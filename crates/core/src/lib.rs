//! # vimai Core
//!
//! Domain types, traits, and error definitions for the vimai editor assistant.
//! This crate performs **no I/O**: it defines the message model that the
//! transcript parser produces and that provider backends consume.
//!
//! ## Design Philosophy
//!
//! The provider backend is defined as a trait here. Implementations live
//! outside the core. This enables:
//! - Swapping backends without touching parsing or prompt assembly
//! - Easy testing with scripted provider doubles
//! - Clean dependency graph (all crates depend inward on core)

pub mod command;
pub mod error;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use command::CommandType;
pub use error::{Error, Result};
pub use message::{ContentPart, ImageRef, Message, Role};
pub use provider::{ChunkKind, Provider, ResponseChunk};
