//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields: address, hash, stage, function)
//!
//! Consumers:
//!     → logging.rs subscriber (stderr, filtered by flags / RUST_LOG)
//! ```
//!
//! # Design Decisions
//! - Structured fields over interpolated messages
//! - Secrets never appear in events

pub mod logging;
