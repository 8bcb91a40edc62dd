//! Healthchat — a privacy-safe health-advice chat backend.
//!
//! Turns a user's free-text question plus optional clinical datasets
//! (blood panel, wearable vitals, genetic markers) into a bounded,
//! redacted prompt for an external generation service, and returns the
//! answer as an ordered sequence of display chunks.
//!
//! The request path is strictly sequential: sanitize, build context,
//! invoke, segment. No state is shared across requests beyond read-only
//! configuration loaded at startup. Privacy boundary: personal data never
//! reaches the generation provider unredacted.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod context;
pub mod error;
pub mod invoke;
pub mod logging;
pub mod pipeline;
pub mod provider;
pub mod sanitize;
pub mod segment;
pub mod server;
pub mod types;
