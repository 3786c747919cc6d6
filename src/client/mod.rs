//! Client Module
//!
//! A thin actor that turns calls into protocol requests for a chosen coordinator and
//! resolves them when the coordinator answers.
//!
//! ## Core Concepts
//! - **Single outstanding request**: a read or update keeps the client busy until its
//!   result or timeout arrives. Writes are fire-and-forget.
//! - **Request ids**: `<client-id>/<counter>`, unique for the client's lifetime.

pub mod actor;
pub mod types;

#[cfg(test)]
mod tests;
