//! Deskcast - live desktop HLS streaming and a sandboxed media browser
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod control;
pub mod encoder;
pub mod logging;
pub mod quality;
pub mod sandbox;
pub mod segments;
pub mod server;
pub mod streaming;
