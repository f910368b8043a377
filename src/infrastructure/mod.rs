//! Infrastructure layer.
//!
//! Technical concerns that support the application without containing
//! trading logic: configuration, adapter wiring and the polling loop.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root for runtime wiring
//! - [`config`] - Configuration loading and validation
//! - [`runtime`] - Main polling loop and shutdown handling

pub mod bootstrap;
pub mod config;
pub mod runtime;
