//! Infrastructure configuration modules.

pub mod engine;
pub mod logging;
pub mod risk;
pub mod session;
pub mod settings;
pub mod timing;
