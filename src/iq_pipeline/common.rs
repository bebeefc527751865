//! Common utilities module
//!
//! This module contains shared utilities used across the IQ pipeline.

pub mod error;

pub use error::{IqError, Result};
