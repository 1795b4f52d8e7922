//! Outbound voice-message assembly
//!
//! This module provides:
//! - The attachment descriptor and message payload types
//! - The clip-to-payload preparation pipeline

pub mod compose;
pub mod descriptor;
