//! Audio handling for voice-message preparation
//!
//! This module provides:
//! - Clip decoding to primary-channel samples
//! - Amplitude envelope summarization
//! - Container sniffing for the playability check

pub mod decode;
pub mod envelope;
pub mod format;
