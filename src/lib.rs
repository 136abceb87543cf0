//! adforge library crate.
//!
//! Clients for the generative content and sound services, the ffmpeg
//! compositor, and the brief-to-commercial pipeline built on top of them.

pub mod artifacts;
pub mod cli;
pub mod commercial;
pub mod config;
pub mod gemini;
pub mod http;
pub mod media;
pub mod sound;
