//! Core domain types for Shorten.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod api_key;
mod message;
mod request;
mod slice;

pub use api_key::ApiKey;
pub use message::{ChatMessage, ChatRole, SamplingParams};
pub use request::{ContextRatio, ShortenRatio, ShortenRequest, ValidationError};
pub use slice::{TextSlice, Window};
