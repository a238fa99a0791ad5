//! Source adapter implementations.

pub mod web;

pub use web::{ClientOptions, WebSource, DEFAULT_REQUEST_TIMEOUT};
