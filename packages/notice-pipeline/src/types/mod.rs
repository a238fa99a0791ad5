//! Domain types shared by every pipeline stage.

pub mod candidate;
pub mod config;
pub mod payload;
