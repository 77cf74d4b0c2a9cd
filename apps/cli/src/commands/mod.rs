//! Command implementations for the SadGPT CLI.

pub mod chat;
pub mod download;
pub mod inspect;
pub mod prepare;
pub mod train;
pub mod types;
