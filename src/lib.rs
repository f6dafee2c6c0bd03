//! Maker project guides from a generative language model, for a handful of
//! hobbyist boards.

pub mod cli;
pub mod client;
pub mod compat;
pub mod config;
pub mod error;
pub mod handler;
pub mod interactive;
pub mod metadata;
pub mod projects;
pub mod prompts;
pub mod render;
pub mod session;
pub mod state;
pub mod storage;
pub mod types;
