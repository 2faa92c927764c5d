//! Nested task tree library.
//!
//! This module exports the core components for testing and integration.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod tree;
pub mod types;
pub mod web;
