//! MARTIN — Adaptive Sequential Wagering Engine
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod broker;
pub mod buffer;
pub mod config;
pub mod engine;
pub mod predictor;
pub mod strategy;
pub mod types;
