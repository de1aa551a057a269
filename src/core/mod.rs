//! Core utilities, configuration, and common functionality

pub mod activity;
pub mod cobalt;
pub mod config;
pub mod error;
pub mod logging;
pub mod translate;
pub mod utils;
