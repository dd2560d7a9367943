//! Task Board Library
//!
//! Multi-tenant task boards with typed columns, ordered groups and
//! per-cell field values. This module exports the core components for
//! testing and integration.

pub mod access;
pub mod aggregate;
pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod format;
pub mod logging;
pub mod service;
pub mod types;
pub mod values;
