//! Core infrastructure shared by every intake subsystem.
//!
//! Configuration, errors, schemas, and the broker that owns connection
//! lifetimes live here. Nothing in `core` knows about patients.

pub mod broker;
pub mod config;
pub mod db;
pub mod error;
pub mod schemas;
pub mod store;
pub mod time;
