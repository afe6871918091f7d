//! Shared fixtures for the integration tests.

pub mod database;
pub mod entities;
