//! HTTP Handlers

pub mod health;
pub mod project;

pub use health::health_check;
