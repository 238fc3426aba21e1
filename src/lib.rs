//! Mergington High School activity registration service.
//!
//! The binary in `main.rs` wires these modules together; integration tests
//! build the same router through [`web::router`].

pub mod config;
pub mod database;
pub mod error;
pub mod i18n;
pub mod models;
pub mod services;
pub mod web;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
