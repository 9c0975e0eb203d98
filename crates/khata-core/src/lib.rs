//! Khata core library
//!
//! Domain models, budget-period arithmetic, and the database access layer
//! for the Khata Telegram Mini App expense tracker.

pub mod db;
pub mod error;
pub mod models;
pub mod period;

pub use error::{Error, Result};
