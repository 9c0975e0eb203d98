//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod auth;
pub mod budget;
pub mod expenses;
pub mod family;
pub mod health;
pub mod onboarding;
pub mod settings;

// Re-export all handlers for use in router
pub use auth::*;
pub use budget::*;
pub use expenses::*;
pub use family::*;
pub use health::*;
pub use onboarding::*;
pub use settings::*;
