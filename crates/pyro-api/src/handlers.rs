//! HTTP request handlers.

pub mod detect;
pub mod health;

pub use detect::{detect, fire_model, human_model};
pub use health::{health, ready};
