//! REST API module.
//!
//! Handlers return JSON bodies directly; failures go through `AppError`,
//! which renders the shared error envelope.

mod admin;
mod blog;
mod content;
pub mod pagination;
mod search;
mod team;

pub use admin::*;
pub use blog::*;
pub use content::*;
pub use search::*;
pub use team::*;
