//! Content models for the site: pages, blog, team directory and media.

mod blocks;
mod blog;
mod image;
mod page;
mod team;
pub mod validation;

pub use blocks::*;
pub use blog::*;
pub use image::*;
pub use page::*;
pub use team::*;
