//! Common types used across the application.

pub mod pagination;
pub mod status;
pub mod wire;


pub use pagination::{ListFilters, ListOptions, PageRequest};
pub use status::RegisterStatus;
