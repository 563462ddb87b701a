//! Database access layer for JejakCuan

pub mod error;
pub mod models;
pub mod pool;
pub mod repositories;

pub use error::*;
pub use models::*;
pub use pool::*;
pub use repositories::*;
