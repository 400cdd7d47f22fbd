pub mod config;
pub mod database;
pub mod error;
pub mod form;
pub mod github;
pub mod slack;
pub mod tracking;
pub mod webhooks;

pub use error::RevueError;
