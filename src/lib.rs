//! Locadan - Hyresförvaltning
//!
//! Lokalt datalager för ägare, fastigheter, hyresgäster, hyror, betalningar,
//! kvitton, hyresrevisioner, utgifter och dokument.

pub mod app;
pub mod db;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

// Re-exports
pub use app::Locadan;
pub use db::Database;
pub use models::*;
pub use store::RecordStore;
pub use utils::{AppError, AppResult};
