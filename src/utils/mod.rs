pub mod date;
pub mod error;
pub mod file_ops;
pub mod lenient;
pub mod path;

pub use error::{AppError, AppResult};
