pub mod collection;
pub mod config;
pub mod currency;
pub mod document;
pub mod records;

pub use collection::*;
pub use config::*;
pub use currency::*;
pub use document::*;
pub use records::*;
