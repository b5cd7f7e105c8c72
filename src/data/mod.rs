//! Data module - result file loading and validated tables

mod loader;
mod table;

pub use loader::{DataLoader, LoadError};
pub use table::ResultTable;
