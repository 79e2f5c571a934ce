//! Data module - CSV loading, column extraction and selection

mod loader;
mod processor;
mod selection;

pub use loader::{DataLoader, LoaderError, TableSchema};
pub use processor::{DataProcessor, ProcessorError};
pub use selection::ColumnSelection;
