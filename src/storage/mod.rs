//! File system storage management
//!
//! Handles path validation, file operations and read/write streams.

pub mod filesystem;
pub mod modes;
pub mod reader;
pub mod validation;
pub mod writer;

pub use filesystem::FileStore;
pub use modes::WriteMode;
pub use reader::FileReader;
pub use validation::{PathComparison, PathResolver, normalize};
pub use writer::FileWriter;
