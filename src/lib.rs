pub mod episode_parser;
pub mod error;
pub mod library_scanner;
pub mod rename_engine;
pub mod summary;
pub mod video_file;

pub use error::{RenameError, ScanError};
pub use library_scanner::{scan, Library, LibraryScanner};
pub use rename_engine::{rename, NumberingPolicy, RenameEngine, RenameReport};
pub use video_file::VideoFile;
