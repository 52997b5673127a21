// State management module
// Sample entities, editing operations, the JSON library and file system access

pub mod edit;
pub mod library;
pub mod models;
pub mod storage;

pub use edit::{EditError, EditResult};
pub use library::{LibraryError, SampleLibrary, SampleQuery};
pub use models::{Sample, MAX_REGION_SECS};
pub use storage::{calculate_sha256, default_library_path, get_app_data_dir, write_file, StorageError};
