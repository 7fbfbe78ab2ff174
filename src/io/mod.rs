pub mod csv_export;
pub mod csv_import;
pub mod file;
pub mod library;

pub use file::{export_json, load_project, save_project};
pub use library::{Autosave, ProjectLibrary, ProjectSummary};
