pub mod file_manager;
pub mod options_panel;
pub mod preview_panel;

pub use file_manager::{FileManager, FileManagerAction};
pub use options_panel::{OptionsAction, OptionsPanel};
pub use preview_panel::{PreviewAction, PreviewPanel};
