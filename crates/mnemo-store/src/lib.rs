//! Markdown memory file engine: entry codec, section locator, document
//! mutator and the lock-guarded storage engine built on them.

pub mod codec;
pub mod document;
pub mod locator;
pub mod mutator;
mod service;
mod store;
pub mod template;

pub use codec::{parse_section_entries, render_entry};
pub use mnemo_lock::CancelToken;
pub use service::{CaptureReceipt, MemoryService};
pub use store::{DEFAULT_DIR_NAME, DEFAULT_FILE_NAME, DEFAULT_LOCK_FILE_NAME, MemoryStore, StoreConfig};
pub use template::{
    MemoryTemplateFile, ProjectInfo, TemplateBundle, load_template_dir, seeded_document,
};
