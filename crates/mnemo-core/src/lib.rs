//! Domain types, error taxonomy and input validation for the mnemo memory store.

pub mod error;
pub mod ports;
pub mod types;
pub mod validate;

pub use error::{MemoryError, ValidationError};
pub use ports::{Clock, IdGenerator, SystemClock, UlidGenerator};
pub use types::{AppendInput, Entry, EntryFormat, Section, SectionType};
pub use validate::{validate_content, validate_input};
