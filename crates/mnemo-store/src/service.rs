use mnemo_core::validate::strip_tag_brackets;
use mnemo_core::{AppendInput, Entry, MemoryError, Section, SectionType, ValidationError};
use mnemo_lock::CancelToken;
use serde::Serialize;

use crate::store::MemoryStore;

/// Result of a successful capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureReceipt {
    pub id: String,
    /// Category as requested (after defaulting).
    pub section: SectionType,
    /// Section that actually holds the entry.
    pub stored_in: SectionType,
}

/// Request-level operations on top of [`MemoryStore`]: validation, entry
/// construction and category routing.
#[derive(Debug, Clone)]
pub struct MemoryService {
    store: MemoryStore,
}

impl MemoryService {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn validate_input(input: &AppendInput) -> Result<SectionType, ValidationError> {
        mnemo_core::validate_input(input)
    }

    /// Build the entry to store. A bare tag is wrapped in brackets.
    pub fn prepare_entry(
        input: &AppendInput,
        id: String,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Entry {
        let tag_name = strip_tag_brackets(input.tag.trim()).to_string();
        let rationale = Some(input.rationale.trim())
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        Entry {
            id: Some(id),
            tag: format!("[{tag_name}]"),
            tag_name,
            content: input.content.clone(),
            rationale,
            created_at: Some(now),
        }
    }

    /// Validate, route and append a capture request.
    ///
    /// `note` has no heading of its own and is stored under Decisions.
    pub fn capture(
        &self,
        ctx: &CancelToken,
        input: &AppendInput,
    ) -> Result<CaptureReceipt, MemoryError> {
        let section = Self::validate_input(input)?;
        let stored_in = section.storage_target();
        let entry = Self::prepare_entry(input, self.store.next_id(), self.store.now());
        let stored = self.store.append_entry(ctx, stored_in, &entry)?;
        Ok(CaptureReceipt {
            id: stored.id.unwrap_or_default(),
            section,
            stored_in,
        })
    }

    pub fn read_memory(&self) -> Result<String, MemoryError> {
        self.store.read_all()
    }

    pub fn read_section(&self, section: SectionType) -> Result<Section, MemoryError> {
        self.store.get_section(section.storage_target())
    }
}
