//! Render error taxonomy.
//!
//! Only failures the caller must react to are represented. Invalid UTF-8 in
//! the command text is recovered inline (U+FFFD) and LRU eviction is normal
//! cache behavior; neither surfaces here.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// Growing a screen buffer, dirty set or cache failed. The render was
    /// aborted before touching `actual`; retrying is safe.
    #[error("allocation failed while growing {what}")]
    AllocationFailure { what: &'static str },
    /// Malformed snapshot (cursor past end of text, zero terminal width, bad
    /// cell bytes). Nothing was mutated.
    #[error("invalid render input: {0}")]
    InvalidInput(String),
    /// The output sink rejected the frame. The physical screen state is now
    /// unknown and the next render escalates to a full redraw.
    #[error("output write failed: {0}")]
    WriteFailure(#[from] io::Error),
}

impl RenderError {
    pub(crate) fn alloc(what: &'static str) -> Self {
        Self::AllocationFailure { what }
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
