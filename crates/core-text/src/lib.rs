//! Text decoding and display-width primitives for the rendering engine.
//!
//! The renderer consumes command text as raw bytes; this crate turns those
//! bytes into grapheme clusters with source offsets (`segment`) and assigns
//! each cluster / scalar a terminal column width (`width`). Both modules are
//! pure functions with no terminal interaction.

pub mod segment;
pub mod width;

pub use segment::{Glyph, REPLACEMENT, decode_glyphs, snap_to_glyph_start};
pub use width::{egc_width, is_zero_width, scalar_width};
