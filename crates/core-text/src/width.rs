//! Display width classification for grapheme clusters and single scalars.
//!
//! Two entry points:
//! * `egc_width` returns the terminal column width of a whole grapheme
//!   cluster (EGC). The screen model assigns this width to the first scalar
//!   of the cluster.
//! * `scalar_width` classifies one scalar in isolation (0 / 1 / 2). Trailing
//!   scalars of a cluster always occupy zero columns regardless of their own
//!   class; `scalar_width` is used for clusters made only of zero-width
//!   scalars and by tests that check per-class widths.
//!
//! Invariants:
//! - No renderer path bypasses these functions for width decisions.
//! - Classification favors over-estimation for emoji / pictographic
//!   composites. Over-estimation leaves a harmless blank column; under
//!   estimation makes the virtual screen drift from the physical one.
//! - Results are always in `0..=2`.
//!
//! East-Asian width comes from `unicode_width`; emoji and combining detection
//! use small range checks instead of full property tables.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EgcKind {
    Ascii,
    Narrow,
    Wide,
    EmojiSimple,     // Single pictographic (with optional VS16) no modifiers
    EmojiModifier,   // Emoji + skin tone modifier
    EmojiKeycap,     // Keycap sequence (base + optional VS16 + \u{20E3})
    EmojiFlag,       // Regional indicator pair
    EmojiZwj,        // ZWJ sequence combining >=2 pictographic bases
    Combining(bool), // Base + combining mark(s); bool indicates base wide/emoji (true => width 2)
    ZeroWidth,       // Only zero-width scalars (stray combining mark, lone ZWJ)
}

const ZWJ: char = '\u{200D}';
const ZWNJ: char = '\u{200C}';
const KEYCAP_COMBINING: char = '\u{20E3}';

fn is_regional_indicator(c: char) -> bool {
    ('\u{1F1E6}'..='\u{1F1FF}').contains(&c)
}

fn is_skin_tone_modifier(c: char) -> bool {
    ('\u{1F3FB}'..='\u{1F3FF}').contains(&c)
}

fn is_variation_selector(c: char) -> bool {
    ('\u{FE00}'..='\u{FE0F}').contains(&c) || ('\u{E0100}'..='\u{E01EF}').contains(&c)
}

// Rough Extended Pictographic heuristic (covers most emoji blocks + misc symbols used as emoji)
fn is_extended_pictographic(c: char) -> bool {
    is_emoji_block(c) || ('\u{2600}'..='\u{27BF}').contains(&c)
}

// Blocks rendered two columns wide even without a presentation selector. The
// Misc Symbols / Dingbats range is excluded: prompt glyphs such as U+276F and
// U+279C live there and terminals draw them narrow.
fn is_emoji_block(c: char) -> bool {
    ('\u{1F300}'..='\u{1FAFF}').contains(&c)
}

/// Combining mark ranges commonly encountered (subset of General Category M*).
pub fn is_combining_mark(c: char) -> bool {
    ('\u{0300}'..='\u{036F}').contains(&c)
        || ('\u{0483}'..='\u{0489}').contains(&c)
        || ('\u{0591}'..='\u{05BD}').contains(&c)
        || ('\u{0610}'..='\u{061A}').contains(&c)
        || ('\u{064B}'..='\u{065F}').contains(&c)
        || ('\u{0E31}'..='\u{0E3A}').contains(&c)
        || ('\u{1AB0}'..='\u{1AFF}').contains(&c)
        || ('\u{1DC0}'..='\u{1DFF}').contains(&c)
        || ('\u{20D0}'..='\u{20FF}').contains(&c)
        || ('\u{3099}'..='\u{309A}').contains(&c)
        || ('\u{FE20}'..='\u{FE2F}').contains(&c)
}

/// True for scalars that never advance the terminal column on their own.
pub fn is_zero_width(c: char) -> bool {
    c == ZWJ
        || c == ZWNJ
        || is_variation_selector(c)
        || is_combining_mark(c)
        || unicode_width::UnicodeWidthChar::width(c) == Some(0)
}

/// Width of one Unicode scalar in isolation.
///
/// 0 for combining marks, joiners and variation selectors, 2 for East-Asian
/// wide / fullwidth scalars and emoji, 1 otherwise. Control characters report
/// 1 because the screen model never stores them raw (they are rewritten to
/// caret notation first).
pub fn scalar_width(c: char) -> u8 {
    if c.is_ascii() {
        return 1;
    }
    if is_zero_width(c) {
        return 0;
    }
    if is_emoji_block(c) || is_regional_indicator(c) {
        return 2;
    }
    match unicode_width::UnicodeWidthChar::width(c) {
        Some(2) => 2,
        _ => 1,
    }
}

fn classify(egc: &str) -> EgcKind {
    let mut chars = egc.chars();
    let Some(first) = chars.next() else {
        return EgcKind::ZeroWidth;
    };
    let single = chars.next().is_none();

    if single {
        if first.is_ascii() {
            return EgcKind::Ascii;
        }
        if is_emoji_block(first) {
            return EgcKind::EmojiSimple;
        }
        return match scalar_width(first) {
            0 => EgcKind::ZeroWidth,
            2 => EgcKind::Wide,
            _ => EgcKind::Narrow,
        };
    }

    let total = egc.chars().count();
    let mut count_ep = 0usize;
    let mut count_ri = 0usize;
    let mut has_zwj = false;
    let mut has_skin = false;
    let mut has_combining = false;
    let mut keycap_base = false;
    let mut ends_with_keycap = false;
    let mut any_wide = false;
    let mut base_wide_or_emoji = false;
    let mut saw_base = false;

    for (i, c) in egc.chars().enumerate() {
        if is_extended_pictographic(c) {
            count_ep += 1;
        }
        if is_regional_indicator(c) {
            count_ri += 1;
        }
        if c == ZWJ {
            has_zwj = true;
        }
        if is_skin_tone_modifier(c) {
            has_skin = true;
        }
        if is_combining_mark(c) {
            has_combining = true;
        }
        if c == KEYCAP_COMBINING && i == total - 1 {
            ends_with_keycap = true;
        }
        if i == 0 && (c.is_ascii_digit() || c == '#' || c == '*') {
            keycap_base = true;
        }
        if unicode_width::UnicodeWidthChar::width(c) == Some(2) {
            any_wide = true;
        }
        if !saw_base && !is_zero_width(c) {
            saw_base = true;
            if is_extended_pictographic(c) || scalar_width(c) == 2 {
                base_wide_or_emoji = true;
            }
        }
    }

    if !saw_base {
        return EgcKind::ZeroWidth;
    }
    if ends_with_keycap && keycap_base {
        return EgcKind::EmojiKeycap;
    }
    if count_ri == 2 && total == 2 {
        return EgcKind::EmojiFlag;
    }
    if has_zwj && count_ep >= 2 {
        return EgcKind::EmojiZwj;
    }
    if count_ep >= 1 && has_skin {
        return EgcKind::EmojiModifier;
    }
    if count_ep == 1 && !has_zwj {
        return EgcKind::EmojiSimple;
    }
    if has_combining {
        return EgcKind::Combining(base_wide_or_emoji);
    }
    if any_wide {
        return EgcKind::Wide;
    }
    if count_ep > 0 {
        return EgcKind::EmojiSimple;
    }
    EgcKind::Narrow
}

#[inline]
fn width_for_kind(kind: EgcKind) -> u16 {
    match kind {
        EgcKind::ZeroWidth => 0,
        EgcKind::Ascii | EgcKind::Narrow => 1,
        EgcKind::Wide
        | EgcKind::EmojiSimple
        | EgcKind::EmojiModifier
        | EgcKind::EmojiKeycap
        | EgcKind::EmojiFlag
        | EgcKind::EmojiZwj => 2,
        EgcKind::Combining(base_wide) => {
            if base_wide {
                2
            } else {
                1
            }
        }
    }
}

/// Return the display column width for a single grapheme cluster (EGC).
///
/// Precondition: `egc` is one grapheme cluster; callers segment first.
/// Empty input and clusters made only of zero-width scalars return 0.
#[inline]
pub fn egc_width(egc: &str) -> u16 {
    let mut width = width_for_kind(classify(egc));
    // Widen composite clusters carrying a pictographic or regional-indicator
    // signal that the classifier left narrow.
    if width == 1
        && egc.chars().nth(1).is_some()
        && egc
            .chars()
            .any(|c| is_extended_pictographic(c) || is_regional_indicator(c))
    {
        width = 2;
    }
    width
}
