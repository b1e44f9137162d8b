//! Color encoding.
//!
//! Cells carry terminal-independent `core_model::Color`s; this module turns
//! them into SGR foreground sequences for the detected `ColorSupport`. The
//! mapping is a pure function of (color, support): nothing here looks at the
//! terminal.
//!
//! * TrueColor: RGB as `38;2;r;g;b`, indexed as `38;5;n`, ANSI as `30-37/90-97`.
//! * Ansi256: RGB downsampled to the xterm cube / grey ramp.
//! * Ansi16: everything mapped to the nearest of the 16 base colors.
//! * None: no color output at all.
//!
//! Named colors are written as classic `30-37/90-97` codes rather than
//! crossterm's `38;5;n` form so 16-color terminals understand them.

use core_model::Color;
use core_terminal::ColorSupport;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Foreground {
    Default,
    Ansi16(u8),
    Indexed(u8),
    Rgb(u8, u8, u8),
}

/// Foreground to emit for `color`, or `None` when the terminal has no color.
pub fn downsample(color: Option<Color>, support: ColorSupport) -> Option<Foreground> {
    let Some(color) = color else {
        return (support != ColorSupport::None).then_some(Foreground::Default);
    };
    let fg = match (support, color) {
        (ColorSupport::None, _) => return None,
        (_, Color::Ansi(n)) => Foreground::Ansi16(n & 0x0f),
        (ColorSupport::TrueColor, Color::Rgb { r, g, b }) => Foreground::Rgb(r, g, b),
        (ColorSupport::TrueColor | ColorSupport::Ansi256, Color::Indexed(i)) => {
            Foreground::Indexed(i)
        }
        (ColorSupport::Ansi256, Color::Rgb { r, g, b }) => Foreground::Indexed(rgb_to_256(r, g, b)),
        (ColorSupport::Ansi16, Color::Rgb { r, g, b }) => Foreground::Ansi16(rgb_to_ansi16(r, g, b)),
        (ColorSupport::Ansi16, Color::Indexed(i)) => Foreground::Ansi16(indexed_to_ansi16(i)),
    };
    Some(fg)
}

/// crossterm command writing one SGR foreground sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetForeground(pub Foreground);

impl crossterm::Command for SetForeground {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        match self.0 {
            Foreground::Default => f.write_str("\x1b[39m"),
            Foreground::Ansi16(n) if n < 8 => write!(f, "\x1b[{}m", 30 + n),
            Foreground::Ansi16(n) => write!(f, "\x1b[{}m", 90 + (n & 0x07)),
            Foreground::Indexed(i) => write!(f, "\x1b[38;5;{i}m"),
            Foreground::Rgb(r, g, b) => write!(f, "\x1b[38;2;{r};{g};{b}m"),
        }
    }

    #[cfg(windows)]
    fn execute_winapi(&self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Nearest xterm-256 index: grey ramp for neutral colors, 6x6x6 cube otherwise.
pub fn rgb_to_256(r: u8, g: u8, b: u8) -> u8 {
    if r == g && g == b {
        if r < 8 {
            return 16;
        }
        if r > 238 {
            return 231;
        }
        return ((r as u16 - 8) / 10) as u8 + 232;
    }
    let level = |v: u8| -> u8 {
        if v < 48 {
            0
        } else if v < 115 {
            1
        } else {
            ((v as u16 - 35) / 40) as u8
        }
    };
    16 + 36 * level(r) + 6 * level(g) + level(b)
}

/// Nearest of the 16 base colors; saturated channels pick the bright half.
pub fn rgb_to_ansi16(r: u8, g: u8, b: u8) -> u8 {
    let max = r.max(g).max(b);
    if max < 0x30 {
        return 0;
    }
    let threshold = max / 2;
    let bits = u8::from(r > threshold) | (u8::from(g > threshold) << 1) | (u8::from(b > threshold) << 2);
    if max > 0xc0 { bits + 8 } else { bits }
}

/// Map an xterm-256 index onto the 16 base colors.
pub fn indexed_to_ansi16(i: u8) -> u8 {
    match i {
        0..=15 => i,
        16..=231 => {
            let v = i - 16;
            let scale = |c: u8| (c as u16 * 255 / 5) as u8;
            rgb_to_ansi16(scale(v / 36), scale((v / 6) % 6), scale(v % 6))
        }
        _ => {
            let level = 8 + (i - 232) * 10;
            rgb_to_ansi16(level, level, level)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sgr(fg: Foreground) -> String {
        let mut s = String::new();
        crossterm::Command::write_ansi(&SetForeground(fg), &mut s).unwrap();
        s
    }

    #[test]
    fn no_color_support_emits_nothing() {
        assert_eq!(downsample(Some(Color::Ansi(1)), ColorSupport::None), None);
        assert_eq!(downsample(None, ColorSupport::None), None);
        assert_eq!(downsample(None, ColorSupport::Ansi16), Some(Foreground::Default));
    }

    #[test]
    fn truecolor_passes_rgb_through() {
        let c = Color::Rgb { r: 1, g: 2, b: 3 };
        assert_eq!(
            downsample(Some(c), ColorSupport::TrueColor),
            Some(Foreground::Rgb(1, 2, 3))
        );
        assert_eq!(sgr(Foreground::Rgb(1, 2, 3)), "\x1b[38;2;1;2;3m");
    }

    #[test]
    fn ansi_codes_use_classic_sgr() {
        assert_eq!(sgr(Foreground::Ansi16(1)), "\x1b[31m");
        assert_eq!(sgr(Foreground::Ansi16(9)), "\x1b[91m");
        assert_eq!(sgr(Foreground::Indexed(244)), "\x1b[38;5;244m");
        assert_eq!(sgr(Foreground::Default), "\x1b[39m");
    }

    #[test]
    fn rgb_downsampling() {
        assert_eq!(rgb_to_256(0, 0, 0), 16);
        assert_eq!(rgb_to_256(255, 255, 255), 231);
        assert_eq!(rgb_to_256(255, 0, 0), 196);
        assert_eq!(rgb_to_256(128, 128, 128), 244);
        assert_eq!(rgb_to_ansi16(0, 0, 0), 0);
        assert_eq!(rgb_to_ansi16(255, 0, 0), 9);
        assert_eq!(rgb_to_ansi16(128, 0, 0), 1);
        assert_eq!(rgb_to_ansi16(255, 255, 255), 15);
    }

    #[test]
    fn indexed_downsampling_stays_in_range() {
        for i in 0..=255u8 {
            assert!(indexed_to_ansi16(i) < 16);
        }
        assert_eq!(indexed_to_ansi16(196), 9);
    }
}
