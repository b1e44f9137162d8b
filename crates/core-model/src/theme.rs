//! Theme collaborator interface and the two built-in palettes.

/// Terminal-independent color value. Encoding into escape sequences is the
/// renderer's job and depends on detected color support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// One of the 16 standard ANSI colors (0..=15; 8..=15 are the bright set).
    Ansi(u8),
    /// xterm 256-color palette index.
    Indexed(u8),
    Rgb { r: u8, g: u8, b: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeCategory {
    Prompt,
    Text,
    Keyword,
    String,
    Number,
    Comment,
    Operator,
    Error,
}

impl ThemeCategory {
    pub const ALL: [ThemeCategory; 8] = [
        ThemeCategory::Prompt,
        ThemeCategory::Text,
        ThemeCategory::Keyword,
        ThemeCategory::String,
        ThemeCategory::Number,
        ThemeCategory::Comment,
        ThemeCategory::Operator,
        ThemeCategory::Error,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

pub trait Theme {
    /// Stable identity; two themes with the same id must map every category
    /// to the same color.
    fn id(&self) -> u64;
    /// `None` means the terminal's default foreground.
    fn color_for(&self, category: ThemeCategory) -> Option<Color>;
}

/// Fixed category -> color table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    id: u64,
    name: &'static str,
    colors: [Option<Color>; 8],
}

impl Palette {
    /// No colors at all; everything uses the terminal default.
    pub fn plain() -> Self {
        Self {
            id: 0,
            name: "plain",
            colors: [None; 8],
        }
    }

    pub fn dark() -> Self {
        let mut colors = [None; 8];
        colors[ThemeCategory::Prompt.index()] = Some(Color::Rgb {
            r: 0x5f,
            g: 0xaf,
            b: 0xff,
        });
        colors[ThemeCategory::Keyword.index()] = Some(Color::Rgb {
            r: 0xc6,
            g: 0x78,
            b: 0xdd,
        });
        colors[ThemeCategory::String.index()] = Some(Color::Rgb {
            r: 0x98,
            g: 0xc3,
            b: 0x79,
        });
        colors[ThemeCategory::Number.index()] = Some(Color::Indexed(214));
        colors[ThemeCategory::Comment.index()] = Some(Color::Indexed(244));
        colors[ThemeCategory::Operator.index()] = Some(Color::Ansi(6));
        colors[ThemeCategory::Error.index()] = Some(Color::Ansi(9));
        Self {
            id: 1,
            name: "dark",
            colors,
        }
    }

    /// Look up a built-in palette by its configuration name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "plain" => Some(Self::plain()),
            "dark" => Some(Self::dark()),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Theme for Palette {
    fn id(&self) -> u64 {
        self.id
    }

    fn color_for(&self, category: ThemeCategory) -> Option<Color> {
        self.colors[category.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_has_no_colors() {
        let p = Palette::plain();
        assert!(ThemeCategory::ALL.iter().all(|c| p.color_for(*c).is_none()));
    }

    #[test]
    fn palettes_have_distinct_ids() {
        assert_ne!(Palette::plain().id(), Palette::dark().id());
        assert_eq!(Palette::by_name("dark").map(|p| p.id()), Some(1));
        assert!(Palette::by_name("solarized").is_none());
    }

    #[test]
    fn dark_leaves_plain_text_default() {
        let p = Palette::dark();
        assert!(p.color_for(ThemeCategory::Text).is_none());
        assert!(p.color_for(ThemeCategory::Prompt).is_some());
    }
}
