//! Color scheme for themed terminal output.
//!
//! A [`ColorScheme`] is derived from the stream bundle's current state and
//! is immutable: if the bundle changes (e.g. `force_terminal`), callers
//! re-derive a fresh scheme. When color is disabled every colorizer is the
//! identity function, byte for byte.

use console::Style;

/// 256-color palette index used for gray on capable terminals.
const GRAY_256: u8 = 242;

/// A colorizer produced by name lookup; applies one named style to text.
pub type ColorFn = Box<dyn Fn(&str) -> String + Send + Sync>;

/// The closed set of color names renderable from externally-sourced
/// labels (e.g. a remote API's state field).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedColor {
    /// Bold, default foreground.
    Bold,
    /// Red.
    Red,
    /// Yellow.
    Yellow,
    /// Green.
    Green,
    /// Gray (256-color aware).
    Gray,
    /// Magenta.
    Magenta,
    /// Cyan.
    Cyan,
    /// Blue.
    Blue,
}

impl NamedColor {
    /// Parse a color name, case-insensitively.
    ///
    /// Unknown names yield `None`; [`ColorScheme::color_from_string`]
    /// turns that into the identity function rather than an error.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "bold" => Some(Self::Bold),
            "red" => Some(Self::Red),
            "yellow" => Some(Self::Yellow),
            "green" => Some(Self::Green),
            "gray" | "grey" => Some(Self::Gray),
            "magenta" => Some(Self::Magenta),
            "cyan" => Some(Self::Cyan),
            "blue" => Some(Self::Blue),
            _ => None,
        }
    }
}

/// Conditionally applies ANSI styling based on the capability state it
/// was derived with.
#[derive(Debug, Clone, Copy)]
pub struct ColorScheme {
    enabled: bool,
    is_256_enabled: bool,
    has_true_color: bool,
}

impl ColorScheme {
    /// Create a scheme from explicit capability flags.
    pub fn new(enabled: bool, is_256_enabled: bool, has_true_color: bool) -> Self {
        Self {
            enabled,
            is_256_enabled,
            has_true_color,
        }
    }

    /// Whether this scheme emits any styling at all.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Whether this scheme may use the 256-color palette.
    pub fn is_256_enabled(&self) -> bool {
        self.is_256_enabled
    }

    /// Whether the terminal advertised 24-bit color when this scheme was
    /// derived. Exposed for renderers that pick richer themes.
    pub fn has_true_color(&self) -> bool {
        self.has_true_color
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        // force_styling: enablement is this scheme's decision, not the
        // console crate's own TTY probe
        style.force_styling(true).apply_to(text).to_string()
    }

    /// Bold text.
    pub fn bold(&self, text: &str) -> String {
        self.paint(Style::new().bold(), text)
    }

    /// Red text.
    pub fn red(&self, text: &str) -> String {
        self.paint(Style::new().red(), text)
    }

    /// Yellow text.
    pub fn yellow(&self, text: &str) -> String {
        self.paint(Style::new().yellow(), text)
    }

    /// Green text.
    pub fn green(&self, text: &str) -> String {
        self.paint(Style::new().green(), text)
    }

    /// Gray text. Uses the 256-color palette when available, basic
    /// bright-black otherwise.
    pub fn gray(&self, text: &str) -> String {
        if self.is_256_enabled {
            self.paint(Style::new().color256(GRAY_256), text)
        } else {
            self.paint(Style::new().black().bright(), text)
        }
    }

    /// Magenta text.
    pub fn magenta(&self, text: &str) -> String {
        self.paint(Style::new().magenta(), text)
    }

    /// Cyan text.
    pub fn cyan(&self, text: &str) -> String {
        self.paint(Style::new().cyan(), text)
    }

    /// Bold cyan text.
    pub fn cyan_bold(&self, text: &str) -> String {
        self.paint(Style::new().cyan().bold(), text)
    }

    /// Blue text.
    pub fn blue(&self, text: &str) -> String {
        self.paint(Style::new().blue(), text)
    }

    /// Apply one of the closed set of named colors.
    pub fn apply(&self, color: NamedColor, text: &str) -> String {
        match color {
            NamedColor::Bold => self.bold(text),
            NamedColor::Red => self.red(text),
            NamedColor::Yellow => self.yellow(text),
            NamedColor::Green => self.green(text),
            NamedColor::Gray => self.gray(text),
            NamedColor::Magenta => self.magenta(text),
            NamedColor::Cyan => self.cyan(text),
            NamedColor::Blue => self.blue(text),
        }
    }

    /// Look up a colorizer by name.
    ///
    /// Fails open: an unrecognized name returns the identity function, so
    /// rendering a label whose color comes from remote data never errors.
    pub fn color_from_string(&self, name: &str) -> ColorFn {
        let scheme = *self;
        match NamedColor::parse(name) {
            Some(color) => Box::new(move |text| scheme.apply(color, text)),
            None => Box::new(|text| text.to_string()),
        }
    }

    /// Green check mark.
    pub fn success_icon(&self) -> String {
        self.success_icon_with_color(NamedColor::Green)
    }

    /// Check mark in an arbitrary named color.
    pub fn success_icon_with_color(&self, color: NamedColor) -> String {
        self.apply(color, "✓")
    }

    /// Yellow warning bang.
    pub fn warning_icon(&self) -> String {
        self.yellow("!")
    }

    /// Red failure cross.
    pub fn failure_icon(&self) -> String {
        self.red("X")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn disabled() -> ColorScheme {
        ColorScheme::new(false, false, false)
    }

    fn enabled() -> ColorScheme {
        ColorScheme::new(true, false, false)
    }

    #[test]
    fn test_should_pass_text_through_unchanged_when_disabled() {
        let cs = disabled();
        assert_eq!(cs.bold("hello"), "hello");
        assert_eq!(cs.red("hello"), "hello");
        assert_eq!(cs.yellow("hello"), "hello");
        assert_eq!(cs.green("hello"), "hello");
        assert_eq!(cs.gray("hello"), "hello");
        assert_eq!(cs.magenta("hello"), "hello");
        assert_eq!(cs.cyan("hello"), "hello");
        assert_eq!(cs.cyan_bold("hello"), "hello");
        assert_eq!(cs.blue("hello"), "hello");
    }

    #[test]
    fn test_should_wrap_text_in_ansi_when_enabled() {
        let cs = enabled();
        let styled = cs.red("hello");
        assert!(styled.contains("hello"));
        assert!(styled.starts_with('\u{1b}'));
        assert!(styled.len() > "hello".len());
    }

    #[test]
    fn test_should_use_256_color_gray_when_supported() {
        let cs = ColorScheme::new(true, true, false);
        let styled = cs.gray("dim");
        assert!(styled.contains("38;5;242"));
        assert!(styled.contains("dim"));
    }

    #[test]
    fn test_should_use_basic_gray_without_256_support() {
        let cs = enabled();
        let styled = cs.gray("dim");
        assert!(!styled.contains("38;5;242"));
        assert!(styled.contains("dim"));
    }

    #[rstest]
    #[case("bold", NamedColor::Bold)]
    #[case("red", NamedColor::Red)]
    #[case("YELLOW", NamedColor::Yellow)]
    #[case("green", NamedColor::Green)]
    #[case("gray", NamedColor::Gray)]
    #[case("grey", NamedColor::Gray)]
    #[case("Magenta", NamedColor::Magenta)]
    #[case("cyan", NamedColor::Cyan)]
    #[case("blue", NamedColor::Blue)]
    fn test_should_parse_color_names(#[case] name: &str, #[case] expected: NamedColor) {
        assert_eq!(NamedColor::parse(name), Some(expected));
    }

    #[rstest]
    #[case("")]
    #[case("chartreuse")]
    #[case("nonexistent-name")]
    fn test_should_reject_unknown_color_names(#[case] name: &str) {
        assert_eq!(NamedColor::parse(name), None);
    }

    #[test]
    fn test_should_fall_back_to_identity_for_unknown_color_lookup() {
        let cs = enabled();
        let f = cs.color_from_string("nonexistent-name");
        assert_eq!(f("OPEN"), "OPEN");
        assert_eq!(f(""), "");
    }

    #[test]
    fn test_should_colorize_through_color_from_string() {
        let cs = enabled();
        let f = cs.color_from_string("green");
        assert_eq!(f("MERGED"), cs.green("MERGED"));
    }

    #[test]
    fn test_should_render_icons() {
        let cs = disabled();
        assert_eq!(cs.success_icon(), "✓");
        assert_eq!(cs.warning_icon(), "!");
        assert_eq!(cs.failure_icon(), "X");

        let cs = enabled();
        assert!(cs.success_icon().contains('✓'));
        assert!(cs.success_icon_with_color(NamedColor::Red).contains('✓'));
        assert!(cs.warning_icon().contains('!'));
        assert!(cs.failure_icon().contains('X'));
    }

    mod prop {
        use proptest::prelude::*;

        use super::super::*;

        const ALL: [NamedColor; 8] = [
            NamedColor::Bold,
            NamedColor::Red,
            NamedColor::Yellow,
            NamedColor::Green,
            NamedColor::Gray,
            NamedColor::Magenta,
            NamedColor::Cyan,
            NamedColor::Blue,
        ];

        proptest! {
            #[test]
            fn disabled_scheme_is_identity(s in "\\PC{0,80}", idx in 0usize..8) {
                let cs = ColorScheme::new(false, false, false);
                prop_assert_eq!(cs.apply(ALL[idx], &s), s);
            }

            #[test]
            fn enabled_scheme_preserves_content(s in "[a-zA-Z0-9 ]{0,80}", idx in 0usize..8) {
                let cs = ColorScheme::new(true, true, true);
                let styled = cs.apply(ALL[idx], &s);
                prop_assert!(styled.contains(&s));
                prop_assert!(styled.len() > s.len());
            }

            #[test]
            fn unknown_name_lookup_is_identity(s in "\\PC{0,80}") {
                let cs = ColorScheme::new(true, true, true);
                let f = cs.color_from_string("no-such-color");
                prop_assert_eq!(f(&s), s);
            }
        }
    }
}
