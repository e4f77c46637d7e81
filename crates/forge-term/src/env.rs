//! Construction-time snapshot of the environment signals consumed by the
//! terminal layer.
//!
//! All environment reads happen exactly once, in [`TermEnv::from_env`],
//! so tests can build a [`TermEnv`] by hand and never depend on
//! process-wide environment mutation.

/// Snapshot of every environment variable the terminal layer consults.
///
/// `Default` yields an empty environment, which is what the test
/// constructor uses: color off, no pager, no capability hints.
#[derive(Debug, Clone, Default)]
pub struct TermEnv {
    /// `NO_COLOR` — any non-empty value disables color.
    pub no_color: Option<String>,
    /// `CLICOLOR` — the value `"0"` disables color.
    pub clicolor: Option<String>,
    /// `CLICOLOR_FORCE` — any value other than `"0"` forces color on.
    pub clicolor_force: Option<String>,
    /// `TERM` — terminal type, probed for 256-color and true-color markers.
    pub term: Option<String>,
    /// `COLORTERM` — color capability advertisement.
    pub colorterm: Option<String>,
    /// `PAGER` — the user's pager command line.
    pub pager: Option<String>,
    /// `LESS` — pager flags; a default is injected into the pager child
    /// environment only when this was absent.
    pub less: Option<String>,
    /// `LV` — pager flags for `lv`, handled like `LESS`.
    pub lv: Option<String>,
    /// `FORGE_MD_STYLE` — markdown style override; any value other than
    /// `auto` pins the style and suppresses theme detection.
    pub md_style: Option<String>,
    /// `COLORFGBG` — foreground/background hint used for theme detection.
    pub colorfgbg: Option<String>,
}

impl TermEnv {
    /// Capture the current process environment.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok();
        Self {
            no_color: var("NO_COLOR"),
            clicolor: var("CLICOLOR"),
            clicolor_force: var("CLICOLOR_FORCE"),
            term: var("TERM"),
            colorterm: var("COLORTERM"),
            pager: var("PAGER"),
            less: var("LESS"),
            lv: var("LV"),
            md_style: var("FORGE_MD_STYLE"),
            colorfgbg: var("COLORFGBG"),
        }
    }

    /// Whether the environment asks for color to be disabled.
    ///
    /// True when `NO_COLOR` carries any non-empty value, or `CLICOLOR`
    /// is exactly `"0"`.
    pub fn color_disabled(&self) -> bool {
        self.no_color.as_deref().is_some_and(|v| !v.is_empty())
            || self.clicolor.as_deref() == Some("0")
    }

    /// Whether the environment forces color on regardless of TTY state.
    ///
    /// True only when `CLICOLOR_FORCE` is set to a non-empty value other
    /// than `"0"`.
    pub fn color_forced(&self) -> bool {
        self.clicolor_force
            .as_deref()
            .is_some_and(|v| !v.is_empty() && v != "0")
    }

    /// Whether the terminal advertises 256-color support.
    ///
    /// True-color support implies 256-color support.
    pub fn is_256_color_supported(&self) -> bool {
        self.is_true_color_supported()
            || self.term.as_deref().is_some_and(|v| v.contains("256"))
            || self.colorterm.as_deref().is_some_and(|v| v.contains("256"))
    }

    /// Whether the terminal advertises 24-bit color support.
    pub fn is_true_color_supported(&self) -> bool {
        let marker = |v: &str| v.contains("24bit") || v.contains("truecolor");
        self.term.as_deref().is_some_and(marker) || self.colorterm.as_deref().is_some_and(marker)
    }

    /// The background color index hinted by `COLORFGBG`, if parseable.
    ///
    /// The variable looks like `"15;0"` or `"15;default;0"`; the last
    /// segment is the background.
    pub(crate) fn background_hint(&self) -> Option<u8> {
        self.colorfgbg
            .as_deref()?
            .rsplit(';')
            .next()?
            .trim()
            .parse()
            .ok()
    }
}
