//! ANSI styling for terminal reports.

/// Wraps text in ANSI SGR sequences when enabled.
///
/// A disabled palette returns text unchanged, which keeps piped output and
/// test fixtures plain.
///
/// # Examples
///
/// ```
/// use reviews_core::Palette;
///
/// assert_eq!(Palette::plain().green("ok"), "ok");
/// assert_eq!(Palette::new(true).green("ok"), "\x1b[32mok\x1b[39m");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// A palette that never emits escape sequences.
    pub fn plain() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn paint(&self, open: &str, close: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{open}m{text}\x1b[{close}m")
        } else {
            text.to_string()
        }
    }

    pub fn cyan(&self, text: &str) -> String {
        self.paint("36", "39", text)
    }

    pub fn yellow(&self, text: &str) -> String {
        self.paint("33", "39", text)
    }

    pub fn green(&self, text: &str) -> String {
        self.paint("32", "39", text)
    }

    pub fn red(&self, text: &str) -> String {
        self.paint("31", "39", text)
    }

    pub fn magenta(&self, text: &str) -> String {
        self.paint("35", "39", text)
    }

    pub fn bright_white(&self, text: &str) -> String {
        self.paint("97", "39", text)
    }

    /// xterm color 8, used for field labels.
    pub fn gray(&self, text: &str) -> String {
        self.paint("38;5;8", "39", text)
    }

    /// Underlined blue, used for links.
    pub fn link(&self, text: &str) -> String {
        self.paint("34;4", "39;24", text)
    }

    /// Underlined bright black, used for secondary links.
    pub fn dim_link(&self, text: &str) -> String {
        self.paint("90;4", "39;24", text)
    }
}
