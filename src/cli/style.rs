//! Terminal styling for `portal`
//!
//! Semantic styles via the [`Stylize`] trait; color support detection is
//! left to `owo-colors` (`NO_COLOR`, `CLICOLOR`, TTY checks).
//!
//! | Method        | Color  | Stream | Used for                          |
//! |---------------|--------|--------|-----------------------------------|
//! | `.accent()`   | Cyan   | stdout | branch names, PR numbers, logins  |
//! | `.success()`  | Green  | stdout | completed steps                   |
//! | `.error()`    | Red    | stderr | failures                          |
//! | `.warn()`     | Yellow | stderr | drafts, refusals                  |
//! | `.muted()`    | Dim    | stdout | hints, shas, file paths           |
//! | `.emphasis()` | Bold   | stdout | headers, current phase            |

use indicatif::{ProgressBar, ProgressStyle};
pub use owo_colors::Stream;
use owo_colors::{OwoColorize, Style};
use std::fmt::{self, Display};
use std::sync::OnceLock;
use std::time::Duration;

const ACCENT: Style = Style::new().cyan();
const SUCCESS: Style = Style::new().green();
const ERROR: Style = Style::new().red();
const WARN: Style = Style::new().yellow();
const MUTED: Style = Style::new().dimmed();
const EMPHASIS: Style = Style::new().bold();

/// A value rendered with a style when the target stream supports color
#[derive(Clone, Debug)]
pub struct Styled<T> {
    value: T,
    style: Style,
    stream: Stream,
}

impl<T> Styled<T> {
    const fn new(value: T, style: Style, stream: Stream) -> Self {
        Self {
            value,
            style,
            stream,
        }
    }
}

impl<T: Display> Display for Styled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.value
                .if_supports_color(self.stream, |v| v.style(self.style))
        )
    }
}

/// Extension trait for semantic terminal styling
pub trait Stylize: Display {
    /// Cyan, for primary information
    fn accent(&self) -> Styled<&Self> {
        Styled::new(self, ACCENT, Stream::Stdout)
    }

    /// Green, for completed work
    fn success(&self) -> Styled<&Self> {
        Styled::new(self, SUCCESS, Stream::Stdout)
    }

    /// Red on stderr
    fn error(&self) -> Styled<&Self> {
        Styled::new(self, ERROR, Stream::Stderr)
    }

    /// Yellow on stderr
    fn warn(&self) -> Styled<&Self> {
        Styled::new(self, WARN, Stream::Stderr)
    }

    /// Dimmed secondary text
    fn muted(&self) -> Styled<&Self> {
        Styled::new(self, MUTED, Stream::Stdout)
    }

    /// Bold
    fn emphasis(&self) -> Styled<&Self> {
        Styled::new(self, EMPHASIS, Stream::Stdout)
    }
}

impl<T: Display + ?Sized> Stylize for T {}

/// Green checkmark
pub const fn check() -> Styled<&'static str> {
    Styled::new("✓", SUCCESS, Stream::Stdout)
}

/// Red cross, rendered for stderr
pub const fn cross() -> Styled<&'static str> {
    Styled::new("✗", ERROR, Stream::Stderr)
}

/// Cyan arrow for steps
pub const fn arrow() -> Styled<&'static str> {
    Styled::new("→", ACCENT, Stream::Stdout)
}

/// Dimmed bullet for list items
pub const fn bullet() -> Styled<&'static str> {
    Styled::new("○", MUTED, Stream::Stdout)
}

const fn to_hyperlink_stream(stream: Stream) -> supports_hyperlinks::Stream {
    match stream {
        Stream::Stdout => supports_hyperlinks::Stream::Stdout,
        Stream::Stderr => supports_hyperlinks::Stream::Stderr,
    }
}

/// Clickable OSC 8 link showing the URL itself, or the plain URL
pub fn hyperlink_url(stream: Stream, url: &str) -> String {
    if supports_hyperlinks::on(to_hyperlink_stream(stream)) {
        terminal_link::Link::new(url, url).to_string()
    } else {
        url.to_string()
    }
}

fn spinner_style() -> ProgressStyle {
    static STYLE: OnceLock<ProgressStyle> = OnceLock::new();
    STYLE
        .get_or_init(|| {
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        })
        .clone()
}

/// Start a ticking spinner with `message`; call `finish_and_clear` when done
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_style(spinner_style());
    bar.set_message(message.into());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}
