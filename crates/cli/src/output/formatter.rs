//! Rendering of command results
//!
//! A command hands its result to [`Formatter::report`] once, either as a
//! serializable value (JSON mode) or as text lines. Errors always go to
//! stderr.

use console::Style;
use serde::Serialize;

use super::OutputConfig;

/// Width of the label column in key/value listings
const LABEL_WIDTH: usize = 10;

/// What a piece of text represents, which decides its style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Profile and container names
    Name,
    /// Labels in key/value listings
    Label,
    /// Blob sizes
    Size,
    /// Endpoints
    Url,
    /// Secondary details
    Dim,
}

impl Tone {
    fn style(self) -> Style {
        match self {
            Tone::Name => Style::new().bold(),
            Tone::Label => Style::new().cyan(),
            Tone::Size => Style::new().green(),
            Tone::Url => Style::new().cyan().underlined(),
            Tone::Dim => Style::new().dim(),
        }
    }
}

/// Prints command results as text or JSON
///
/// JSON output is never styled.
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    fn styled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    /// Style `text` according to `tone`
    pub fn paint(&self, tone: Tone, text: &str) -> String {
        if self.styled() {
            tone.style().apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// A `Label     : value` line with an aligned label column
    pub fn field(&self, label: &str, value: &str) -> String {
        let label = self.paint(Tone::Label, &format!("{label:<LABEL_WIDTH$}:"));
        if value.is_empty() {
            label
        } else {
            format!("{label} {value}")
        }
    }

    /// A line announcing a completed change
    pub fn done(&self, message: &str) -> String {
        let check = if self.styled() {
            Style::new().green().apply_to("✓").to_string()
        } else {
            "✓".to_string()
        };
        format!("{check} {message}")
    }

    /// Print `value` as JSON, or the lines built by `text`
    ///
    /// Text output is suppressed in quiet mode; JSON output never is.
    pub fn report<T, F>(&self, value: &T, text: F)
    where
        T: Serialize,
        F: FnOnce(&Self) -> Vec<String>,
    {
        if let Some(rendered) = self.render(value, text) {
            println!("{rendered}");
        }
    }

    fn render<T, F>(&self, value: &T, text: F) -> Option<String>
    where
        T: Serialize,
        F: FnOnce(&Self) -> Vec<String>,
    {
        if self.config.json {
            return match serde_json::to_string_pretty(value) {
                Ok(json) => Some(json),
                Err(e) => {
                    self.error(&format!("Failed to serialize output: {e}"));
                    None
                }
            };
        }
        if self.config.quiet {
            return None;
        }
        let lines = text(self);
        (!lines.is_empty()).then(|| lines.join("\n"))
    }

    /// Print an error on stderr, even in quiet mode
    pub fn error(&self, message: &str) {
        if self.config.json {
            let error = serde_json::json!({ "error": message });
            match serde_json::to_string_pretty(&error) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("{message}"),
            }
        } else {
            let cross = if self.styled() {
                Style::new().red().apply_to("✗").to_string()
            } else {
                "✗".to_string()
            };
            eprintln!("{cross} {message}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formatter(json: bool, no_color: bool, quiet: bool) -> Formatter {
        Formatter::new(OutputConfig {
            json,
            no_color,
            quiet,
        })
    }

    #[test]
    fn test_plain_modes_leave_text_unstyled() {
        for f in [formatter(true, false, false), formatter(false, true, false)] {
            assert_eq!(f.paint(Tone::Name, "local"), "local");
            assert_eq!(f.paint(Tone::Size, "1 KiB"), "1 KiB");
            assert_eq!(f.done("Saved."), "✓ Saved.");
        }
    }

    #[test]
    fn test_field_aligns_labels() {
        let f = formatter(false, true, false);
        assert_eq!(f.field("Size", "3 B"), "Size      : 3 B");
        assert_eq!(f.field("Container", "data"), "Container : data");
        assert_eq!(f.field("Metadata", ""), "Metadata  :");
    }

    #[test]
    fn test_render_json_ignores_text_and_quiet() {
        let f = formatter(true, false, true);
        let rendered = f
            .render(&serde_json::json!({ "profiles": [] }), |_| -> Vec<String> {
                panic!("text should not be built in JSON mode")
            })
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value, serde_json::json!({ "profiles": [] }));
    }

    #[test]
    fn test_render_text() {
        let f = formatter(false, true, false);
        let rendered = f.render(&(), |f| vec![f.field("Blob", "a.txt"), "x".to_string()]);
        assert_eq!(rendered.as_deref(), Some("Blob      : a.txt\nx"));
        assert_eq!(f.render(&(), |_| Vec::new()), None);
    }

    #[test]
    fn test_render_quiet_suppresses_text() {
        let f = formatter(false, false, true);
        assert_eq!(f.render(&(), |_| vec!["hidden".to_string()]), None);
    }
}
