use std::fmt;
use std::str::FromStr;

use super::error::RenderError;

/// Output format a diagram can be fetched in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramFormat {
    Txt,
    Png,
    Svg,
}

impl DiagramFormat {
    /// Path segment the renderer uses for this format (`/txt/{id}` and friends).
    pub fn as_path_segment(self) -> &'static str {
        match self {
            DiagramFormat::Txt => "txt",
            DiagramFormat::Png => "png",
            DiagramFormat::Svg => "svg",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            DiagramFormat::Txt => "text/plain; charset=utf-8",
            DiagramFormat::Png => "image/png",
            DiagramFormat::Svg => "image/svg+xml",
        }
    }
}

impl fmt::Display for DiagramFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path_segment())
    }
}

impl FromStr for DiagramFormat {
    type Err = RenderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "txt" => Ok(DiagramFormat::Txt),
            "png" => Ok(DiagramFormat::Png),
            "svg" => Ok(DiagramFormat::Svg),
            other => Err(RenderError::unknown_format(other)),
        }
    }
}

/// A renderer-reported problem in the submitted diagram source.
///
/// `line_number` is 1-based as reported by the renderer; 0 means the report
/// carried no parseable line number. `raw` keeps the renderer's plaintext
/// diagnostic verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line_number: u32,
    pub line_with_error: String,
    pub raw: String,
}
