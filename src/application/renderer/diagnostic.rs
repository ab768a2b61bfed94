//! Extraction of structured syntax diagnostics from the renderer's plaintext
//! error rendering.
//!
//! When the plaintext probe comes back with status 400 the body is an ASCII-art
//! error picture. Its first line names the failing source line as
//! `[From string (line N) ]` and its last line repeats the diagnostic message
//! prefixed with `Syntax error: `. Anything that does not open with that
//! marker is not a recognizable diagnostic.

use crate::domain::diagram::SyntaxError;

const LINE_MARKER: &str = "[From string (line ";
const MESSAGE_PREFIX: &str = " Syntax error: ";

/// Parse a plaintext error rendering into a structured [`SyntaxError`].
///
/// Returns `None` when the body does not open with the known marker. A marker
/// whose line number fails to parse still yields a diagnostic, with
/// `line_number` 0.
pub(crate) fn parse(plaintext: &str) -> Option<SyntaxError> {
    let first_line = plaintext.lines().next().unwrap_or("");
    let last_line = plaintext.lines().last().unwrap_or("");

    let trailer = first_line.strip_prefix(LINE_MARKER)?;
    let line_number = trailer
        .trim_end_matches([')', ']', ' '])
        .parse::<u32>()
        .unwrap_or(0);

    let line_with_error = last_line
        .strip_prefix(MESSAGE_PREFIX)
        .unwrap_or(last_line)
        .to_string();

    Some(SyntaxError {
        line_number,
        line_with_error,
        raw: plaintext.to_string(),
    })
}
