// Markdown stripping for model replies shown in a plain chat bubble.

use std::sync::LazyLock;

use regex::Regex;

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("Invalid regex pattern"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("Invalid regex pattern"));
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#{1,6}\s").expect("Invalid regex pattern"));
static CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`{1,3}(.*?)`{1,3}").expect("Invalid regex pattern"));

/// Removes bold, italic, heading and code markers, then trims.
///
/// Patterns apply within a line; a marker left open at the end of a line is
/// kept as is.
pub fn strip_markdown(text: &str) -> String {
    let text = BOLD.replace_all(text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = HEADING.replace_all(&text, "");
    let text = CODE.replace_all(&text, "$1");
    text.trim().to_string()
}
