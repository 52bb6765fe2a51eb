//! Text cleanup for notebook cells.
//!
//! Markdown cells are drawn as plain bold text, so their markup has to go:
//! a literal `## Results` or `**note**` on the page looks broken. The rules
//! below strip the syntax and keep the words. Output text (tracebacks in
//! particular) carries ANSI colour escapes that are removed the same way.
//!
//! ## Rule order
//!
//! Line endings are normalised first so every later rule can assume `\n`.
//! Images are handled before links because `![alt](src)` contains a link.
//! Blank-line collapsing runs last, after rules that may empty a line.

use once_cell::sync::Lazy;
use regex::Regex;

/// Turn a markdown cell's source into the plain text that gets drawn.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 3. Drop code-fence lines, keeping the code between them
/// 4. Strip heading markers and blockquote markers
/// 5. Turn list markers into bullets
/// 6. Replace images with their alt text and links with their label
/// 7. Remove emphasis markers and inline-code backticks
/// 8. Remove inline HTML tags
/// 9. Trim trailing whitespace and collapse runs of blank lines
pub fn clean_markdown(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = drop_fence_lines(&s);
    let s = strip_block_markers(&s);
    let s = bulletise_lists(&s);
    let s = unwrap_images_and_links(&s);
    let s = strip_emphasis(&s);
    let s = strip_html_tags(&s);
    let s = trim_trailing_whitespace(&s);
    collapse_blank_lines(&s).trim_matches('\n').to_string()
}

/// Clean text produced by a code cell (stream output, reprs, tracebacks).
pub fn clean_output(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = RE_ANSI.replace_all(&s, "");
    let s = remove_invisible_chars(&s);
    trim_trailing_whitespace(&s).trim_end_matches('\n').to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Code fences ─────────────────────────────────────────────────────

fn drop_fence_lines(input: &str) -> String {
    input
        .lines()
        .filter(|line| {
            let t = line.trim_start();
            !(t.starts_with("```") || t.starts_with("~~~"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Headings and blockquotes ────────────────────────────────────────

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s{0,3}#{1,6}\s+").unwrap());
static RE_HEADING_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)\s+#+\s*$").unwrap());
static RE_QUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s{0,3}(?:>\s?)+").unwrap());

fn strip_block_markers(input: &str) -> String {
    let s = RE_QUOTE.replace_all(input, "");
    let s = RE_HEADING.replace_all(&s, "");
    RE_HEADING_TAIL.replace_all(&s, "").to_string()
}

// ── Rule 5: List markers ────────────────────────────────────────────────────

static RE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^(\s*)[-*+]\s+").unwrap());

fn bulletise_lists(input: &str) -> String {
    RE_BULLET.replace_all(input, "$1• ").to_string()
}

// ── Rule 6: Images and links ────────────────────────────────────────────────

static RE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").unwrap());
static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").unwrap());

fn unwrap_images_and_links(input: &str) -> String {
    let s = RE_IMAGE.replace_all(input, "$1");
    RE_LINK.replace_all(&s, "$1").to_string()
}

// ── Rule 7: Emphasis and inline code ────────────────────────────────────────

static RE_STRONG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*([^*\n]+)\*\*|__([^_\n]+)__").unwrap());
static RE_EMPHASIS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^\w*])\*([^*\s][^*\n]*)\*|(^|\W)_([^_\s][^_\n]*)_(\W|$)").unwrap());
static RE_STRIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"~~([^~\n]+)~~").unwrap());
static RE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]*)`").unwrap());

fn strip_emphasis(input: &str) -> String {
    let s = RE_CODE.replace_all(input, "$1");
    let s = RE_STRONG.replace_all(&s, "$1$2");
    let s = RE_EMPHASIS.replace_all(&s, "$1$2$3$4$5");
    RE_STRIKE.replace_all(&s, "$1").to_string()
}

// ── Rule 8: Inline HTML ─────────────────────────────────────────────────────

static RE_BR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[A-Za-z][^>\n]*>").unwrap());

fn strip_html_tags(input: &str) -> String {
    let s = RE_BR.replace_all(input, "\n");
    RE_TAG.replace_all(&s, "").to_string()
}

// ── Rule 9: Whitespace ──────────────────────────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

static RE_ANSI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").unwrap());

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_stripped() {
        assert_eq!(clean_markdown("# Title"), "Title");
        assert_eq!(clean_markdown("### Closed ###"), "Closed");
        assert_eq!(clean_markdown("#hashtag"), "#hashtag");
    }

    #[test]
    fn test_emphasis_stripped() {
        assert_eq!(clean_markdown("a **bold** and *it* word"), "a bold and it word");
        assert_eq!(clean_markdown("__strong__ _em_"), "strong em");
        assert_eq!(clean_markdown("~~gone~~"), "gone");
    }

    #[test]
    fn test_snake_case_survives() {
        assert_eq!(clean_markdown("call my_func_name now"), "call my_func_name now");
        assert_eq!(clean_markdown("2 * 3 * 4"), "2 * 3 * 4");
    }

    #[test]
    fn test_inline_code_unwrapped() {
        assert_eq!(clean_markdown("run `pip install x`"), "run pip install x");
    }

    #[test]
    fn test_links_and_images() {
        assert_eq!(
            clean_markdown("see [docs](https://x.org) ![a chart](c.png)"),
            "see docs a chart"
        );
    }

    #[test]
    fn test_lists_and_quotes() {
        assert_eq!(clean_markdown("- one\n* two"), "• one\n• two");
        assert_eq!(clean_markdown("> quoted"), "quoted");
    }

    #[test]
    fn test_fences_dropped() {
        assert_eq!(clean_markdown("```python\nx = 1\n```"), "x = 1");
    }

    #[test]
    fn test_html_tags() {
        assert_eq!(clean_markdown("a<br>b <b>c</b>"), "a\nb c");
    }

    #[test]
    fn test_line_endings_and_blank_lines() {
        assert_eq!(clean_markdown("a\r\n\r\n\r\n\r\nb\r\n"), "a\n\nb");
    }

    #[test]
    fn test_remove_invisible() {
        let input = "hello\u{200B}world\u{FEFF}foo\u{00AD}bar";
        assert_eq!(remove_invisible_chars(input), "helloworldfoobar");
    }

    #[test]
    fn test_output_strips_ansi() {
        let tb = "\u{1b}[0;31mValueError\u{1b}[0m: bad\r\n";
        assert_eq!(clean_output(tb), "ValueError: bad");
    }
}
