//! Markup stripping for free-text input.
//!
//! Text typed by the user (exercise search terms, set notes) is stored and
//! later rendered, so executable markup is removed before it enters state.
//! Alterations are never reported back to the caller.

use once_cell::sync::Lazy;
use regex::Regex;

/// Elements removed together with everything they enclose
const BLOCKED_ELEMENTS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "noscript", "template",
];

/// One pattern per blocked element. An opening tag without a matching close
/// swallows the rest of the input.
static BLOCKED_ELEMENT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    BLOCKED_ELEMENTS
        .iter()
        .filter_map(|name| {
            Regex::new(&format!(r"(?is)<{name}\b[^>]*>.*?(?:</{name}\s*>|\z)")).ok()
        })
        .collect()
});

static COMMENT_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?(?:-->|\z)").ok());

/// Any remaining tag: `<` directly followed by a letter, `/` or `!`
static TAG_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"<[A-Za-z/!][^<>]*>").ok());

/// Strip unsafe markup from `input`.
///
/// Passes are repeated until nothing changes, so nested fragments such as
/// `<<b>script>` cannot reassemble into a tag, and
/// `sanitize(&sanitize(x)) == sanitize(x)` holds for every input.
pub fn sanitize(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let next = strip_once(&current);
        if next == current {
            break;
        }
        current = next;
    }

    if current != input {
        tracing::debug!(
            "Sanitized input ({} -> {} bytes)",
            input.len(),
            current.len()
        );
    }
    current
}

fn strip_once(input: &str) -> String {
    let mut out = input.to_string();

    if let Some(re) = COMMENT_PATTERN.as_ref() {
        out = re.replace_all(&out, "").into_owned();
    }
    for re in BLOCKED_ELEMENT_PATTERNS.iter() {
        out = re.replace_all(&out, "").into_owned();
    }
    if let Some(re) = TAG_PATTERN.as_ref() {
        out = re.replace_all(&out, "").into_owned();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_block_removed() {
        assert_eq!(sanitize("<script>alert(1)</script>Supino"), "Supino");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(sanitize("Supino Reto"), "Supino Reto");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_formatting_tags_keep_text() {
        assert_eq!(sanitize("<b>Agachamento</b> livre"), "Agachamento livre");
        assert_eq!(
            sanitize(r#"<img src=x onerror="alert(1)">Remada"#),
            "Remada"
        );
    }

    #[test]
    fn test_case_insensitive_and_attributes() {
        assert_eq!(
            sanitize(r#"<SCRIPT type="text/javascript">x()</SCRIPT >ok"#),
            "ok"
        );
        assert_eq!(sanitize("<style>body{}</style>leg day"), "leg day");
    }

    #[test]
    fn test_unterminated_script_removes_rest() {
        assert_eq!(sanitize("felt good<script>steal()"), "felt good");
    }

    #[test]
    fn test_comments_removed() {
        assert_eq!(sanitize("a<!-- hidden -->b"), "ab");
    }

    #[test]
    fn test_comparison_text_preserved() {
        assert_eq!(sanitize("rpe < 8 and > 6"), "rpe < 8 and > 6");
        assert_eq!(sanitize("3 <5"), "3 <5");
    }

    #[test]
    fn test_nested_fragments_do_not_reassemble() {
        assert_eq!(sanitize("<<b>script>alert(1)<</b>/script>"), "");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "<script>alert(1)</script>Supino",
            "<<b>script>alert(1)<</b>/script>",
            "<scr<script>x</script>ipt>y</script>",
            "a < b <c",
            "<!--<!-- -->-->",
            "<<<>>>",
            "<i>nota</i> <u>x",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {:?}", input);
        }
    }
}
