//! Text re-flow utilities for terminal rendering.

/// Minimum length a physical line must have before the following line is
/// treated as its hard-wrapped continuation. Shorter lines are assumed
/// to be short on purpose.
const HARD_WRAP_THRESHOLD: usize = 56;

/// Join hard-wrapped paragraph lines back into single logical lines.
///
/// Markdown-ish bodies arrive wrapped at a fixed margin, which renders
/// badly once the terminal re-wraps them at its own width. This joins a
/// line onto its predecessor when the predecessor looks hard-wrapped
/// (at least [`HARD_WRAP_THRESHOLD`] columns), while leaving alone:
///
/// - indented blocks (code, quoted output),
/// - list items (`- `, `* `, `+ `, `1. `, `1) `),
/// - `Signed-off-by:`-style trailer lines,
/// - horizontal separators (`----`, `====`),
/// - runs of short lines, which are short for a reason.
pub fn unwrap(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    // raw length of the previous emitted line, when it can accept a
    // continuation
    let mut joinable_len: Option<usize> = None;

    for line in text.lines() {
        if line.trim().is_empty() || is_verbatim(line) {
            result.push_str(line);
            result.push('\n');
            joinable_len = None;
            continue;
        }

        if joinable_len.is_some_and(|len| len >= HARD_WRAP_THRESHOLD) {
            result.pop();
            result.push(' ');
        }
        result.push_str(line);
        result.push('\n');
        joinable_len = Some(line.chars().count());
    }

    if !text.ends_with('\n') {
        result.pop();
    }
    result
}

fn is_verbatim(line: &str) -> bool {
    line.chars().next().is_some_and(char::is_whitespace)
        || is_list_item(line)
        || is_separator(line)
        || is_trailer(line)
}

fn is_list_item(line: &str) -> bool {
    if line.starts_with("- ") || line.starts_with("* ") || line.starts_with("+ ") {
        return true;
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return false;
    }
    let rest = &line[digits..];
    rest.starts_with(". ") || rest.starts_with(") ")
}

fn is_separator(line: &str) -> bool {
    line.len() >= 3 && line.chars().all(|c| matches!(c, '-' | '=' | '_' | '*'))
}

fn is_trailer(line: &str) -> bool {
    let Some((key, _)) = line.split_once(": ") else {
        return false;
    };
    let mut chars = key.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Prefix every non-empty line of `text` with `prefix`.
pub fn indent(text: &str, prefix: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for line in text.lines() {
        if !line.is_empty() {
            result.push_str(prefix);
            result.push_str(line);
        }
        result.push('\n');
    }
    if !text.ends_with('\n') {
        result.pop();
    }
    result
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_should_join_hard_wrapped_paragraph() {
        let input = "\
Alice was beginning to get very tired of sitting by her sister
on the bank, and of having nothing to do: once or twice she had
peeped into the book her sister was reading.
";
        let want = "\
Alice was beginning to get very tired of sitting by her sister on the bank, and of having nothing to do: once or twice she had peeped into the book her sister was reading.
";
        assert_eq!(unwrap(input), want);
    }

    #[test]
    fn test_should_keep_short_lines_apart() {
        let input = "\
Short lines that were not wrapped
stay on their own lines
because they are short for some reason.
";
        assert_eq!(unwrap(input), input);
    }

    #[test]
    fn test_should_preserve_blank_line_separated_paragraphs() {
        let input = "\
The first paragraph is wrapped at a margin well past the threshold
and continues here.

The second paragraph is also wrapped at a margin past the threshold
and continues here too.
";
        let want = "\
The first paragraph is wrapped at a margin well past the threshold and continues here.

The second paragraph is also wrapped at a margin past the threshold and continues here too.
";
        assert_eq!(unwrap(input), want);
    }

    #[test]
    fn test_should_preserve_indented_blocks() {
        let input = "\
A paragraph that is long enough to be considered hard-wrapped here
continues on this line.

    indented code stays
    exactly as written

\ttab-indented too
";
        let want = "\
A paragraph that is long enough to be considered hard-wrapped here continues on this line.

    indented code stays
    exactly as written

\ttab-indented too
";
        assert_eq!(unwrap(input), want);
    }

    #[rstest]
    #[case("- some thing\n- some other thing\n")]
    #[case("* one\n* two\n")]
    #[case("+ one\n+ two\n")]
    #[case("1. thing the first\n2. thing the second!\n")]
    #[case("1) thing the first\n2) thing the second!\n")]
    fn test_should_preserve_list_items(#[case] input: &str) {
        assert_eq!(unwrap(input), input);
    }

    #[test]
    fn test_should_preserve_trailers_after_long_lines() {
        let input = "\
The conversion logic did not handle UTF-16 files correctly, which
has been corrected in this change.
source: <pull.1294.v2@example.com>

Signed-off-by: Foo Bar <foobar@example.com>
Reviewed-by: Baz Qux <baz@example.com>
";
        let want = "\
The conversion logic did not handle UTF-16 files correctly, which has been corrected in this change.
source: <pull.1294.v2@example.com>

Signed-off-by: Foo Bar <foobar@example.com>
Reviewed-by: Baz Qux <baz@example.com>
";
        assert_eq!(unwrap(input), want);
    }

    #[test]
    fn test_should_not_treat_separators_as_text() {
        let input = "\
The first paragraph is wrapped at a margin past the join threshold
and continues here.

----
The second paragraph is also wrapped past the join threshold okay
and continues here.
";
        let want = "\
The first paragraph is wrapped at a margin past the join threshold and continues here.

----
The second paragraph is also wrapped past the join threshold okay and continues here.
";
        assert_eq!(unwrap(input), want);
    }

    #[rstest]
    #[case("")]
    #[case("\n")]
    #[case("single line\n")]
    #[case("no trailing newline")]
    fn test_should_handle_degenerate_inputs(#[case] input: &str) {
        assert_eq!(unwrap(input), input);
    }

    #[test]
    fn test_should_indent_non_empty_lines() {
        assert_eq!(indent("a\n\nb\n", "  "), "  a\n\n  b\n");
        assert_eq!(indent("a\nb", "> "), "> a\n> b");
        assert_eq!(indent("", "> "), "");
    }

    mod prop {
        use proptest::prelude::*;

        use super::super::*;

        proptest! {
            #[test]
            fn unwrap_preserves_words(lines in proptest::collection::vec("[ -~]{0,90}", 0..12)) {
                let text = lines.join("\n");
                let unwrapped = unwrap(&text);
                let want: Vec<&str> = text.split_whitespace().collect();
                let got: Vec<&str> = unwrapped.split_whitespace().collect();
                prop_assert_eq!(want, got);
            }

            #[test]
            fn unwrap_never_grows_line_count(lines in proptest::collection::vec("[ -~]{0,90}", 0..12)) {
                let text = lines.join("\n");
                let unwrapped = unwrap(&text);
                prop_assert!(unwrapped.lines().count() <= text.lines().count());
            }

            #[test]
            fn indent_preserves_line_count(text in "[ -~\n]{0,200}", prefix in "[> ]{0,4}") {
                let indented = indent(&text, &prefix);
                prop_assert_eq!(indented.lines().count(), text.lines().count());
            }
        }
    }
}
