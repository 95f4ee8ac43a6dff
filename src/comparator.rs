//! Default byte-equal comparator, plus the special-judge extension point.

use crate::core::{SpecialJudge, Verdict};

/// Normalize output for comparison:
/// 1. `\r\n` -> `\n`.
/// 2. Strip a single trailing newline, then trailing whitespace per line,
///    then trailing blank lines.
///
/// Idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &[u8]) -> Vec<u8> {
    let text = String::from_utf8_lossy(raw).replace("\r\n", "\n");
    let text = text.strip_suffix('\n').unwrap_or(&text);

    let mut lines: Vec<&str> = text.split('\n').map(|line| line.trim_end()).collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    lines.join("\n").into_bytes()
}

/// Compare actual output against expected output for one test case.
/// `special_judge` is accepted as a parameter but not yet invoked; see
/// [`run_special_judge`].
pub fn compare(expected: &[u8], actual: &[u8], special_judge: Option<&SpecialJudge>) -> Verdict {
    if special_judge.is_some() {
        return run_special_judge();
    }
    if normalize(expected) == normalize(actual) {
        Verdict::Accepted
    } else {
        Verdict::WrongAnswer
    }
}

/// Extension point: invoke the problem's checker program in a nested
/// Sandbox instance with `input`, `expected`, `actual` as arguments; exit
/// code 0 -> Accepted, 1 -> Wrong Answer, anything else -> System Error.
///
/// Not implemented: the checker is declared by a flag on [`Problem`] but
/// never exercised by an initial build of the core.
fn run_special_judge() -> Verdict {
    Verdict::SystemError
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_converts_crlf_to_lf() {
        assert_eq!(normalize(b"a\r\nb\r\n"), normalize(b"a\nb\n"));
    }

    #[test]
    fn normalize_strips_trailing_newline_and_whitespace() {
        assert_eq!(normalize(b"hello\n"), b"hello");
        assert_eq!(normalize(b"hello   \n"), b"hello");
        assert_eq!(normalize(b"hello"), b"hello");
    }

    #[test]
    fn normalize_strips_trailing_blank_lines() {
        assert_eq!(normalize(b"hello\n\n\n"), b"hello");
    }

    #[test]
    fn normalize_preserves_interior_blank_lines() {
        assert_eq!(normalize(b"a\n\nb\n"), b"a\n\nb");
    }

    #[test]
    fn normalize_is_idempotent() {
        let samples: [&[u8]; 4] = [b"hello\r\n", b"a\n\n\n", b"  trailing space \n", b""];
        for sample in samples {
            let once = normalize(sample);
            let twice = normalize(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn matching_output_is_accepted() {
        assert_eq!(compare(b"hello\n", b"hello\n", None), Verdict::Accepted);
    }

    #[test]
    fn mismatched_output_is_wrong_answer() {
        assert_eq!(compare(b"hello\n", b"hi\n", None), Verdict::WrongAnswer);
    }

    #[test]
    fn trailing_whitespace_does_not_affect_verdict() {
        assert_eq!(compare(b"hello\n", b"hello   \n\n", None), Verdict::Accepted);
    }
}
