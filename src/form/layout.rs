//! Fixed-layout text helpers: greedy row wrapping and two-line name packing.
//!
//! Widths are counted in characters, not bytes.

/// Marker appended when names remain after the second packed line.
pub const MORE_MARKER: &str = " и др.";
const ELLIPSIS: char = '…';

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Greedily wrap `items` into exactly `rows` lines of at most `budget` chars.
///
/// Each item starts on a fresh line. With `numbered`, the first line of the
/// n-th non-empty item is prefixed with `"{n}. "`, and the prefix counts
/// against that line only. A word too long for an empty line is placed on
/// it anyway. Input past `rows` lines is dropped; short output is padded with
/// empty strings.
pub fn wrap_lines<S: AsRef<str>>(
    items: &[S],
    rows: usize,
    budget: usize,
    numbered: bool,
) -> Vec<String> {
    let mut lines: Vec<String> = Vec::with_capacity(rows);
    let mut number = 0;

    'items: for item in items {
        let mut words = item.as_ref().split_whitespace().peekable();
        if words.peek().is_none() {
            continue;
        }
        number += 1;

        let mut line = if numbered {
            format!("{number}. ")
        } else {
            String::new()
        };
        let mut len = char_len(&line);
        let mut has_word = false;

        for word in words {
            let word_len = char_len(word);
            if !has_word {
                line.push_str(word);
                len += word_len;
                has_word = true;
            } else if len + 1 + word_len <= budget {
                line.push(' ');
                line.push_str(word);
                len += 1 + word_len;
            } else {
                lines.push(std::mem::replace(&mut line, word.to_string()));
                len = word_len;
                if lines.len() == rows {
                    break 'items;
                }
            }
        }
        lines.push(line);
        if lines.len() == rows {
            break;
        }
    }

    lines.resize(rows, String::new());
    lines
}

/// Fill one line with comma-separated names starting at `start`.
///
/// Returns the line and the index of the first name left over. A name too
/// long for an empty line is cut with an ellipsis so the line always makes
/// progress.
fn fill_line(names: &[String], start: usize, max: usize) -> (String, usize) {
    let mut line = String::new();
    let mut len = 0;
    let mut next = start;

    while let Some(name) = names.get(next) {
        let name_len = char_len(name);
        if line.is_empty() {
            if name_len > max {
                line = truncate_chars(name, max.saturating_sub(1));
                line.push(ELLIPSIS);
                next += 1;
                break;
            }
            line.push_str(name);
            len = name_len;
        } else if len + 2 + name_len <= max {
            line.push_str(", ");
            line.push_str(name);
            len += 2 + name_len;
        } else {
            break;
        }
        next += 1;
    }
    (line, next)
}

/// Pack names into two lines of at most `max1` and `max2` chars.
///
/// Order is preserved. If names remain after the second line, it ends with
/// [`MORE_MARKER`] when that fits. Otherwise the next name is appended and
/// the line is cut to `max2` with an ellipsis.
pub fn pack_names(names: &[String], max1: usize, max2: usize) -> (String, String) {
    let (first, next) = fill_line(names, 0, max1);
    let (mut second, rest) = fill_line(names, next, max2);

    if rest < names.len() {
        if char_len(&second) + char_len(MORE_MARKER) <= max2 {
            second.push_str(MORE_MARKER);
        } else {
            let full = format!("{second}, {}", names[rest]);
            let mut cut = truncate_chars(&full, max2.saturating_sub(1));
            let trimmed_len = cut.trim_end_matches([',', ' ']).len();
            cut.truncate(trimmed_len);
            cut.push(ELLIPSIS);
            second = cut;
        }
    }
    (first, second)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize, name: &str) -> Vec<String> {
        (0..n).map(|_| name.to_string()).collect()
    }

    #[test]
    fn wrap_always_returns_requested_rows() {
        let long = "слово ".repeat(400);
        for items in [vec![], vec!["коротко".to_string()], vec![long]] {
            let out = wrap_lines(items.as_slice(), 10, 80, false);
            assert_eq!(out.len(), 10);
            assert!(out.iter().all(|l| char_len(l) <= 80));
        }
    }

    #[test]
    fn wrap_never_merges_items() {
        let out = wrap_lines(&["один", "два", "три"], 4, 80, false);
        assert_eq!(out, vec!["один", "два", "три", ""]);
    }

    #[test]
    fn wrap_spills_long_item_and_numbers_first_line_only() {
        let items = ["aaaa bbbb cccc", "dddd"];
        let out = wrap_lines(&items, 5, 10, true);
        assert_eq!(out, vec!["1. aaaa", "bbbb cccc", "2. dddd", "", ""]);
    }

    #[test]
    fn wrap_places_oversized_word_alone() {
        let out = wrap_lines(&["a verylongword b"], 3, 5, false);
        assert_eq!(out, vec!["a", "verylongword", "b"]);
    }

    #[test]
    fn wrap_truncates_past_rows() {
        let out = wrap_lines(&["a", "b", "c"], 2, 80, false);
        assert_eq!(out, vec!["a", "b"]);
    }

    #[test]
    fn wrap_counts_chars_not_bytes() {
        // 5 Cyrillic chars + space + 5 = 11 chars but 21 bytes
        let out = wrap_lines(&["абвгд еёжзи"], 1, 11, false);
        assert_eq!(out, vec!["абвгд еёжзи"]);
    }

    #[test]
    fn pack_fits_everything_on_first_line() {
        let list = vec!["Петров Пётр".to_string(), "Сидорова Анна".to_string()];
        assert_eq!(
            pack_names(&list, 60, 97),
            ("Петров Пётр, Сидорова Анна".to_string(), String::new())
        );
    }

    #[test]
    fn pack_overflow_ends_with_more_marker() {
        // 20 chars each: two on line one, four on line two, four left over
        let list = names(10, "Иванов Иван Иванович");
        let (first, second) = pack_names(&list, 60, 97);
        assert_eq!(char_len(&first), 42);
        assert!(second.ends_with(MORE_MARKER));
        assert_eq!(second.matches("Иванов").count(), 4);
        assert!(char_len(&second) <= 97);
    }

    #[test]
    fn pack_truncates_when_marker_does_not_fit() {
        // 30 chars each: one on line one, three on line two (94 chars)
        let list = names(6, "Константинопольский Аристархов");
        let (first, second) = pack_names(&list, 60, 97);
        assert_eq!(first, list[0]);
        assert!(second.ends_with(ELLIPSIS));
        assert!(!second.contains(MORE_MARKER));
        assert!(char_len(&second) <= 97);
    }

    #[test]
    fn pack_cuts_single_oversized_name() {
        let list = vec!["Ы".repeat(70)];
        let (first, second) = pack_names(&list, 60, 97);
        assert_eq!(char_len(&first), 60);
        assert!(first.ends_with(ELLIPSIS));
        assert!(second.is_empty());
    }
}
