//! Text layout helpers for the card content block.
//!
//! SVG has no automatic line breaking, so verse text is wrapped up front using
//! an average glyph width estimate.

/// Average glyph advance as a fraction of the font size.
pub const AVG_GLYPH_WIDTH_EM: f32 = 0.5;

/// How many characters fit on a line of `width` pixels at `font_size`.
///
/// Always at least 1.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn chars_per_line(width: f32, font_size: f32) -> usize {
    if width <= 0.0 || font_size <= 0.0 {
        return 1;
    }
    ((width / (font_size * AVG_GLYPH_WIDTH_EM)).floor() as usize).max(1)
}

/// Greedy word wrap to at most `max_chars` characters per line.
///
/// Whitespace runs collapse to single spaces. Words longer than a line are
/// split across lines.
#[must_use]
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > max_chars {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        if word.is_empty() {
            continue;
        }

        let needed = if current_len == 0 {
            word.len()
        } else {
            current_len + 1 + word.len()
        };

        if needed > max_chars {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }

    if current_len > 0 {
        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_wraps_on_word_boundaries() {
        let lines = wrap_text("the quick brown fox jumps", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn test_splits_long_words() {
        let lines = wrap_text("abcdefghij xy", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij", "xy"]);
    }

    #[test]
    fn test_empty_text() {
        assert!(wrap_text("", 10).is_empty());
        assert!(wrap_text("   \n ", 10).is_empty());
    }

    #[test]
    fn test_chars_per_line() {
        assert_eq!(chars_per_line(200.0, 20.0), 20);
        assert_eq!(chars_per_line(0.0, 20.0), 1);
        assert_eq!(chars_per_line(5.0, 20.0), 1);
    }

    proptest! {
        #[test]
        fn wrapped_lines_respect_width(text in "[a-zA-Z ,.]{0,300}", width in 1usize..60) {
            for line in wrap_text(&text, width) {
                prop_assert!(line.chars().count() <= width);
                prop_assert!(!line.is_empty());
            }
        }

        #[test]
        fn wrapping_preserves_words(text in "[a-z]{1,8}( [a-z]{1,8}){0,30}", width in 8usize..40) {
            let joined = wrap_text(&text, width).join(" ");
            prop_assert_eq!(joined, text);
        }
    }
}
