//! Text helpers for text and emoji layers

/// Greedy word wrap into lines of at most `width` characters.
///
/// Whitespace runs collapse to one space and words longer than a line are
/// broken across lines.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        if current_len > 0 && current_len + 1 + word.len() <= width {
            current.push(' ');
            current.extend(word.iter());
            current_len += 1 + word.len();
            continue;
        }
        if current_len > 0 {
            lines.push(std::mem::take(&mut current));
        }
        while word.len() > width {
            let rest = word.split_off(width);
            lines.push(word.iter().collect());
            word = rest;
        }
        current.extend(word.iter());
        current_len = word.len();
    }
    if current_len > 0 {
        lines.push(current);
    }
    lines
}

/// Replacement shown for text that is not an emoji
pub const FALLBACK_EMOJI: &str = "\u{1F198}";

fn is_emoji_char(c: char) -> bool {
    matches!(c as u32,
        0x1F000..=0x1FAFF
        | 0x2600..=0x27BF
        | 0x2300..=0x23FF
        | 0x2B00..=0x2BFF
        | 0x3030 | 0x303D | 0x3297 | 0x3299
        | 0x00A9 | 0x00AE | 0x203C | 0x2049 | 0x2122 | 0x2139
        | 0x2194..=0x21AA
    )
}

fn is_emoji_modifier(c: char) -> bool {
    matches!(c as u32,
        0x200D              // zero width joiner
        | 0xFE0E | 0xFE0F   // variation selectors
        | 0x20E3            // keycap
        | 0xE0020..=0xE007F // tags
    )
}

/// Whether `text` is a single emoji or an emoji sequence
pub fn is_emoji(text: &str) -> bool {
    text.chars().any(is_emoji_char)
        && text.chars().all(|c| is_emoji_char(c) || is_emoji_modifier(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_greedy() {
        assert_eq!(
            wrap("the quick brown fox jumps", 10),
            vec!["the quick", "brown fox", "jumps"]
        );
    }

    #[test]
    fn test_wrap_breaks_long_words() {
        assert_eq!(wrap("abcdefgh ij", 3), vec!["abc", "def", "gh", "ij"]);
    }

    #[test]
    fn test_wrap_collapses_whitespace() {
        assert_eq!(wrap("  a \n\t b  ", 10), vec!["a b"]);
        assert!(wrap("   ", 5).is_empty());
    }

    #[test]
    fn test_is_emoji() {
        assert!(is_emoji("\u{1F600}"));
        assert!(is_emoji("\u{2764}\u{FE0F}"));
        assert!(is_emoji("\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}"));
        assert!(!is_emoji("a"));
        assert!(!is_emoji("\u{1F600}a"));
        assert!(!is_emoji(""));
        assert!(!is_emoji("\u{FE0F}"));
    }
}
