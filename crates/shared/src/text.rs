//! Fixed-width text helpers for plain-text exports.

/// Greedy word wrap.
///
/// Words are accumulated onto a line until adding the next word would exceed
/// `width` characters, then the line is broken. Lines only ever break on
/// whitespace, so a single word longer than `width` is emitted unbroken on its
/// own line. Embedded newlines start a new paragraph; blank paragraphs are
/// preserved as empty lines.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0usize;

        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if current.is_empty() {
                current.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len > width {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_len = word_len;
            } else {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
            }
        }

        lines.push(current);
    }

    lines
}

/// A line made of `width` repetitions of `ch`.
pub fn rule(ch: char, width: usize) -> String {
    std::iter::repeat(ch).take(width).collect()
}

/// Centers `text` within `width` columns (left-biased when uneven).
pub fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let pad = (width - len) / 2;
    format!("{}{}", " ".repeat(pad), text)
}
