use crate::error::ApiRequestError;

// cut the text to `max_chars` characters, marking the cut with "..."
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("{field} is too long (max {max} characters)")]
pub struct FieldTooLong {
    pub field: &'static str,
    pub max: usize,
}

impl ApiRequestError for FieldTooLong {}

// reject values longer than the column they are stored in
pub fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), FieldTooLong> {
    if value.chars().count() > max {
        return Err(FieldTooLong { field, max });
    }
    Ok(())
}

// split a separator-delimited field into trimmed, non-empty items
pub fn split_list(value: &str, separator: char) -> Vec<String> {
    value
        .split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

// escape LIKE wildcards so user input only matches literally
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

const MARKDOWN_SPECIAL_CHARS: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

// escape the characters Telegram's MarkdownV2 treats as markup
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || MARKDOWN_SPECIAL_CHARS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate_with_ellipsis("hello", 5), "hello");
        assert_eq!(truncate_with_ellipsis("hello!", 5), "hello...");
    }

    #[test]
    fn split_list_drops_blank_items() {
        assert_eq!(
            split_list(" Rust, Axum ,, Postgres ", ','),
            vec!["Rust", "Axum", "Postgres"]
        );
        assert_eq!(split_list("first\n\n second \n", '\n'), vec!["first", "second"]);
    }

    #[test]
    fn check_len_counts_characters() {
        assert_eq!(check_len("Author", "ёжик", 4), Ok(()));
        assert_eq!(
            check_len("Author", "ёжики", 4),
            Err(FieldTooLong {
                field: "Author",
                max: 4
            })
        );
    }

    #[test]
    fn escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn escape_markdown_escapes_markup() {
        assert_eq!(escape_markdown("v1.0 (beta)!"), "v1\\.0 \\(beta\\)\\!");
        assert_eq!(escape_markdown("snake_case"), "snake\\_case");
    }
}
