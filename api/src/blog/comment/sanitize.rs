use std::collections::{HashMap, HashSet};

use linkify::{LinkFinder, LinkKind};

use super::CommentError;

/// Limit on submitted comment text, counted before sanitizing.
pub const MAX_CONTENT_CHARS: usize = 2000;

const ALLOWED_TAGS: [&str; 8] = ["b", "i", "u", "em", "strong", "a", "code", "pre"];

fn cleaner() -> ammonia::Builder<'static> {
    let mut builder = ammonia::Builder::empty();
    builder
        .tags(HashSet::from(ALLOWED_TAGS))
        .tag_attributes(HashMap::from([("a", HashSet::from(["href", "title"]))]))
        .url_schemes(HashSet::from(["http", "https", "mailto"]))
        .link_rel(Some("nofollow"))
        .clean_content_tags(HashSet::from(["script", "style"]));
    builder
}

/// Cleans user supplied comment HTML down to the allowed inline markup and
/// turns bare URLs into links.
pub fn sanitize_comment(raw: &str) -> Result<String, CommentError> {
    if raw.chars().count() > MAX_CONTENT_CHARS {
        return Err(CommentError::ContentTooLong {
            max: MAX_CONTENT_CHARS,
        });
    }

    let cleaner = cleaner();
    let cleaned = cleaner.clean(raw.trim()).to_string();
    // the second pass adds rel and drops links with disallowed schemes
    let linked = cleaner.clean(&linkify(&cleaned)).to_string();
    let content = linked.trim().to_string();

    if content.is_empty() {
        return Err(CommentError::EmptyContent);
    }

    Ok(content)
}

/// Wraps URLs found in text nodes outside of existing anchors.
/// Expects serialized HTML, so text never contains a raw `<`.
fn linkify(html: &str) -> String {
    let mut finder = LinkFinder::new();
    finder.kinds(&[LinkKind::Url]).url_must_have_scheme(false);

    let mut out = String::with_capacity(html.len());
    let mut anchor_depth = 0usize;
    let mut rest = html;

    while !rest.is_empty() {
        if rest.starts_with('<') {
            let end = tag_end(rest);
            let tag = &rest[..end];
            if tag.starts_with("<a ") || tag == "<a>" {
                anchor_depth += 1;
            } else if tag.starts_with("</a") {
                anchor_depth = anchor_depth.saturating_sub(1);
            }
            out.push_str(tag);
            rest = &rest[end..];
            continue;
        }

        let end = rest.find('<').unwrap_or(rest.len());
        let text = &rest[..end];
        if anchor_depth == 0 {
            link_text(&finder, text, &mut out);
        } else {
            out.push_str(text);
        }
        rest = &rest[end..];
    }

    out
}

// byte length of the tag at the start of `html`, quotes respected
fn tag_end(html: &str) -> usize {
    let mut quote: Option<char> = None;
    for (idx, c) in html.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return idx + 1,
            _ => {}
        }
    }
    html.len()
}

fn link_text(finder: &LinkFinder, text: &str, out: &mut String) {
    for span in finder.spans(text) {
        match span.kind() {
            Some(LinkKind::Url) => {
                let url = span.as_str();
                let href = if url.contains("://") || url.starts_with("mailto:") {
                    url.to_string()
                } else {
                    format!("http://{url}")
                };
                out.push_str(&format!("<a href=\"{href}\">{url}</a>"));
            }
            _ => out.push_str(span.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_is_removed_with_its_content() {
        assert_eq!(
            sanitize_comment("<script>alert(1)</script>Hi").unwrap(),
            "Hi"
        );
    }

    #[test]
    fn allowed_tags_survive() {
        assert_eq!(
            sanitize_comment("<b>bold</b> and <code>x</code>").unwrap(),
            "<b>bold</b> and <code>x</code>"
        );
    }

    #[test]
    fn unknown_tags_and_attributes_are_stripped() {
        assert_eq!(
            sanitize_comment("<div onclick=\"x()\"><b style=\"color:red\">t</b></div>").unwrap(),
            "<b>t</b>"
        );
    }

    #[test]
    fn links_get_nofollow() {
        assert_eq!(
            sanitize_comment("<a href=\"https://a.example\" target=\"_blank\">x</a>").unwrap(),
            "<a href=\"https://a.example\" rel=\"nofollow\">x</a>"
        );
    }

    #[test]
    fn javascript_links_lose_href() {
        let content = sanitize_comment("<a href=\"javascript:alert(1)\">x</a>").unwrap();

        assert!(!content.contains("javascript"));
        assert!(content.ends_with(">x</a>"));
    }

    #[test]
    fn bare_urls_are_linked() {
        let content = sanitize_comment("see https://www.rust-lang.org now").unwrap();

        assert_eq!(
            content,
            "see <a href=\"https://www.rust-lang.org\" rel=\"nofollow\">https://www.rust-lang.org</a> now"
        );
    }

    #[test]
    fn schemeless_urls_get_http() {
        let content = sanitize_comment("visit www.example.com today").unwrap();

        assert!(content.contains("href=\"http://www.example.com\""));
    }

    #[test]
    fn existing_anchors_are_not_linked_twice() {
        let content =
            sanitize_comment("<a href=\"https://a.example\">https://a.example</a>").unwrap();

        assert_eq!(content.matches("<a ").count(), 1);
    }

    #[test]
    fn empty_after_cleaning_is_rejected() {
        assert!(matches!(
            sanitize_comment("<script>x</script>   "),
            Err(CommentError::EmptyContent)
        ));
        assert!(matches!(sanitize_comment(""), Err(CommentError::EmptyContent)));
    }

    #[test]
    fn overlong_input_is_rejected() {
        let raw = "a".repeat(MAX_CONTENT_CHARS + 1);

        assert!(matches!(
            sanitize_comment(&raw),
            Err(CommentError::ContentTooLong { .. })
        ));
        assert!(sanitize_comment(&"a".repeat(MAX_CONTENT_CHARS)).is_ok());
    }
}
