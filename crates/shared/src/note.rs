/// Rich note attached to a marker, held as a sanitized HTML fragment.
///
/// Scripts, event handler attributes and unsafe URLs are stripped on
/// construction, so a note is always safe to render. An absent note and an
/// empty one are the same thing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Note(String);

impl Note {
    pub fn new(html: impl Into<String>) -> Self {
        let html = html.into();
        if html.is_empty() {
            return Note(html);
        }
        Note(ammonia::clean(&html))
    }

    pub fn html(&self) -> &str {
        &self.0
    }

    /// True when the rendered text has anything besides whitespace.
    pub fn has_text(&self) -> bool {
        !text_content(&self.0).trim().is_empty()
    }
}

impl From<String> for Note {
    fn from(html: String) -> Self {
        Note::new(html)
    }
}

/// A `<` only opens markup when followed by a tag name, `/`, `!` or `?`.
fn opens_tag(rest: &str) -> bool {
    matches!(rest[1..].chars().next(), Some(c) if c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
}

/// Text a browser would render for `html`: tags dropped, common entities decoded.
pub fn text_content(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(ch) = rest.chars().next() {
        match ch {
            '<' if opens_tag(rest) => match rest.find('>') {
                Some(end) => rest = &rest[end + 1..],
                // Unterminated tag renders as text
                None => {
                    out.push_str(rest);
                    break;
                }
            },
            '&' => {
                let (decoded, consumed) = decode_entity(rest);
                out.push_str(&decoded);
                rest = &rest[consumed..];
            }
            _ => {
                out.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }
    out
}

fn decode_entity(s: &str) -> (String, usize) {
    let Some(semi) = s.find(';').filter(|&i| i <= 10) else {
        return ("&".to_string(), 1);
    };
    let name = &s[1..semi];
    let decoded = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => name
            .strip_prefix("#x")
            .or_else(|| name.strip_prefix("#X"))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .or_else(|| name.strip_prefix('#').and_then(|dec| dec.parse().ok()))
            .and_then(char::from_u32),
    };
    match decoded {
        Some(c) => (c.to_string(), semi + 1),
        None => ("&".to_string(), 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_note_has_no_text() {
        assert!(!Note::default().has_text());
        assert!(!Note::new("").has_text());
    }

    #[test]
    fn test_whitespace_only_note_has_no_text() {
        assert!(!Note::new("   \n\t").has_text());
        assert!(!Note::new("<p> </p><br>").has_text());
        assert!(!Note::new("<div>&nbsp;</div>").has_text());
    }

    #[test]
    fn test_markup_with_text_has_text() {
        assert!(Note::new("<p>hi</p>").has_text());
        assert!(Note::new("plain").has_text());
        assert!(Note::new("<b>&amp;</b>").has_text());
    }

    #[test]
    fn test_text_content_strips_tags_and_decodes() {
        assert_eq!(text_content("<h1>A &lt;b&gt;</h1>"), "A <b>");
        assert_eq!(text_content("x &#65;&#x42; y"), "x AB y");
        assert_eq!(text_content("fish & chips"), "fish & chips");
    }

    #[test]
    fn test_text_content_keeps_unterminated_tag() {
        assert_eq!(text_content("a < b"), "a < b");
        assert_eq!(text_content("a <b"), "a <b");
    }

    #[test]
    fn test_bare_angle_brackets_are_text() {
        assert_eq!(text_content("1 < 2 > 0"), "1 < 2 > 0");
        assert_eq!(text_content("<>"), "<>");
        assert_eq!(text_content("a <3 b</p>"), "a <3 b");
        assert_eq!(text_content("x<!-- c -->y"), "xy");
    }

    #[test]
    fn test_event_handlers_are_stripped() {
        let note = Note::new(r#"<p>hi</p><img src="x.png" onerror="alert(1)">"#);
        assert!(!note.html().contains("onerror"));
        assert!(!note.html().contains("alert"));
        assert!(note.html().contains("<img"));
        assert!(note.html().contains("<p>hi</p>"));
    }

    #[test]
    fn test_scripts_and_js_urls_are_stripped() {
        let note = Note::from(r#"<script>alert(1)</script><a href="javascript:alert(1)">go</a>"#.to_string());
        assert!(!note.html().contains("<script"));
        assert!(!note.html().contains("javascript:"));
        assert!(note.has_text());
    }

    #[test]
    fn test_sanitizing_is_stable() {
        let once = Note::new(r#"<h1>T</h1><a href="https://example.com">l</a><ol><li>a</li></ol><hr>"#);
        let twice = Note::new(once.html());
        assert_eq!(once, twice);
    }
}
