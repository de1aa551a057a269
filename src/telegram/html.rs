//! HTML parse-mode helpers.
//!
//! All outgoing rich text uses `ParseMode::Html`; user-controlled strings
//! (titles, error text) must pass through [`escape`] before interpolation.

/// Escapes the three characters HTML parse mode treats specially
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

pub fn bold(text: &str) -> String {
    format!("<b>{}</b>", text)
}

pub fn italic(text: &str) -> String {
    format!("<i>{}</i>", text)
}

pub fn code(text: &str) -> String {
    format!("<code>{}</code>", escape(text))
}

pub fn link(url: &str, label: &str) -> String {
    format!("<a href=\"{}\">{}</a>", url, escape(label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape_order_does_not_double_escape() {
        assert_eq!(escape("a < b & c > d"), "a &lt; b &amp; c &gt; d");
        assert_eq!(escape("&lt;"), "&amp;lt;");
    }

    #[test]
    fn test_code_escapes_content() {
        assert_eq!(code("Vec<u8>"), "<code>Vec&lt;u8&gt;</code>");
    }

    #[test]
    fn test_link() {
        assert_eq!(
            link("https://example.com", "A & B"),
            "<a href=\"https://example.com\">A &amp; B</a>"
        );
    }
}
