/// Escape a user-supplied string for interpolation into markup.
///
/// Every interpolated value in the renderer goes through this; item content
/// is free text and must never reach the page as raw markup.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_all_metacharacters() {
        assert_eq!(
            escape_html(r#"<b>&"it's"</b>"#),
            "&lt;b&gt;&amp;&quot;it&#39;s&quot;&lt;/b&gt;"
        );
    }

    #[test]
    fn ampersand_first_no_double_escape() {
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
    }

    #[test]
    fn plain_text_unchanged() {
        assert_eq!(escape_html("Buy milk"), "Buy milk");
    }
}
