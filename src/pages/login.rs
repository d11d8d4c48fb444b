use slate::render::escape_html;

pub fn login_view(email: &str, error: Option<&str>, loading: bool) -> String {
    let mut out = String::new();
    out.push_str("<section class=\"auth-page\">\n<h1>Log In</h1>\n");
    out.push_str(&auth_error_block(error));
    out.push_str(&loading_indicator(loading));
    out.push_str("<form id=\"login-form\">\n");
    out.push_str(&format!(
        "  <input type=\"email\" id=\"email\" value=\"{}\" placeholder=\"Email\">\n",
        escape_html(email)
    ));
    out.push_str("  <input type=\"password\" id=\"password\" placeholder=\"Password\">\n");
    out.push_str("  <button type=\"submit\" class=\"btn btn-primary\">Log In</button>\n");
    out.push_str("</form>\n");
    out.push_str("<button class=\"btn btn-link\" data-action=\"guest\">Continue as guest</button>\n");
    out.push_str("</section>\n");
    out
}

/// Inline auth error area; hidden when there is nothing to show.
pub fn auth_error_block(error: Option<&str>) -> String {
    match error {
        Some(message) => format!(
            "<div id=\"auth-error-message\" style=\"display:block\">{}</div>\n",
            escape_html(message)
        ),
        None => "<div id=\"auth-error-message\" style=\"display:none\"></div>\n".to_string(),
    }
}

pub fn loading_indicator(loading: bool) -> String {
    format!(
        "<div id=\"loading-indicator\" style=\"display:{}\">Loading…</div>\n",
        if loading { "block" } else { "none" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_is_shown_inline_and_escaped() {
        let html = login_view("ann@x.com", Some("User <not> found."), false);
        assert!(html.contains("display:block"));
        assert!(html.contains("User &lt;not&gt; found."));
        assert!(html.contains("value=\"ann@x.com\""));
    }

    #[test]
    fn loading_indicator_toggles() {
        assert!(login_view("", None, true).contains("id=\"loading-indicator\" style=\"display:block\""));
        assert!(login_view("", None, false).contains("id=\"loading-indicator\" style=\"display:none\""));
    }
}
