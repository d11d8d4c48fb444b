use slate::render::escape_html;

use super::login::{auth_error_block, loading_indicator};

pub fn register_view(name: &str, email: &str, error: Option<&str>, loading: bool) -> String {
    let mut out = String::new();
    out.push_str("<section class=\"auth-page\">\n<h1>Register</h1>\n");
    out.push_str(&auth_error_block(error));
    out.push_str(&loading_indicator(loading));
    out.push_str("<form id=\"register-form\">\n");
    out.push_str(&format!(
        "  <input type=\"text\" id=\"name\" value=\"{}\" placeholder=\"Name\">\n",
        escape_html(name)
    ));
    out.push_str(&format!(
        "  <input type=\"email\" id=\"email\" value=\"{}\" placeholder=\"Email\">\n",
        escape_html(email)
    ));
    out.push_str("  <input type=\"password\" id=\"password\" placeholder=\"Password\">\n");
    out.push_str("  <button type=\"submit\" class=\"btn btn-primary\">Create Account</button>\n");
    out.push_str("</form>\n</section>\n");
    out
}
