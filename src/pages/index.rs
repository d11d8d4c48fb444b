use slate::core::session::Session;
use slate::render::escape_html;

/// Landing page. Which chrome shows depends only on whether a session (real
/// or guest) is active.
pub fn index_view(session: &Session) -> String {
    let mut out = String::new();
    out.push_str("<section class=\"landing\">\n<h1>Slate</h1>\n");
    out.push_str("<p>Your tasks and notes, in one place.</p>\n");
    if session.is_signed_in() {
        out.push_str(&format!(
            "<p class=\"auth-logged-in\">Signed in as {}</p>\n",
            escape_html(&session.display_name())
        ));
        out.push_str("<a class=\"btn btn-primary\" href=\"dashboard.html\">Open Dashboard</a>\n");
        out.push_str("<button class=\"btn btn-link\" data-action=\"logout\">Log Out</button>\n");
    } else {
        out.push_str("<a class=\"btn btn-primary auth-logged-out\" href=\"login.html\">Log In</a>\n");
        out.push_str("<a class=\"btn auth-logged-out\" href=\"register.html\">Register</a>\n");
    }
    out.push_str("</section>\n");
    out
}
