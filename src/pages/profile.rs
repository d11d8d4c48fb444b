use slate::core::session::Session;
use slate::render::escape_html;

/// Profile page: current photo, name/email form, photo upload form. The
/// email is read-only; there is no change-email operation.
pub fn profile_view(session: &Session, name_input: &str, notice: Option<&str>) -> String {
    let user = session.user();
    let email = user.map(|u| u.email.as_str()).unwrap_or("");
    let photo = user.and_then(|u| u.photo_url.as_deref());

    let mut out = String::new();
    out.push_str("<section class=\"profile\">\n<h1>Profile</h1>\n");
    if let Some(notice) = notice {
        out.push_str(&format!(
            "<div class=\"notice\">{}</div>\n",
            escape_html(notice)
        ));
    }
    if let Some(photo) = photo {
        out.push_str(&format!(
            "<img class=\"profile-photo\" src=\"{}\" alt=\"Profile photo\">\n",
            escape_html(photo)
        ));
    }

    out.push_str("<form id=\"profileForm\">\n");
    out.push_str(&format!(
        "  <input type=\"text\" id=\"name\" value=\"{}\" placeholder=\"Display name\">\n",
        escape_html(name_input)
    ));
    out.push_str(&format!(
        "  <input type=\"email\" id=\"email\" value=\"{}\" readonly>\n",
        escape_html(email)
    ));
    out.push_str("  <button type=\"submit\" class=\"btn btn-primary\">Save</button>\n</form>\n");

    out.push_str("<form id=\"imageUploadForm\">\n");
    out.push_str("  <input type=\"file\" id=\"profileImage\" accept=\"image/*\">\n");
    out.push_str("  <button type=\"submit\" class=\"btn\">Upload Photo</button>\n</form>\n");
    out.push_str("</section>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use slate::core::session::AuthUser;

    #[test]
    fn shows_photo_and_prefilled_fields() {
        let session = Session::Authenticated(AuthUser {
            uid: "u1".to_string(),
            email: "ann@x.com".to_string(),
            display_name: Some("Ann".to_string()),
            photo_url: Some("https://img.example/a.png".to_string()),
        });
        let html = profile_view(&session, "Ann", Some("Profile updated!"));
        assert!(html.contains("src=\"https://img.example/a.png\""));
        assert!(html.contains("value=\"Ann\""));
        assert!(html.contains("value=\"ann@x.com\" readonly"));
        assert!(html.contains("Profile updated!"));
    }
}
