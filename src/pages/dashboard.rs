use slate::backend::BackendError;
use slate::core::item::Item;
use slate::core::session::Session;
use slate::render::{escape_html, render_list_error, render_note_list, render_task_list};

/// Dashboard: add forms plus the two live containers. Each container shows
/// its own data, placeholder, or error; one failing never blanks the other.
pub fn dashboard_view(
    session: &Session,
    tasks: &[Item],
    notes: &[Item],
    task_error: Option<&BackendError>,
    notes_error: Option<&BackendError>,
    notice: Option<&str>,
    task_input: &str,
    note_input: &str,
) -> String {
    let mut out = String::new();
    out.push_str("<section class=\"dashboard\">\n");
    out.push_str(&format!(
        "<h1>Welcome, <span id=\"user-name-display\">{}</span></h1>\n",
        escape_html(&session.display_name())
    ));
    if let Some(notice) = notice {
        out.push_str(&format!(
            "<div class=\"notice\">{}</div>\n",
            escape_html(notice)
        ));
    }

    out.push_str("<h2>Tasks</h2>\n<form id=\"addTaskForm\">\n");
    out.push_str(&format!(
        "  <input type=\"text\" id=\"taskInput\" value=\"{}\" placeholder=\"New task\">\n",
        escape_html(task_input)
    ));
    out.push_str("  <button type=\"submit\" class=\"btn btn-primary\">Add Task</button>\n</form>\n");
    out.push_str("<ul id=\"taskList\">\n");
    out.push_str(&match task_error {
        Some(error) => render_list_error("tasks", error),
        None => render_task_list(tasks),
    });
    out.push_str("</ul>\n");

    out.push_str("<h2>Notes</h2>\n<form id=\"addNoteForm\">\n");
    out.push_str(&format!(
        "  <input type=\"text\" id=\"noteInput\" value=\"{}\" placeholder=\"New note\">\n",
        escape_html(note_input)
    ));
    out.push_str("  <button type=\"submit\" class=\"btn btn-primary\">Add Note</button>\n</form>\n");
    out.push_str("<ul id=\"notesList\">\n");
    out.push_str(&match notes_error {
        Some(error) => render_list_error("notes", error),
        None => render_note_list(notes),
    });
    out.push_str("</ul>\n");

    out.push_str("</section>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use slate::core::item::ItemKind;
    use slate::core::session::{AuthUser, Session};

    fn session() -> Session {
        Session::Authenticated(AuthUser {
            uid: "u1".to_string(),
            email: "ann@x.com".to_string(),
            display_name: Some("Ann".to_string()),
            photo_url: None,
        })
    }

    #[test]
    fn empty_dashboard_shows_both_placeholders() {
        let html = dashboard_view(&session(), &[], &[], None, None, None, "", "");
        assert!(html.contains("No tasks yet. Add a task to get started!"));
        assert!(html.contains("No notes yet."));
        assert!(html.contains(">Ann</span>"));
    }

    #[test]
    fn one_failing_list_leaves_the_other_alone() {
        let note = Item {
            id: "n1".to_string(),
            owner_id: "u1".to_string(),
            kind: ItemKind::Note,
            content: "remember".to_string(),
            status: None,
            created_at: None,
        };
        let error = BackendError::IndexRequired("tasks index".to_string());
        let html = dashboard_view(
            &session(),
            &[],
            std::slice::from_ref(&note),
            Some(&error),
            None,
            None,
            "",
            "",
        );
        assert!(html.contains("needs a backend index"));
        assert!(html.contains("remember"));
    }
}
