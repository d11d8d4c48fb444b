use crate::backend::BackendError;
use crate::core::item::{action_label, status_label, Item};

use super::escape::escape_html;

pub const EMPTY_TASKS: &str = "No tasks yet. Add a task to get started!";
pub const EMPTY_NOTES: &str = "No notes yet.";
pub const EMPTY_COMPLETED: &str = "No completed tasks yet.";

/// Render the active-task list. Rows carry `data-action`/`data-id`
/// attributes for the host to bind; there are no inline handlers.
pub fn render_task_list(tasks: &[Item]) -> String {
    if tasks.is_empty() {
        return placeholder_row(EMPTY_TASKS);
    }

    let mut out = String::new();
    for task in tasks {
        let status = task.status.as_deref();
        out.push_str("<li class=\"task-item\">\n");
        out.push_str(&format!(
            "  <div class=\"task-content\"><span>{}</span><span class=\"status-badge\">{}</span></div>\n",
            escape_html(&task.content),
            escape_html(&status_label(status)),
        ));
        out.push_str("  <div class=\"task-actions\">\n");
        out.push_str(&format!(
            "    <button class=\"btn btn-sm btn-info\" data-action=\"advance\" data-id=\"{}\">{}</button>\n",
            escape_html(&task.id),
            action_label(status),
        ));
        out.push_str(&format!(
            "    <button class=\"btn btn-sm btn-danger\" data-action=\"delete\" data-id=\"{}\">Delete</button>\n",
            escape_html(&task.id),
        ));
        out.push_str("  </div>\n</li>\n");
    }
    out
}

/// Render the notes list. Notes expose delete only.
pub fn render_note_list(notes: &[Item]) -> String {
    if notes.is_empty() {
        return placeholder_row(EMPTY_NOTES);
    }

    let mut out = String::new();
    for note in notes {
        out.push_str(&format!(
            "<li class=\"note-item\"><span>{}</span><button class=\"btn btn-sm btn-danger\" data-action=\"delete\" data-id=\"{}\">Delete</button></li>\n",
            escape_html(&note.content),
            escape_html(&note.id),
        ));
    }
    out
}

/// Render the completed-task history. Rows carry a human-readable creation
/// date; a record whose server timestamp has not resolved shows "Just now".
pub fn render_completed_list(tasks: &[Item]) -> String {
    if tasks.is_empty() {
        return placeholder_row(EMPTY_COMPLETED);
    }

    let mut out = String::new();
    for task in tasks {
        let date = match task.created_at {
            Some(ts) => ts.format("%b %-d, %Y").to_string(),
            None => "Just now".to_string(),
        };
        out.push_str(&format!(
            "<li class=\"task-item completed\"><span>{}</span><span class=\"status-badge status-completed\">Completed</span><span class=\"task-date\">{}</span></li>\n",
            escape_html(&task.content),
            escape_html(&date),
        ));
    }
    out
}

/// Render a subscription failure into the affected list area. A missing
/// composite index gets its own message; everything else is generic. One
/// list failing never touches the other containers.
pub fn render_list_error(list: &str, error: &BackendError) -> String {
    let message = if error.is_index_required() {
        format!(
            "The {} view needs a backend index that has not been created yet.",
            list
        )
    } else {
        format!("Error loading {}.", list)
    };
    format!("<li class=\"error\">{}</li>\n", escape_html(&message))
}

fn placeholder_row(text: &str) -> String {
    format!("<li class=\"placeholder\">{}</li>\n", text)
}
