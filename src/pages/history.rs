use slate::backend::BackendError;
use slate::core::item::Item;
use slate::render::{render_completed_list, render_list_error};

pub fn history_view(completed: &[Item], error: Option<&BackendError>) -> String {
    let mut out = String::new();
    out.push_str("<section class=\"task-history\">\n<h1>Task History</h1>\n");
    out.push_str("<ul id=\"completedTasksList\">\n");
    out.push_str(&match error {
        Some(error) => render_list_error("task history", error),
        None => render_completed_list(completed),
    });
    out.push_str("</ul>\n</section>\n");
    out
}
