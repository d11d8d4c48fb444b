pub mod escape;
pub mod lists;

pub use escape::escape_html;
pub use lists::{
    render_completed_list, render_list_error, render_note_list, render_task_list,
};
