use slate::backend::BackendError;
use slate::core::item::Item;
use slate::core::session::{AuthUser, Page};

/// The three live list containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    ActiveTasks,
    Notes,
    CompletedTasks,
}

impl ListKind {
    /// Name used in list-area error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ActiveTasks => "tasks",
            Self::Notes => "notes",
            Self::CompletedTasks => "task history",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    // Auth state (from the identity observer)
    AuthChanged(Option<AuthUser>),

    // Login form
    LoginEmailChanged(String),
    LoginPasswordChanged(String),
    SubmitLogin,

    // Register form
    RegisterNameChanged(String),
    RegisterEmailChanged(String),
    RegisterPasswordChanged(String),
    SubmitRegister,

    // Session
    EnterGuestMode,
    SignOut,

    // Navigation
    Navigate(Page),

    // Dashboard forms
    TaskInputChanged(String),
    SubmitTask,
    NoteInputChanged(String),
    SubmitNote,

    // Item actions
    AdvanceStatus(String),
    RequestDelete(String),
    ConfirmDelete,
    CancelDelete,

    // Live data
    Snapshot(ListKind, Result<Vec<Item>, BackendError>),

    // Profile
    ProfileNameChanged(String),
    SubmitProfileName,
    PhotoSelected(String, Vec<u8>),
}
