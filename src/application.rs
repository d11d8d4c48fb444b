use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use slate::backend::{ClientContext, DocumentStore, Identity, ItemQuery};
use slate::core::item::Item;
use slate::core::projection::project;
use slate::core::session::{page_access, resolve, Access, AuthUser, Page, Session};

use crate::message::{ListKind, Message};
use crate::pages;

/// The client application: all page state in one place, mutated only by
/// [`Message`]s. Backend calls are awaited inside the handler that triggered
/// them; snapshots and auth changes arrive as messages of their own.
pub struct App {
    ctx: Arc<ClientContext>,
    msg_tx: mpsc::UnboundedSender<Message>,

    pub page: Page,
    pub session: Session,

    // Login / register forms
    login_email: String,
    login_password: String,
    register_name: String,
    register_email: String,
    register_password: String,
    auth_error: Option<String>,
    loading: bool,

    // Dashboard
    task_input: String,
    note_input: String,
    tasks: Vec<Item>,
    notes: Vec<Item>,
    task_error: Option<slate::backend::BackendError>,
    notes_error: Option<slate::backend::BackendError>,
    dashboard_notice: Option<String>,

    // Task history
    completed: Vec<Item>,
    completed_error: Option<slate::backend::BackendError>,

    // Profile
    profile_name_input: String,
    profile_notice: Option<String>,

    // Pending destructive action; cleared on confirm or cancel
    pending_delete: Option<String>,

    subscriptions: Vec<JoinHandle<()>>,
}

impl App {
    pub fn new(ctx: Arc<ClientContext>, page: Page) -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let app = Self {
            ctx,
            msg_tx,
            page,
            session: Session::Unauthenticated,
            login_email: String::new(),
            login_password: String::new(),
            register_name: String::new(),
            register_email: String::new(),
            register_password: String::new(),
            auth_error: None,
            loading: false,
            task_input: String::new(),
            note_input: String::new(),
            tasks: Vec::new(),
            notes: Vec::new(),
            task_error: None,
            notes_error: None,
            dashboard_notice: None,
            completed: Vec::new(),
            completed_error: None,
            profile_name_input: String::new(),
            profile_notice: None,
            pending_delete: None,
            subscriptions: Vec::new(),
        };
        (app, msg_rx)
    }

    pub async fn update(&mut self, message: Message) {
        match message {
            Message::AuthChanged(user) => self.apply_auth(user),

            Message::LoginEmailChanged(v) => self.login_email = v,
            Message::LoginPasswordChanged(v) => self.login_password = v,
            Message::SubmitLogin => {
                self.auth_error = None;
                self.loading = true;
                let (email, password) = (self.login_email.clone(), self.login_password.clone());
                match self.ctx.sign_in(&email, &password).await {
                    Ok(user) => {
                        self.login_password.clear();
                        self.apply_auth(Some(user));
                    }
                    Err(e) => {
                        self.auth_error = Some(e.user_message());
                        self.loading = false;
                    }
                }
            }

            Message::RegisterNameChanged(v) => self.register_name = v,
            Message::RegisterEmailChanged(v) => self.register_email = v,
            Message::RegisterPasswordChanged(v) => self.register_password = v,
            Message::SubmitRegister => {
                self.auth_error = None;
                self.loading = true;
                let (name, email, password) = (
                    self.register_name.clone(),
                    self.register_email.clone(),
                    self.register_password.clone(),
                );
                match self.ctx.register(&name, &email, &password).await {
                    Ok(user) => {
                        self.register_password.clear();
                        self.apply_auth(Some(user));
                    }
                    Err(e) => {
                        self.auth_error = Some(e.user_message());
                        self.loading = false;
                    }
                }
            }

            Message::EnterGuestMode => {
                self.ctx.enter_guest_mode();
                self.apply_auth(self.ctx.identity.current_user());
            }
            Message::SignOut => {
                self.ctx.sign_out().await;
                self.apply_auth(None);
                self.navigate(Page::Index);
            }

            Message::Navigate(page) => self.navigate(page),

            Message::TaskInputChanged(v) => self.task_input = v,
            Message::SubmitTask => {
                let content = self.task_input.clone();
                match self.ctx.add_task(&content).await {
                    Ok(_) => {
                        self.task_input.clear();
                        self.dashboard_notice = None;
                    }
                    Err(e) => {
                        log::warn!("Failed to add task: {}", e);
                        self.dashboard_notice = Some(e.user_message());
                    }
                }
            }
            Message::NoteInputChanged(v) => self.note_input = v,
            Message::SubmitNote => {
                let content = self.note_input.clone();
                match self.ctx.add_note(&content).await {
                    Ok(_) => {
                        self.note_input.clear();
                        self.dashboard_notice = None;
                    }
                    Err(e) => {
                        log::warn!("Failed to add note: {}", e);
                        self.dashboard_notice = Some(e.user_message());
                    }
                }
            }

            Message::AdvanceStatus(id) => {
                let Some(item) = self.tasks.iter().find(|i| i.id == id).cloned() else {
                    log::debug!("Advance for unknown item {}", id);
                    return;
                };
                match self.ctx.advance_item(&item).await {
                    Ok(_) => self.dashboard_notice = None,
                    Err(e) => {
                        log::warn!("Failed to advance {}: {}", id, e);
                        self.dashboard_notice = Some(e.user_message());
                    }
                }
            }
            Message::RequestDelete(id) => self.pending_delete = Some(id),
            Message::ConfirmDelete => {
                if let Some(id) = self.pending_delete.take() {
                    match self.ctx.delete_item(&id).await {
                        Ok(()) => self.dashboard_notice = None,
                        Err(e) => {
                            log::warn!("Failed to delete {}: {}", id, e);
                            self.dashboard_notice = Some(e.user_message());
                        }
                    }
                }
            }
            Message::CancelDelete => self.pending_delete = None,

            Message::Snapshot(kind, result) => self.apply_snapshot(kind, result),

            Message::ProfileNameChanged(v) => self.profile_name_input = v,
            Message::SubmitProfileName => {
                let Some(user) = self.session.user().cloned() else {
                    return;
                };
                let input = self.profile_name_input.clone();
                match self.ctx.update_profile_name(&user, &input).await {
                    Ok(None) => {} // blank submission, nothing happened
                    Ok(Some(updated)) => {
                        self.profile_notice = Some("Profile updated!".to_string());
                        self.session = Session::Authenticated(updated);
                    }
                    Err(e) => {
                        log::warn!("Profile name update failed: {}", e);
                        self.profile_notice = Some(e.user_message());
                    }
                }
            }
            Message::PhotoSelected(filename, bytes) => {
                if filename.is_empty() || bytes.is_empty() {
                    return; // no file selected
                }
                let Some(user) = self.session.user().cloned() else {
                    return;
                };
                let content_type = content_type_for(&filename).to_string();
                match self
                    .ctx
                    .update_profile_photo(&user, &filename, bytes, &content_type)
                    .await
                {
                    Ok(updated) => {
                        self.profile_notice = Some("Profile updated!".to_string());
                        self.session = Session::Authenticated(updated);
                    }
                    Err(e) => {
                        log::warn!("Profile photo update failed: {}", e);
                        self.profile_notice = Some(e.user_message());
                    }
                }
            }
        }
    }

    /// React to an auth-state change: resolve the session, move the
    /// subscriptions to match it, and apply the access rule for the current
    /// page. Guests never get subscriptions.
    fn apply_auth(&mut self, user: Option<AuthUser>) {
        let session = resolve(user, self.ctx.guest.is_set());
        let changed = session != self.session;
        self.session = session;
        self.loading = false;

        if changed {
            self.stop_subscriptions();
            if let Session::Authenticated(user) = &self.session {
                let uid = user.uid.clone();
                self.profile_name_input = user.display_name.clone().unwrap_or_default();
                self.start_subscriptions(uid);
            }
        }

        match page_access(&self.session, self.page) {
            Access::Allow => {}
            Access::RedirectToDashboard => self.navigate(Page::Dashboard),
            Access::RedirectToLogin => self.navigate(Page::Login),
        }
    }

    fn navigate(&mut self, page: Page) {
        let target = match page_access(&self.session, page) {
            Access::Allow => page,
            Access::RedirectToDashboard => Page::Dashboard,
            Access::RedirectToLogin => Page::Login,
        };
        if target != self.page {
            log::info!("Navigating to {}", target.file_name());
        }
        self.page = target;
    }

    fn start_subscriptions(&mut self, uid: String) {
        let queries = [
            (ListKind::ActiveTasks, ItemQuery::tasks(uid.clone())),
            (ListKind::Notes, ItemQuery::notes(uid.clone())),
            (ListKind::CompletedTasks, ItemQuery::completed_tasks(uid)),
        ];
        for (kind, query) in queries {
            let mut rx = self.ctx.store.subscribe(query);
            let tx = self.msg_tx.clone();
            self.subscriptions.push(tokio::spawn(async move {
                while let Some(snapshot) = rx.recv().await {
                    if tx.send(Message::Snapshot(kind, snapshot)).is_err() {
                        break;
                    }
                }
            }));
        }
    }

    fn stop_subscriptions(&mut self) {
        for handle in self.subscriptions.drain(..) {
            handle.abort();
        }
        self.tasks.clear();
        self.notes.clear();
        self.completed.clear();
        self.task_error = None;
        self.notes_error = None;
        self.completed_error = None;
    }

    fn apply_snapshot(
        &mut self,
        kind: ListKind,
        result: Result<Vec<Item>, slate::backend::BackendError>,
    ) {
        let Some(user) = self.session.user() else {
            // Stale delivery after sign-out; the containers are already clear.
            return;
        };
        let uid = user.uid.clone();

        match result {
            Ok(batch) => {
                let lists = project(&batch, &uid);
                match kind {
                    ListKind::ActiveTasks => {
                        self.tasks = lists.active_tasks;
                        self.task_error = None;
                    }
                    ListKind::Notes => {
                        self.notes = lists.notes;
                        self.notes_error = None;
                    }
                    ListKind::CompletedTasks => {
                        self.completed = lists.completed_tasks;
                        self.completed_error = None;
                    }
                }
            }
            Err(e) => {
                log::error!("Subscription for {} failed: {}", kind.label(), e);
                match kind {
                    ListKind::ActiveTasks => self.task_error = Some(e),
                    ListKind::Notes => self.notes_error = Some(e),
                    ListKind::CompletedTasks => self.completed_error = Some(e),
                }
            }
        }
    }

    /// Render the current page.
    pub fn view(&self) -> String {
        match self.page {
            Page::Index => pages::index::index_view(&self.session),
            Page::Login => pages::login::login_view(
                &self.login_email,
                self.auth_error.as_deref(),
                self.loading,
            ),
            Page::Register => pages::register::register_view(
                &self.register_name,
                &self.register_email,
                self.auth_error.as_deref(),
                self.loading,
            ),
            Page::Dashboard => pages::dashboard::dashboard_view(
                &self.session,
                &self.tasks,
                &self.notes,
                self.task_error.as_ref(),
                self.notes_error.as_ref(),
                self.dashboard_notice.as_deref(),
                &self.task_input,
                &self.note_input,
            ),
            Page::TaskHistory => {
                pages::history::history_view(&self.completed, self.completed_error.as_ref())
            }
            Page::Profile => pages::profile::profile_view(
                &self.session,
                &self.profile_name_input,
                self.profile_notice.as_deref(),
            ),
        }
    }

    /// Interactive console loop: stdin commands on one side, auth changes and
    /// snapshots on the other.
    pub async fn run_console(mut self, mut msg_rx: mpsc::UnboundedReceiver<Message>) {
        let mut auth_rx = self.ctx.identity.observe();
        let initial = auth_rx.borrow_and_update().clone();
        self.update(Message::AuthChanged(initial)).await;

        println!("slate console. Type 'help' for commands.");
        println!("{}", self.view());

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                changed = auth_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let user = auth_rx.borrow_and_update().clone();
                    self.update(Message::AuthChanged(user)).await;
                }
                message = msg_rx.recv() => {
                    let Some(message) = message else { break };
                    self.update(message).await;
                }
                line = lines.next_line() => {
                    let Ok(Some(line)) = line else { break };
                    if !self.handle_command(line.trim()).await {
                        break;
                    }
                }
            }
        }
    }

    /// Returns false when the console should exit.
    async fn handle_command(&mut self, line: &str) -> bool {
        let (command, rest) = match line.split_once(' ') {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "quit" | "exit" => return false,
            "help" => print_help(),
            "show" => println!("{}", self.view()),
            "page" => {
                match Page::ALL.iter().find(|p| {
                    p.file_name().trim_end_matches(".html") == rest || p.file_name() == rest
                }) {
                    Some(page) => {
                        self.update(Message::Navigate(*page)).await;
                        println!("{}", self.view());
                    }
                    None => println!("unknown page: {}", rest),
                }
            }
            "login" => match rest.split_once(' ') {
                Some((email, password)) => {
                    self.update(Message::LoginEmailChanged(email.to_string())).await;
                    self.update(Message::LoginPasswordChanged(password.trim().to_string()))
                        .await;
                    self.update(Message::SubmitLogin).await;
                    println!("{}", self.view());
                }
                None => println!("usage: login <email> <password>"),
            },
            "register" => {
                let mut parts = rest.splitn(3, ' ');
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(name), Some(email), Some(password)) => {
                        self.update(Message::RegisterNameChanged(name.to_string())).await;
                        self.update(Message::RegisterEmailChanged(email.to_string())).await;
                        self.update(Message::RegisterPasswordChanged(password.to_string()))
                            .await;
                        self.update(Message::SubmitRegister).await;
                        println!("{}", self.view());
                    }
                    _ => println!("usage: register <name> <email> <password>"),
                }
            }
            "guest" => {
                self.update(Message::EnterGuestMode).await;
                println!("{}", self.view());
            }
            "logout" => {
                self.update(Message::SignOut).await;
                println!("{}", self.view());
            }
            "task" => {
                self.update(Message::TaskInputChanged(rest.to_string())).await;
                self.update(Message::SubmitTask).await;
            }
            "note" => {
                self.update(Message::NoteInputChanged(rest.to_string())).await;
                self.update(Message::SubmitNote).await;
            }
            "advance" => self.update(Message::AdvanceStatus(rest.to_string())).await,
            "delete" => {
                self.update(Message::RequestDelete(rest.to_string())).await;
                println!("about to delete {}: type 'confirm' or 'cancel'", rest);
            }
            "confirm" => self.update(Message::ConfirmDelete).await,
            "cancel" => self.update(Message::CancelDelete).await,
            "name" => {
                self.update(Message::ProfileNameChanged(rest.to_string())).await;
                self.update(Message::SubmitProfileName).await;
                println!("{}", self.view());
            }
            "photo" => match tokio::fs::read(rest).await {
                Ok(bytes) => {
                    let filename = rest
                        .rsplit('/')
                        .next()
                        .unwrap_or(rest)
                        .to_string();
                    self.update(Message::PhotoSelected(filename, bytes)).await;
                    println!("{}", self.view());
                }
                Err(e) => println!("cannot read {}: {}", rest, e),
            },
            other => println!("unknown command: {} (try 'help')", other),
        }
        true
    }
}

fn content_type_for(filename: &str) -> &'static str {
    match filename.rsplit('.').next() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

fn print_help() {
    println!(
        "commands:\n  register <name> <email> <password>\n  login <email> <password>\n  guest | logout\n  page <index|login|register|dashboard|task_history|profile>\n  task <content> | note <content>\n  advance <id> | delete <id> | confirm | cancel\n  name <display name> | photo <file path>\n  show | help | quit"
    );
}
