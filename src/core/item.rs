use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical task statuses. Records written by older clients may carry
/// `"done"`, which means the same as `"completed"`.
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_DONE_LEGACY: &str = "done";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Task,
    Note,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Note => "note",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "task" => Some(Self::Task),
            "note" => Some(Self::Note),
            _ => None,
        }
    }
}

/// A task or note record owned by a user.
///
/// `status` is kept as the raw stored string: only tasks carry one, and the
/// classifier is deliberately permissive about unrecognized values.
/// `created_at` is `None` while the server-assigned timestamp is still
/// pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub owner_id: String,
    pub kind: ItemKind,
    pub content: String,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Item {
    pub fn is_task(&self) -> bool {
        self.kind == ItemKind::Task
    }

    pub fn is_note(&self) -> bool {
        self.kind == ItemKind::Note
    }
}

/// Display classification of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    ActiveTask,
    CompletedTask,
    Note,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub bucket: Bucket,
    /// Status badge text: the stored status, or "Pending" when unset.
    pub label: String,
    /// What `advance` would move the status to. `None` for notes.
    pub next_status: Option<String>,
    /// Advance-button caption. Empty for notes.
    pub action: &'static str,
}

pub fn classify(item: &Item) -> Classification {
    if item.is_note() {
        return Classification {
            bucket: Bucket::Note,
            label: String::new(),
            next_status: None,
            action: "",
        };
    }

    let status = item.status.as_deref();
    Classification {
        bucket: bucket_for_status(status),
        label: status_label(status),
        next_status: Some(advance(status)),
        action: action_label(status),
    }
}

/// Lifecycle bucket for a task status. Exactly the literals `"completed"` and
/// `"done"` count as completed; everything else, including missing or empty,
/// stays active.
pub fn bucket_for_status(status: Option<&str>) -> Bucket {
    match status {
        Some(STATUS_COMPLETED) | Some(STATUS_DONE_LEGACY) => Bucket::CompletedTask,
        _ => Bucket::ActiveTask,
    }
}

/// Status badge text: the stored value verbatim, or "Pending" when unset.
pub fn status_label(status: Option<&str>) -> String {
    match status {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => "Pending".to_string(),
    }
}

/// Advance-button caption: "Start" for a pending/unset task, "Mark Done"
/// for anything further along.
pub fn action_label(status: Option<&str>) -> &'static str {
    match status {
        None => "Start",
        Some("") | Some(STATUS_PENDING) => "Start",
        Some(_) => "Mark Done",
    }
}

/// Compute the next status in the cycle pending → in_progress → completed.
///
/// Matching is done on the lowercased value (missing treated as empty); the
/// legacy two-word form "in progress" also advances to completed. Any other
/// value, including a status that is already completed, is returned
/// unchanged, original casing preserved, so advancing a terminal task is a
/// no-op.
pub fn advance(status: Option<&str>) -> String {
    let raw = status.unwrap_or("");
    match raw.to_lowercase().as_str() {
        "" | STATUS_PENDING => STATUS_IN_PROGRESS.to_string(),
        STATUS_IN_PROGRESS | "in progress" => STATUS_COMPLETED.to_string(),
        _ => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(status: Option<&str>) -> Item {
        Item {
            id: "t1".to_string(),
            owner_id: "u1".to_string(),
            kind: ItemKind::Task,
            content: "Buy milk".to_string(),
            status: status.map(|s| s.to_string()),
            created_at: None,
        }
    }

    #[test]
    fn notes_are_never_task_bucketed() {
        let note = Item {
            id: "n1".to_string(),
            owner_id: "u1".to_string(),
            kind: ItemKind::Note,
            content: "remember".to_string(),
            status: Some(STATUS_COMPLETED.to_string()),
            created_at: None,
        };
        assert_eq!(classify(&note).bucket, Bucket::Note);
    }

    #[test]
    fn completed_and_legacy_done_bucket_completed() {
        assert_eq!(bucket_for_status(Some("completed")), Bucket::CompletedTask);
        assert_eq!(bucket_for_status(Some("done")), Bucket::CompletedTask);
    }

    #[test]
    fn other_statuses_bucket_active() {
        assert_eq!(bucket_for_status(None), Bucket::ActiveTask);
        assert_eq!(bucket_for_status(Some("")), Bucket::ActiveTask);
        assert_eq!(bucket_for_status(Some("pending")), Bucket::ActiveTask);
        assert_eq!(bucket_for_status(Some("in_progress")), Bucket::ActiveTask);
        // Case-sensitive: only the exact lowercase literals complete a task.
        assert_eq!(bucket_for_status(Some("Completed")), Bucket::ActiveTask);
        assert_eq!(bucket_for_status(Some("DONE")), Bucket::ActiveTask);
        assert_eq!(bucket_for_status(Some("blocked")), Bucket::ActiveTask);
    }

    #[test]
    fn advance_cycle() {
        assert_eq!(advance(Some("pending")), "in_progress");
        assert_eq!(advance(Some("in_progress")), "completed");
        assert_eq!(advance(Some("in progress")), "completed");
        assert_eq!(advance(Some("")), "in_progress");
        assert_eq!(advance(None), "in_progress");
        assert_eq!(advance(Some("completed")), "completed");
    }

    #[test]
    fn advance_is_idempotent_at_terminal() {
        let once = advance(Some("in_progress"));
        let twice = advance(Some(&once));
        assert_eq!(once, "completed");
        assert_eq!(twice, once);
    }

    #[test]
    fn advance_preserves_unrecognized_status() {
        assert_eq!(advance(Some("blocked")), "blocked");
        assert_eq!(advance(Some("Waiting")), "Waiting");
    }

    #[test]
    fn labels() {
        assert_eq!(status_label(None), "Pending");
        assert_eq!(status_label(Some("")), "Pending");
        assert_eq!(status_label(Some("in_progress")), "in_progress");
        assert_eq!(action_label(None), "Start");
        assert_eq!(action_label(Some("pending")), "Start");
        assert_eq!(action_label(Some("in_progress")), "Mark Done");
        assert_eq!(action_label(Some("completed")), "Mark Done");
    }

    #[test]
    fn classify_pending_task() {
        let c = classify(&task(None));
        assert_eq!(c.bucket, Bucket::ActiveTask);
        assert_eq!(c.label, "Pending");
        assert_eq!(c.next_status.as_deref(), Some("in_progress"));
        assert_eq!(c.action, "Start");
    }
}
