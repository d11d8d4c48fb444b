use chrono::{DateTime, Utc};

use super::item::{classify, Bucket, Item};

/// The three display lists, each ordered newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectedLists {
    pub active_tasks: Vec<Item>,
    pub notes: Vec<Item>,
    pub completed_tasks: Vec<Item>,
}

/// Partition an unordered batch into the display lists for one user.
///
/// Items not owned by `for_user` are dropped even though the subscription
/// query already filters by owner; the client keeps its own check.
/// A record whose server timestamp is still pending sorts as newest.
pub fn project(items: &[Item], for_user: &str) -> ProjectedLists {
    let mut lists = ProjectedLists::default();

    for item in items {
        if item.owner_id != for_user {
            continue;
        }
        match classify(item).bucket {
            Bucket::ActiveTask => lists.active_tasks.push(item.clone()),
            Bucket::CompletedTask => lists.completed_tasks.push(item.clone()),
            Bucket::Note => lists.notes.push(item.clone()),
        }
    }

    sort_newest_first(&mut lists.active_tasks);
    sort_newest_first(&mut lists.notes);
    sort_newest_first(&mut lists.completed_tasks);

    lists
}

fn sort_newest_first(items: &mut [Item]) {
    items.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));
}

fn sort_key(item: &Item) -> DateTime<Utc> {
    item.created_at.unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::item::ItemKind;
    use chrono::TimeZone;

    fn item(id: &str, owner: &str, kind: ItemKind, status: Option<&str>, ts: Option<i64>) -> Item {
        Item {
            id: id.to_string(),
            owner_id: owner.to_string(),
            kind,
            content: format!("content {}", id),
            status: status.map(|s| s.to_string()),
            created_at: ts.map(|t| Utc.timestamp_opt(t, 0).unwrap()),
        }
    }

    #[test]
    fn partitions_by_kind_and_bucket() {
        let items = vec![
            item("a", "u1", ItemKind::Task, Some("pending"), Some(1)),
            item("b", "u1", ItemKind::Task, Some("completed"), Some(2)),
            item("c", "u1", ItemKind::Task, Some("done"), Some(3)),
            item("d", "u1", ItemKind::Note, None, Some(4)),
        ];
        let lists = project(&items, "u1");
        assert_eq!(lists.active_tasks.len(), 1);
        assert_eq!(lists.active_tasks[0].id, "a");
        assert_eq!(lists.completed_tasks.len(), 2);
        assert_eq!(lists.notes.len(), 1);
        assert_eq!(lists.notes[0].id, "d");
    }

    #[test]
    fn drops_foreign_items() {
        let items = vec![
            item("a", "u1", ItemKind::Task, None, Some(1)),
            item("b", "u2", ItemKind::Task, None, Some(2)),
            item("c", "u2", ItemKind::Note, None, Some(3)),
        ];
        let lists = project(&items, "u1");
        assert_eq!(lists.active_tasks.len(), 1);
        assert!(lists.notes.is_empty());
        assert!(lists.completed_tasks.is_empty());
    }

    #[test]
    fn orders_newest_first() {
        let items = vec![
            item("old", "u1", ItemKind::Task, None, Some(100)),
            item("new", "u1", ItemKind::Task, None, Some(300)),
            item("mid", "u1", ItemKind::Task, None, Some(200)),
        ];
        let lists = project(&items, "u1");
        let ids: Vec<&str> = lists.active_tasks.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["new", "mid", "old"]);
    }

    #[test]
    fn pending_timestamp_sorts_newest() {
        let items = vec![
            item("dated", "u1", ItemKind::Note, None, Some(100)),
            item("fresh", "u1", ItemKind::Note, None, None),
        ];
        let lists = project(&items, "u1");
        assert_eq!(lists.notes[0].id, "fresh");
    }

    #[test]
    fn empty_batch_projects_empty_lists() {
        let lists = project(&[], "u1");
        assert!(lists.active_tasks.is_empty());
        assert!(lists.notes.is_empty());
        assert!(lists.completed_tasks.is_empty());
    }
}
