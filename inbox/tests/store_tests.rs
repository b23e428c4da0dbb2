use chrono::Utc;
use corelib::models::{Category, Notification, NotificationDraft, NotificationId, Priority};
use inbox::{NotificationAction, NotificationState, NotificationStore, STORE_CAPACITY};
use proptest::prelude::*;

fn mk_notification(title: &str) -> Notification {
    Notification::from_draft(
        NotificationDraft::new(Category::Price, Priority::Medium, title, "body"),
        Utc::now(),
    )
}

#[derive(Debug, Clone)]
enum Op {
    Admit,
    AdmitMany(usize),
    MarkRead(usize),
    MarkAllRead,
    Remove(usize),
    ClearAll,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => Just(Op::Admit),
        2 => (0usize..8).prop_map(Op::AdmitMany),
        4 => any::<usize>().prop_map(Op::MarkRead),
        1 => Just(Op::MarkAllRead),
        2 => any::<usize>().prop_map(Op::Remove),
        1 => Just(Op::ClearAll),
    ]
}

fn pick(store: &NotificationStore, idx: usize) -> Option<NotificationId> {
    if store.is_empty() {
        return None;
    }
    store.iter().nth(idx % store.len()).map(|n| n.id.clone())
}

proptest! {
    #[test]
    fn unread_counter_matches_full_scan(ops in prop::collection::vec(op_strategy(), 1..250)) {
        let mut store = NotificationStore::default();

        for op in ops {
            match op {
                Op::Admit => {
                    store.admit(mk_notification("p"));
                }
                Op::AdmitMany(n) => {
                    store.admit_many((0..n).map(|_| mk_notification("b")).collect());
                }
                Op::MarkRead(i) => {
                    if let Some(id) = pick(&store, i) {
                        store.mark_read(&id);
                    }
                }
                Op::MarkAllRead => {
                    store.mark_all_read();
                }
                Op::Remove(i) => {
                    if let Some(id) = pick(&store, i) {
                        store.remove(&id);
                    }
                }
                Op::ClearAll => store.clear_all(),
            }

            prop_assert_eq!(store.unread_count(), store.recount());
            prop_assert!(store.len() <= STORE_CAPACITY);
        }
    }
}

#[test]
fn hundred_and_five_admissions_keep_the_newest_hundred() {
    let mut store = NotificationStore::default();
    for i in 0..105 {
        store.admit(mk_notification(&format!("n{i}")));
    }

    assert_eq!(store.len(), 100);
    assert_eq!(store.unread_count(), 100);
    assert_eq!(store.iter().next().map(|n| n.title.as_str()), Some("n104"));
    assert_eq!(store.iter().last().map(|n| n.title.as_str()), Some("n5"));
}

#[test]
fn mark_read_is_idempotent() {
    let mut store = NotificationStore::default();
    let n = mk_notification("once");
    let id = n.id.clone();
    store.admit(n);
    store.admit(mk_notification("other"));

    assert!(store.mark_read(&id));
    assert!(!store.mark_read(&id));
    assert_eq!(store.unread_count(), 1);
    assert!(!store.mark_read(&NotificationId::new("missing")));
}

#[test]
fn admit_many_puts_last_element_first() {
    let mut store = NotificationStore::default();
    store.admit(mk_notification("old"));

    store.admit_many(vec![
        mk_notification("a"),
        mk_notification("b"),
        mk_notification("c"),
    ]);

    let titles: Vec<&str> = store.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["c", "b", "a", "old"]);
    assert_eq!(store.unread_count(), 4);
}

#[test]
fn admit_many_evicts_in_one_pass() {
    let mut store = NotificationStore::default();
    for i in 0..98 {
        store.admit(mk_notification(&format!("n{i}")));
    }

    let evicted = store.admit_many((0..5).map(|i| mk_notification(&format!("b{i}"))).collect());

    assert_eq!(evicted.len(), 3);
    assert_eq!(store.len(), 100);
    assert_eq!(store.unread_count(), store.recount());
}

#[test]
fn reducer_mark_all_read_then_remove() {
    let mut state = NotificationState::default();
    let first = mk_notification("first");
    let first_id = first.id.clone();
    state.reduce(NotificationAction::Add(first));
    state.reduce(NotificationAction::Add(mk_notification("second")));

    state.reduce(NotificationAction::MarkAllRead);
    assert_eq!(state.unread_count(), 0);

    state.reduce(NotificationAction::Remove(first_id));
    assert_eq!(state.store().len(), 1);
    assert_eq!(state.unread_count(), 0);

    state.reduce(NotificationAction::ClearAll);
    assert!(state.store().is_empty());
}
