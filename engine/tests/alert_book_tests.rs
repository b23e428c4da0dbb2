#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use corelib::models::{AlertCondition, Category, NotificationDraft, PriceAlert, Priority};
    use corelib::storage::{KeyValueStore, MemoryStore, StorageError, load_json};
    use engine::alerts::{ALERTS_KEY, DEFAULT_SYMBOL};
    use engine::{AlertError, IngestEvent, LocalProducer, PriceAlertBook};
    use parking_lot::Mutex;
    use tokio::sync::mpsc;

    fn mk_book() -> (PriceAlertBook, Arc<MemoryStore>, mpsc::Receiver<IngestEvent>) {
        let storage = Arc::new(MemoryStore::new());
        let (tx, rx) = mpsc::channel(32);
        let book = PriceAlertBook::load(storage.clone(), LocalProducer::new(tx));
        (book, storage, rx)
    }

    fn next_draft(rx: &mut mpsc::Receiver<IngestEvent>) -> NotificationDraft {
        match rx.try_recv() {
            Ok(IngestEvent::Local(draft)) => draft,
            other => panic!("expected a local draft, got {other:?}"),
        }
    }

    #[test]
    fn invalid_price_announces_and_stores_nothing() {
        let (mut book, storage, mut rx) = mk_book();

        for bad in ["", "  ", "ten", "NaN"] {
            let err = book.create("ETH", AlertCondition::Above, bad).unwrap_err();
            assert!(matches!(err, AlertError::InvalidPrice(_)));

            let draft = next_draft(&mut rx);
            assert_eq!(draft.category, Category::System);
            assert_eq!(draft.priority, Priority::Low);
            assert_eq!(draft.title, "Invalid Price");
            assert_eq!(draft.body, "Please enter a valid target price");
        }

        assert!(book.alerts().is_empty());
        assert_eq!(storage.get(ALERTS_KEY).unwrap(), None);
    }

    #[test]
    fn create_prepends_persists_and_announces() {
        let (mut book, storage, mut rx) = mk_book();

        let first = book.create("ETH", AlertCondition::Above, "3500").unwrap();
        let second = book.create("", AlertCondition::Below, "0.25").unwrap();

        assert_eq!(second.symbol, DEFAULT_SYMBOL);
        assert!(second.is_active);
        let ids: Vec<&str> = book.alerts().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, [second.id.as_str(), first.id.as_str()]);

        let stored: Vec<PriceAlert> = load_json(storage.as_ref(), ALERTS_KEY).unwrap().unwrap();
        assert_eq!(stored, book.alerts());

        let draft = next_draft(&mut rx);
        assert_eq!(draft.category, Category::Price);
        assert_eq!(draft.priority, Priority::Low);
        assert_eq!(draft.title, "Price Alert Created");
        assert_eq!(draft.body, "Alert set for ETH above $3500");
        assert_eq!(next_draft(&mut rx).body, "Alert set for BTM below $0.25");
    }

    #[test]
    fn toggle_and_delete() {
        let (mut book, storage, mut rx) = mk_book();
        let alert = book.create("ETH", AlertCondition::Above, "3500").unwrap();
        let _ = next_draft(&mut rx);

        assert!(!book.toggle(&alert.id).unwrap());
        assert!(book.toggle(&alert.id).unwrap());
        assert!(rx.try_recv().is_err(), "toggling is silent");

        let removed = book.delete(&alert.id).unwrap();
        assert_eq!(removed.id, alert.id);
        assert!(book.alerts().is_empty());
        let stored: Vec<PriceAlert> = load_json(storage.as_ref(), ALERTS_KEY).unwrap().unwrap();
        assert!(stored.is_empty());

        let draft = next_draft(&mut rx);
        assert_eq!(draft.category, Category::System);
        assert_eq!(draft.title, "Alert Deleted");
        assert_eq!(draft.body, "Price alert has been removed");

        assert!(matches!(book.toggle(&alert.id), Err(AlertError::NotFound(_))));
        assert!(matches!(book.delete(&alert.id), Err(AlertError::NotFound(_))));
    }

    #[test]
    fn test_fire_is_high_priority_and_flagged() {
        let (mut book, _, mut rx) = mk_book();
        let alert = book.create("SOL", AlertCondition::Below, "120").unwrap();
        let _ = next_draft(&mut rx);

        book.test_fire(&alert.id).unwrap();

        let draft = next_draft(&mut rx);
        assert_eq!(draft.priority, Priority::High);
        assert_eq!(draft.title, "Price Alert: SOL");
        assert_eq!(draft.body, "SOL is now below $120 (Test Alert)");
        let meta = draft.metadata.unwrap();
        assert_eq!(meta["isTest"], true);
        assert_eq!(meta["alert"]["id"], alert.id.as_str());
    }

    #[test]
    fn reload_restores_alerts_and_tolerates_corruption() {
        let (mut book, storage, _rx) = mk_book();
        book.create("ETH", AlertCondition::Above, "3500").unwrap();

        let (tx, _rx2) = mpsc::channel(4);
        let reloaded = PriceAlertBook::load(storage.clone(), LocalProducer::new(tx.clone()));
        assert_eq!(reloaded.alerts(), book.alerts());

        storage.set(ALERTS_KEY, "[{broken").unwrap();
        let fresh = PriceAlertBook::load(storage, LocalProducer::new(tx));
        assert!(fresh.alerts().is_empty());
    }

    /// Reads from an inner store; writes fail while `writable` is off.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        writable: Mutex<bool>,
    }

    impl FlakyStore {
        fn set_writable(&self, writable: bool) {
            *self.writable.lock() = writable;
        }

        fn check(&self) -> Result<(), StorageError> {
            if *self.writable.lock() {
                return Ok(());
            }
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.check()?;
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.check()?;
            self.inner.remove(key)
        }
    }

    #[test]
    fn failed_write_leaves_book_unchanged() {
        let storage = Arc::new(FlakyStore::default());
        let (tx, mut rx) = mpsc::channel(8);
        let mut book = PriceAlertBook::load(storage.clone(), LocalProducer::new(tx));

        assert!(matches!(
            book.create("ETH", AlertCondition::Above, "4000"),
            Err(AlertError::Storage(_))
        ));
        assert!(book.alerts().is_empty());
        assert!(rx.try_recv().is_err(), "nothing announced for a failed create");

        storage.set_writable(true);
        let alert = book.create("SOL", AlertCondition::Below, "120").unwrap();
        let _ = next_draft(&mut rx);
        let stored: Vec<PriceAlert> = load_json(storage.as_ref(), ALERTS_KEY).unwrap().unwrap();
        assert_eq!(stored.len(), 1, "the failed alert never reaches disk later");
        storage.set_writable(false);

        assert!(book.toggle(&alert.id).is_err());
        assert!(book.alerts()[0].is_active);

        assert!(book.delete(&alert.id).is_err());
        assert_eq!(book.alerts().len(), 1);
        assert!(rx.try_recv().is_err(), "nothing announced for a failed delete");
    }
}
