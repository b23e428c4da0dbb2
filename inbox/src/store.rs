//! Capped, newest-first notification list.
//!
//! The unread counter is maintained on every transition; [`NotificationStore::recount`]
//! is the full scan used to check it.

use std::collections::VecDeque;

use corelib::models::{Notification, NotificationId};

pub const STORE_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct NotificationStore {
    items: VecDeque<Notification>,
    unread: usize,
    capacity: usize,
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::with_capacity(STORE_CAPACITY)
    }
}

impl NotificationStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity + 1),
            unread: 0,
            capacity,
        }
    }

    /// Prepends one record. Returns whatever fell off the tail.
    pub fn admit(&mut self, notification: Notification) -> Vec<Notification> {
        if !notification.is_read {
            self.unread += 1;
        }
        self.items.push_front(notification);
        self.evict()
    }

    /// Prepends a batch so that its last element ends up at the front.
    pub fn admit_many(&mut self, batch: Vec<Notification>) -> Vec<Notification> {
        for notification in batch {
            if !notification.is_read {
                self.unread += 1;
            }
            self.items.push_front(notification);
        }
        self.evict()
    }

    fn evict(&mut self) -> Vec<Notification> {
        if self.items.len() <= self.capacity {
            return Vec::new();
        }
        let evicted: Vec<Notification> = self.items.drain(self.capacity..).collect();
        self.unread -= evicted.iter().filter(|n| !n.is_read).count();
        evicted
    }

    /// Returns true only when the record flipped from unread to read.
    pub fn mark_read(&mut self, id: &NotificationId) -> bool {
        match self.items.iter_mut().find(|n| &n.id == id) {
            Some(n) if !n.is_read => {
                n.is_read = true;
                self.unread -= 1;
                true
            }
            _ => false,
        }
    }

    /// Marks everything read in place. Returns how many records changed.
    pub fn mark_all_read(&mut self) -> usize {
        let changed = self.unread;
        for n in self.items.iter_mut() {
            n.is_read = true;
        }
        self.unread = 0;
        changed
    }

    pub fn remove(&mut self, id: &NotificationId) -> Option<Notification> {
        let idx = self.items.iter().position(|n| &n.id == id)?;
        let removed = self.items.remove(idx)?;
        if !removed.is_read {
            self.unread -= 1;
        }
        Some(removed)
    }

    pub fn clear_all(&mut self) {
        self.items.clear();
        self.unread = 0;
    }

    pub fn unread_count(&self) -> usize {
        self.unread
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, id: &NotificationId) -> Option<&Notification> {
        self.items.iter().find(|n| &n.id == id)
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    /// Full scan of unread records.
    pub fn recount(&self) -> usize {
        self.items.iter().filter(|n| !n.is_read).count()
    }
}
