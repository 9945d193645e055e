//! Session: the process-wide aggregate root
//!
//! One `Session` is constructed per process run and rehydrated from the
//! storage collaborator before first use. It exclusively owns the
//! catalogue, the user collection, the loan-record log, the notification
//! log, the currently authenticated user, and the id counters. Services
//! take it by `&mut`, which is what keeps mutation single-writer.

use crate::models::{BorrowingRecord, Catalogue, Notification, User, UserKind};

/// First id handed out for borrowing records
pub const START_BORROW_RECORD_ID: u32 = 5000;
/// First id handed out for users; offset keeps allocated ids clear of the
/// small ids used by seeded accounts
pub const START_USER_ID: u32 = 100_000;
/// The privileged seed identity reconciled in place during bulk loads
pub const SEED_USER_ID: u32 = 1;

#[derive(Debug)]
pub struct Session {
    pub catalogue: Catalogue,
    pub users: Vec<User>,
    pub records: Vec<BorrowingRecord>,
    pub notifications: Vec<Notification>,
    /// Id of the currently authenticated user, if any. Storing the id
    /// rather than a copy keeps the reference valid across updates.
    pub logged_in_user: Option<u32>,
    next_user_id: u32,
    next_record_id: u32,
    next_notification_id: u32,
}

impl Session {
    pub fn new() -> Self {
        Self {
            catalogue: Catalogue::new(),
            users: Vec::new(),
            records: Vec::new(),
            notifications: Vec::new(),
            logged_in_user: None,
            next_user_id: START_USER_ID,
            next_record_id: START_BORROW_RECORD_ID,
            next_notification_id: 0,
        }
    }

    /// The user with the given id, when exactly one exists
    pub fn user_by_id(&self, user_id: u32) -> Option<&User> {
        let mut matches = self.users.iter().filter(|user| user.user_id == user_id);
        match (matches.next(), matches.next()) {
            (Some(user), None) => Some(user),
            _ => None,
        }
    }

    pub fn user_by_id_mut(&mut self, user_id: u32) -> Option<&mut User> {
        let mut indices = self
            .users
            .iter()
            .enumerate()
            .filter(|(_, user)| user.user_id == user_id)
            .map(|(i, _)| i);
        match (indices.next(), indices.next()) {
            (Some(i), None) => self.users.get_mut(i),
            _ => None,
        }
    }

    /// The user with the given email, when exactly one exists
    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        let mut matches = self.users.iter().filter(|user| user.email == email);
        match (matches.next(), matches.next()) {
            (Some(user), None) => Some(user),
            _ => None,
        }
    }

    /// All members holding the given membership id, in registry order.
    /// Loan creation distinguishes "no holder" from "ambiguous holder"
    /// through the length of this list.
    pub fn members_with_membership_id(&self, membership_id: &str) -> Vec<&User> {
        self.users
            .iter()
            .filter(|user| {
                matches!(&user.kind, UserKind::Member { membership_id: m, .. } if m == membership_id)
            })
            .collect()
    }

    /// The member with the given membership id, when exactly one exists
    pub fn member_by_membership_id(&self, membership_id: &str) -> Option<&User> {
        match self.members_with_membership_id(membership_id).as_slice() {
            [user] => Some(user),
            _ => None,
        }
    }

    pub fn member_by_membership_id_mut(&mut self, membership_id: &str) -> Option<&mut User> {
        let mut indices = self
            .users
            .iter()
            .enumerate()
            .filter(|(_, user)| {
                matches!(&user.kind, UserKind::Member { membership_id: m, .. } if m == membership_id)
            })
            .map(|(i, _)| i);
        match (indices.next(), indices.next()) {
            (Some(i), None) => self.users.get_mut(i),
            _ => None,
        }
    }

    pub fn record_by_id(&self, record_id: u32) -> Option<&BorrowingRecord> {
        self.records.iter().find(|r| r.record_id == record_id)
    }

    pub fn record_by_id_mut(&mut self, record_id: u32) -> Option<&mut BorrowingRecord> {
        self.records.iter_mut().find(|r| r.record_id == record_id)
    }

    /// The currently authenticated user, if any
    pub fn logged_in_user(&self) -> Option<&User> {
        self.logged_in_user.and_then(|id| self.user_by_id(id))
    }

    /// Notification log entries addressed to the given user, oldest first
    pub fn notifications_for(&self, user_id: u32) -> Vec<&Notification> {
        self.notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .collect()
    }

    /// Allocate the next user id, skipping any id already in use
    pub fn allocate_user_id(&mut self) -> u32 {
        loop {
            let id = self.next_user_id;
            self.next_user_id += 1;
            if self.user_by_id(id).is_none() {
                return id;
            }
        }
    }

    /// Make sure the counter will never re-issue an id seen in storage
    pub fn note_user_id(&mut self, user_id: u32) {
        self.next_user_id = self.next_user_id.max(user_id + 1).max(START_USER_ID);
    }

    pub fn allocate_record_id(&mut self) -> u32 {
        let id = self.next_record_id;
        self.next_record_id += 1;
        id
    }

    pub fn note_record_id(&mut self, record_id: u32) {
        self.next_record_id = self
            .next_record_id
            .max(record_id + 1)
            .max(START_BORROW_RECORD_ID);
    }

    pub fn allocate_notification_id(&mut self) -> u32 {
        let id = self.next_notification_id;
        self.next_notification_id += 1;
        id
    }

    /// Reset the user-id counter, used when the registry is cleared
    pub fn reset_user_counter(&mut self) {
        self.next_user_id = START_USER_ID;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_exactly_one_semantics() {
        let mut session = Session::new();
        session.users.push(User::new_member(
            100000,
            "Ada",
            "ada@example.org",
            "hash",
            "42",
            BTreeSet::new(),
        ));
        session.users.push(User::new_member(
            100001,
            "Bob",
            "bob@example.org",
            "hash",
            "42",
            BTreeSet::new(),
        ));
        // duplicated membership id resolves to nobody
        assert!(session.member_by_membership_id("42").is_none());
        assert!(session.user_by_id(100000).is_some());
    }

    #[test]
    fn test_user_id_allocation_skips_used_ids() {
        let mut session = Session::new();
        session.users.push(User::new_librarian(
            START_USER_ID,
            "x",
            "x@example.org",
            "hash",
        ));
        let id = session.allocate_user_id();
        assert_eq!(id, START_USER_ID + 1);
    }

    #[test]
    fn test_counters_never_reuse_reloaded_ids() {
        let mut session = Session::new();
        session.note_record_id(7000);
        assert_eq!(session.allocate_record_id(), 7001);
        session.note_user_id(5);
        // stays above the fixed offset even for small stored ids
        assert_eq!(session.allocate_user_id(), START_USER_ID);
    }
}
