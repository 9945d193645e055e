//! Borrowing lifecycle service
//!
//! Drives the loan state machine across the catalogue and the user
//! registry: loan creation, return, due-date revision, and overdue
//! (re)detection with its notification side effect. All date comparisons
//! happen at calendar-date granularity.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        BorrowingRecord, LoanStatus, Notification, NotificationStatus, User, UserRecord,
    },
    session::Session,
    storage::{NotificationSender, RecordKind, Storage},
};

#[derive(Clone)]
pub struct LoansService {
    storage: Storage,
    notifier: Arc<dyn NotificationSender>,
    loan_days: i64,
}

impl LoansService {
    pub fn new(storage: Storage, notifier: Arc<dyn NotificationSender>, loan_days: i64) -> Self {
        Self {
            storage,
            notifier,
            loan_days,
        }
    }

    /// Today as a calendar date, time of day stripped
    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    /// Lend a book to a member
    ///
    /// The borrower must resolve to exactly one member by membership id:
    /// an unknown id is `NotFound`, an id held by more than one member is
    /// `Conflict`. A book that is not available is also rejected with
    /// `Conflict`, never double-lent.
    pub fn create_loan(
        &self,
        session: &mut Session,
        book_id: u32,
        membership_id: &str,
    ) -> AppResult<u32> {
        let member_id = match session.members_with_membership_id(membership_id).as_slice() {
            [] => {
                return Err(AppError::NotFound(format!(
                    "No member with membership id {}",
                    membership_id
                )))
            }
            [member] => member.user_id,
            _ => {
                return Err(AppError::Conflict(format!(
                    "Membership id {} is held by more than one member",
                    membership_id
                )))
            }
        };
        let book = session
            .catalogue
            .get(book_id)
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;
        if !book.availability {
            return Err(AppError::Conflict(format!(
                "Book {} is not available",
                book.title
            )));
        }

        let record_id = session.allocate_record_id();
        let borrow_date = Self::today();
        let record = BorrowingRecord {
            record_id,
            book_id,
            membership_id: membership_id.to_string(),
            borrow_date,
            due_date: borrow_date + Duration::days(self.loan_days),
            return_date: None,
            status: LoanStatus::OnLoan,
        };

        if let Some(book) = session.catalogue.get_mut(book_id) {
            book.availability = false;
        }
        if let Some(member) = session.member_by_membership_id_mut(membership_id) {
            member.borrow_book(book_id);
        }
        session.records.push(record);
        tracing::info!(record_id, book_id, member_id, "Loan created");
        self.persist_all(session);
        Ok(record_id)
    }

    /// Close a loan: the record becomes `Returned`, the book available,
    /// and the member's active-loan set no longer counts the book
    pub fn return_loan(&self, session: &mut Session, record_id: u32) -> AppResult<()> {
        let record = session
            .record_by_id_mut(record_id)
            .ok_or_else(|| AppError::NotFound(format!("Record with id {} not found", record_id)))?;
        if record.status == LoanStatus::Returned {
            return Err(AppError::InvariantViolation(format!(
                "Record {} was already returned",
                record_id
            )));
        }
        record.status = LoanStatus::Returned;
        record.return_date = Some(Self::today());
        let book_id = record.book_id;
        let membership_id = record.membership_id.clone();

        if let Some(book) = session.catalogue.get_mut(book_id) {
            book.availability = true;
        }
        if let Some(member) = session.member_by_membership_id_mut(&membership_id) {
            member.return_book(book_id);
        }
        tracing::info!(record_id, book_id, "Loan returned");
        self.persist_all(session);
        Ok(())
    }

    /// (Re)evaluate the overdue state of a record as of today
    ///
    /// Returns whether the record is overdue after evaluation. The
    /// `OnLoan -> Overdue` transition appends exactly one notification
    /// for the borrower and hands it to the delivery collaborator;
    /// re-checking an unchanged overdue record stays quiet, and a due
    /// date revised into the future reverts the record to `OnLoan`.
    pub fn check_overdue(&self, session: &mut Session, record_id: u32) -> AppResult<bool> {
        let today = Self::today();
        let record = session
            .record_by_id(record_id)
            .ok_or_else(|| AppError::NotFound(format!("Record with id {} not found", record_id)))?;

        match record.status {
            LoanStatus::Returned => Ok(false),
            LoanStatus::Overdue if record.due_date > today => {
                if let Some(record) = session.record_by_id_mut(record_id) {
                    record.status = LoanStatus::OnLoan;
                }
                tracing::debug!(record_id, "Overdue record reverted to on-loan");
                self.persist_records(session);
                Ok(false)
            }
            LoanStatus::Overdue => Ok(true),
            LoanStatus::OnLoan if record.due_date < today => {
                let days_late = (today - record.due_date).num_days();
                let book_title = session
                    .catalogue
                    .get(record.book_id)
                    .map(|book| book.title.clone());
                let borrower = session
                    .member_by_membership_id(&record.membership_id)
                    .cloned();
                if let Some(record) = session.record_by_id_mut(record_id) {
                    record.status = LoanStatus::Overdue;
                }
                tracing::info!(record_id, days_late, "Loan is overdue");
                // a record whose book or borrower no longer resolves still
                // transitions, it just has nobody to notify
                if let (Some(title), Some(borrower)) = (book_title, borrower) {
                    self.notify_overdue(session, &borrower, &title, days_late);
                }
                self.persist_records(session);
                Ok(true)
            }
            LoanStatus::OnLoan => Ok(false),
        }
    }

    fn notify_overdue(
        &self,
        session: &mut Session,
        borrower: &User,
        book_title: &str,
        days_late: i64,
    ) {
        let notification_id = session.allocate_notification_id();
        let message = format!(
            "Hi {}, You have an overdue book: {} that is {} days overdue.",
            borrower.name, book_title, days_late
        );
        session.notifications.push(Notification {
            notification_id,
            user_id: borrower.user_id,
            message: message.clone(),
            status: NotificationStatus::Created,
        });
        // fire-and-forget delivery; the log entry is Sent regardless
        self.notifier.send(borrower, &message);
        if let Some(notification) = session.notifications.last_mut() {
            notification.status = NotificationStatus::Sent;
        }
    }

    /// Replace the due date of an open record
    ///
    /// No ordering validation against the borrow date; confirming a date
    /// that is not in the future is the caller's concern. The new state
    /// takes effect at the next overdue evaluation.
    pub fn revise_due_date(
        &self,
        session: &mut Session,
        record_id: u32,
        new_due_date: NaiveDate,
    ) -> AppResult<()> {
        let record = session
            .record_by_id_mut(record_id)
            .ok_or_else(|| AppError::NotFound(format!("Record with id {} not found", record_id)))?;
        if record.status == LoanStatus::Returned {
            return Err(AppError::InvariantViolation(format!(
                "Record {} was already returned",
                record_id
            )));
        }
        record.due_date = new_due_date;
        tracing::debug!(record_id, %new_due_date, "Due date revised");
        self.persist_records(session);
        Ok(())
    }

    /// Rehydrate loan records from persisted snapshots
    ///
    /// A record only comes back when its book and borrower still resolve;
    /// the record counter ends up above every reloaded id.
    pub fn load_from_storage(&self, session: &mut Session) -> AppResult<usize> {
        let records: Vec<BorrowingRecord> = self.storage.load(RecordKind::LoanRecords)?;
        let mut loaded = 0;
        for record in records {
            session.note_record_id(record.record_id);
            let book_known = session.catalogue.get(record.book_id).is_some();
            let member_known = session
                .member_by_membership_id(&record.membership_id)
                .is_some();
            if book_known && member_known {
                session.records.push(record);
                loaded += 1;
            } else {
                tracing::warn!(
                    record_id = record.record_id,
                    "Skipping loan record with unresolvable book or borrower"
                );
            }
        }
        tracing::info!(loaded, "Loan records rehydrated");
        Ok(loaded)
    }

    fn persist_records(&self, session: &Session) {
        self.storage.save(RecordKind::LoanRecords, &session.records);
    }

    fn persist_all(&self, session: &Session) {
        self.storage
            .save(RecordKind::Books, session.catalogue.books());
        let users: Vec<UserRecord> = session.users.iter().map(UserRecord::from).collect();
        self.storage.save(RecordKind::Users, &users);
        self.persist_records(session);
    }
}
