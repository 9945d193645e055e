//! Borrowing record model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Loan state machine states
///
/// `OnLoan -> Overdue` when the due date passes, `Overdue -> OnLoan` when
/// the due date is revised into the future, both into `Returned` which is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    OnLoan,
    Overdue,
    Returned,
}

/// One book-to-member lending transaction
///
/// The record references the book by catalogue id and the borrower by
/// membership id rather than holding entity copies; all dates are calendar
/// dates with the time of day stripped. Records are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorrowingRecord {
    pub record_id: u32,
    pub book_id: u32,
    pub membership_id: String,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<NaiveDate>,
    pub status: LoanStatus,
}

impl BorrowingRecord {
    /// An active record keeps its book unavailable
    pub fn is_active(&self) -> bool {
        matches!(self.status, LoanStatus::OnLoan | LoanStatus::Overdue)
    }
}
