use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::Category;

/// Expense ids are integer rowids assigned by the store.
pub type ExpenseId = i64;

/// Sentinel id meaning "not yet stored; let the store assign the next id".
pub const UNASSIGNED_ID: ExpenseId = 0;

/// A single expense entry.
///
/// The store enforces no business rules on these fields: titles may be
/// empty and amounts may be negative. Validation, if any, belongs to
/// the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub title: String,
    pub amount: f64,
    pub category: Category,
    pub date: NaiveDate,
}

impl Expense {
    /// Create a new, not-yet-stored expense dated today.
    pub fn new(title: impl Into<String>, amount: f64, category: Category) -> Self {
        Self {
            id: UNASSIGNED_ID,
            title: title.into(),
            amount,
            category,
            date: Local::now().date_naive(),
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn with_id(mut self, id: ExpenseId) -> Self {
        self.id = id;
        self
    }

    /// True when the store has not assigned an id yet.
    pub fn is_unassigned(&self) -> bool {
        self.id == UNASSIGNED_ID
    }
}
