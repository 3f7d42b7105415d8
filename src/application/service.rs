use tokio::sync::watch;

use crate::domain::{CategoryTotal, Expense, ExpenseId};
use crate::storage::LedgerStore;

use super::LedgerError;

/// Application service providing high-level operations over the ledger.
/// This is the primary interface for any client (CLI, TUI, etc.): a
/// thin facade that forwards to the store, adding no validation of its
/// own. Construct one explicitly and pass it by reference to whatever
/// needs it.
pub struct LedgerService {
    store: LedgerStore,
}

impl LedgerService {
    /// Create a service over an already-connected store.
    pub fn new(store: LedgerStore) -> Self {
        Self { store }
    }

    /// Initialize a database at the given path (created if missing).
    pub async fn init(database_path: &str) -> Result<Self, LedgerError> {
        Ok(Self::new(LedgerStore::init(database_path).await?))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}", database_path);
        Ok(Self::new(LedgerStore::connect(&db_url).await?))
    }

    /// Record an expense. An unassigned id is filled in by the store;
    /// an existing id replaces that record in place.
    pub async fn add_expense(&self, expense: Expense) -> Result<Expense, LedgerError> {
        self.store.upsert(&expense).await
    }

    /// Remove an expense. Removing a record that is not stored is a
    /// silent no-op.
    pub async fn remove_expense(&self, expense: &Expense) -> Result<(), LedgerError> {
        self.store.delete(expense).await
    }

    /// All expenses, most recent date first.
    pub async fn list_expenses(&self) -> Result<Vec<Expense>, LedgerError> {
        self.store.list().await
    }

    /// Look up a single expense by id.
    pub async fn get_expense(&self, id: ExpenseId) -> Result<Option<Expense>, LedgerError> {
        self.store.get(id).await
    }

    /// Sum of all recorded amounts; 0 when the ledger is empty.
    pub async fn total(&self) -> Result<f64, LedgerError> {
        self.store.total().await
    }

    /// Per-category totals for categories with recorded expenses.
    pub async fn totals_by_category(&self) -> Result<Vec<CategoryTotal>, LedgerError> {
        self.store.totals_by_category().await
    }

    /// Live view of the full expense list.
    pub fn subscribe_expenses(&self) -> watch::Receiver<Vec<Expense>> {
        self.store.subscribe_all()
    }

    /// Live view of the grand total.
    pub fn subscribe_total(&self) -> watch::Receiver<f64> {
        self.store.subscribe_total()
    }

    /// Live view of the per-category totals.
    pub fn subscribe_totals_by_category(&self) -> watch::Receiver<Vec<CategoryTotal>> {
        self.store.subscribe_totals_by_category()
    }
}
