use chrono::{Datelike, NaiveDate};
use sqlx::{Row, SqlitePool};
use tokio::sync::{Mutex, watch};

use crate::application::LedgerError;
use crate::domain::{Category, CategoryTotal, Expense, ExpenseId};

use super::MIGRATION_001_INITIAL;

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_CE_DAYS: i64 = 719_163;

/// Durable store for expense records with live query subscriptions.
///
/// Three queries are kept live: the full record list (date descending),
/// the grand total, and the per-category totals. Each is republished on
/// every successful mutation through a `watch` channel, so subscribers
/// always hold a current value and are woken on change. Slow readers
/// may skip intermediate states; the last value they see always matches
/// the final durable state.
///
/// Mutations are serialized through an internal lock held across the
/// write and the republish, so published snapshots reflect a single
/// consistent order of applied writes.
pub struct LedgerStore {
    pool: SqlitePool,
    write_lock: Mutex<()>,
    all_tx: watch::Sender<Vec<Expense>>,
    total_tx: watch::Sender<f64>,
    by_category_tx: watch::Sender<Vec<CategoryTotal>>,
}

impl LedgerStore {
    /// Connect to a SQLite database at the given URL, run migrations and
    /// seed the live queries with the current durable state.
    pub async fn connect(database_url: &str) -> Result<Self, LedgerError> {
        let pool = SqlitePool::connect(database_url)
            .await
            .map_err(LedgerError::storage("opening the database"))?;

        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&pool)
            .await
            .map_err(LedgerError::storage("running migration 001"))?;

        let (all_tx, _) = watch::channel(Vec::new());
        let (total_tx, _) = watch::channel(0.0);
        let (by_category_tx, _) = watch::channel(Vec::new());

        let store = Self {
            pool,
            write_lock: Mutex::new(()),
            all_tx,
            total_tx,
            by_category_tx,
        };
        store.refresh().await?;
        Ok(store)
    }

    /// Open (creating if necessary) a database file at the given path.
    pub async fn init(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        Self::connect(&db_url).await
    }

    // ========================
    // Mutations
    // ========================

    /// Insert the expense, or replace the row sharing its id.
    ///
    /// An unassigned id (0) means "assign the next rowid"; the returned
    /// record carries the assigned id. The write is durable before this
    /// returns, and all live queries have been republished. No field
    /// validation happens here.
    pub async fn upsert(&self, expense: &Expense) -> Result<Expense, LedgerError> {
        let _guard = self.write_lock.lock().await;

        // Bind NULL for the sentinel id so SQLite picks the next rowid.
        let id = (!expense.is_unassigned()).then_some(expense.id);

        let result = sqlx::query(
            r#"
            INSERT OR REPLACE INTO expense (id, title, amount, category, date)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(&expense.title)
        .bind(expense.amount)
        .bind(expense.category.as_str())
        .bind(epoch_day(expense.date))
        .execute(&self.pool)
        .await
        .map_err(LedgerError::storage("saving the expense"))?;

        let mut stored = expense.clone();
        if stored.is_unassigned() {
            stored.id = result.last_insert_rowid();
        }

        self.refresh().await?;
        Ok(stored)
    }

    /// Delete the row matching the expense's id. Deleting an id that is
    /// not stored is a no-op, not an error.
    pub async fn delete(&self, expense: &Expense) -> Result<(), LedgerError> {
        let _guard = self.write_lock.lock().await;

        sqlx::query("DELETE FROM expense WHERE id = ?")
            .bind(expense.id)
            .execute(&self.pool)
            .await
            .map_err(LedgerError::storage("deleting the expense"))?;

        self.refresh().await
    }

    // ========================
    // Live queries
    // ========================

    /// Subscribe to the full expense list, ordered by date descending
    /// (ties broken by id descending, newest insertion first).
    pub fn subscribe_all(&self) -> watch::Receiver<Vec<Expense>> {
        self.all_tx.subscribe()
    }

    /// Subscribe to the sum of all amounts. Exactly 0 when empty.
    pub fn subscribe_total(&self) -> watch::Receiver<f64> {
        self.total_tx.subscribe()
    }

    /// Subscribe to per-category totals. Only categories with at least
    /// one record appear; an emptied category disappears from the next
    /// emission rather than showing a zero.
    pub fn subscribe_totals_by_category(&self) -> watch::Receiver<Vec<CategoryTotal>> {
        self.by_category_tx.subscribe()
    }

    /// Re-evaluate all three queries and publish fresh snapshots.
    async fn refresh(&self) -> Result<(), LedgerError> {
        let expenses = self.fetch_all().await?;
        let total = self.fetch_total().await?;
        let by_category = self.fetch_totals_by_category().await?;

        // Aggregates go out first: a reader woken by the list change
        // must already see matching totals.
        self.total_tx.send_replace(total);
        self.by_category_tx.send_replace(by_category);
        self.all_tx.send_replace(expenses);
        Ok(())
    }

    // ========================
    // One-shot reads
    // ========================

    /// All expenses, date descending, ties by id descending.
    pub async fn list(&self) -> Result<Vec<Expense>, LedgerError> {
        self.fetch_all().await
    }

    /// Get an expense by id.
    pub async fn get(&self, id: ExpenseId) -> Result<Option<Expense>, LedgerError> {
        let row = sqlx::query("SELECT id, title, amount, category, date FROM expense WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(LedgerError::storage("fetching the expense"))?;

        match row {
            Some(row) => Ok(Some(row_to_expense(&row)?)),
            None => Ok(None),
        }
    }

    /// Sum of all amounts, exactly 0 when the ledger is empty.
    pub async fn total(&self) -> Result<f64, LedgerError> {
        self.fetch_total().await
    }

    /// Per-category totals for categories with at least one record.
    pub async fn totals_by_category(&self) -> Result<Vec<CategoryTotal>, LedgerError> {
        self.fetch_totals_by_category().await
    }

    async fn fetch_all(&self) -> Result<Vec<Expense>, LedgerError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, amount, category, date
            FROM expense
            ORDER BY date DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(LedgerError::storage("listing expenses"))?;

        rows.iter().map(row_to_expense).collect()
    }

    async fn fetch_total(&self) -> Result<f64, LedgerError> {
        let row = sqlx::query("SELECT COALESCE(SUM(amount), 0.0) AS total FROM expense")
            .fetch_one(&self.pool)
            .await
            .map_err(LedgerError::storage("computing the total"))?;

        Ok(row.get("total"))
    }

    async fn fetch_totals_by_category(&self) -> Result<Vec<CategoryTotal>, LedgerError> {
        let rows = sqlx::query(
            r#"
            SELECT category, SUM(amount) AS total
            FROM expense
            GROUP BY category
            ORDER BY category
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(LedgerError::storage("computing per-category totals"))?;

        rows.iter()
            .map(|row| {
                let symbol: String = row.get("category");
                let category = Category::from_symbol(&symbol).ok_or_else(|| LedgerError::Corrupt {
                    detail: format!("unknown category '{}'", symbol),
                })?;
                Ok(CategoryTotal {
                    category,
                    total: row.get("total"),
                })
            })
            .collect()
    }
}

fn row_to_expense(row: &sqlx::sqlite::SqliteRow) -> Result<Expense, LedgerError> {
    let id: i64 = row.get("id");
    let symbol: String = row.get("category");
    let day: i64 = row.get("date");

    let category = Category::from_symbol(&symbol).ok_or_else(|| LedgerError::Corrupt {
        detail: format!("expense {}: unknown category '{}'", id, symbol),
    })?;
    let date = date_from_epoch_day(day).ok_or_else(|| LedgerError::Corrupt {
        detail: format!("expense {}: day {} is out of range", id, day),
    })?;

    Ok(Expense {
        id,
        title: row.get("title"),
        amount: row.get("amount"),
        category,
        date,
    })
}

/// Days since 1970-01-01, the stored encoding for dates.
fn epoch_day(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) - UNIX_EPOCH_CE_DAYS
}

fn date_from_epoch_day(day: i64) -> Option<NaiveDate> {
    let ce_days = i32::try_from(day.checked_add(UNIX_EPOCH_CE_DAYS)?).ok()?;
    NaiveDate::from_num_days_from_ce_opt(ce_days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_day_matches_unix_epoch() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(epoch_day(epoch), 0);
        assert_eq!(date_from_epoch_day(0), Some(epoch));
    }

    #[test]
    fn test_epoch_day_roundtrip() {
        for ymd in [(1899, 12, 31), (2000, 2, 29), (2025, 1, 10), (2100, 6, 15)] {
            let date = NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2).unwrap();
            assert_eq!(date_from_epoch_day(epoch_day(date)), Some(date));
        }
    }

    #[test]
    fn test_pre_epoch_dates_are_negative() {
        let date = NaiveDate::from_ymd_opt(1969, 12, 31).unwrap();
        assert_eq!(epoch_day(date), -1);
        assert_eq!(date_from_epoch_day(-1), Some(date));
    }

    #[test]
    fn test_out_of_range_day_is_rejected() {
        assert_eq!(date_from_epoch_day(i64::MAX), None);
        assert_eq!(date_from_epoch_day(i64::MIN), None);
    }
}
