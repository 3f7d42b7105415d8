use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::application::LedgerService;
use crate::domain::{Category, CategoryTotal, Expense};

/// Spesa - Personal Expense Tracker
#[derive(Parser)]
#[command(name = "spesa")]
#[command(about = "A local-first personal expense tracker")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "spesa.db")]
    pub database: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Record an expense
    Add {
        /// Short description (e.g., "Groceries")
        title: String,

        /// Amount spent (e.g., "15.50"; negative for refunds)
        amount: f64,

        /// Category: food, transport, bills, entertainment, other
        #[arg(short, long)]
        category: Category,

        /// Date of the expense (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Remove an expense by id
    Remove {
        /// Expense id (as shown by `list`)
        id: i64,
    },

    /// List all expenses, most recent first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the total of all expenses
    Total,

    /// Show totals grouped by category
    Summary {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive session: live ledger view with add/rm commands
    Watch,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Add {
                title,
                amount,
                category,
                date,
            } => {
                let service = LedgerService::connect(&self.database).await?;

                let mut expense = Expense::new(title, amount, category);
                if let Some(date_str) = date {
                    let date = parse_date(&date_str)?;
                    expense = expense.with_date(date);
                }

                let stored = service.add_expense(expense).await?;
                println!(
                    "Recorded expense #{}: {} {:.2} ({}, {})",
                    stored.id, stored.title, stored.amount, stored.category, stored.date
                );
            }

            Commands::Remove { id } => {
                let service = LedgerService::connect(&self.database).await?;
                match service.get_expense(id).await? {
                    Some(expense) => {
                        service.remove_expense(&expense).await?;
                        println!("Removed expense #{}: {}", expense.id, expense.title);
                    }
                    None => println!("No expense with id {}", id),
                }
            }

            Commands::List { json } => {
                let service = LedgerService::connect(&self.database).await?;
                let expenses = service.list_expenses().await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&expenses)?);
                } else {
                    print_expenses(&expenses);
                }
            }

            Commands::Total => {
                let service = LedgerService::connect(&self.database).await?;
                let total = service.total().await?;
                println!("Total: {:.2}", total);
            }

            Commands::Summary { json } => {
                let service = LedgerService::connect(&self.database).await?;
                let totals = service.totals_by_category().await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&totals)?);
                } else {
                    print_summary(&totals);
                }
            }

            Commands::Watch => {
                let service = LedgerService::connect(&self.database).await?;
                run_watch_session(&service).await?;
            }
        }

        Ok(())
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str))
}

fn print_expenses(expenses: &[Expense]) {
    if expenses.is_empty() {
        println!("No expenses recorded.");
        return;
    }
    println!(
        "{:<6} {:<12} {:<14} {:>10}  {}",
        "ID", "DATE", "CATEGORY", "AMOUNT", "TITLE"
    );
    println!("{}", "-".repeat(60));
    for expense in expenses {
        println!(
            "{:<6} {:<12} {:<14} {:>10.2}  {}",
            expense.id, expense.date, expense.category, expense.amount, expense.title
        );
    }
}

fn print_summary(totals: &[CategoryTotal]) {
    if totals.is_empty() {
        println!("No expenses recorded.");
        return;
    }
    println!("{:<14} {:>10}", "CATEGORY", "TOTAL");
    println!("{}", "-".repeat(25));
    for entry in totals {
        println!("{:<14} {:>10.2}", entry.category, entry.total);
    }
}

/// Interactive session driven by the store's live queries: a printer
/// task redraws the ledger whenever a mutation lands, while the main
/// loop reads `add` / `rm` commands from stdin.
async fn run_watch_session(service: &LedgerService) -> Result<()> {
    let mut expenses_rx = service.subscribe_expenses();
    let total_rx = service.subscribe_total();

    let printer = tokio::spawn(async move {
        loop {
            {
                let expenses = expenses_rx.borrow_and_update();
                print_expenses(&expenses);
            }
            println!("Total: {:.2}", *total_rx.borrow());
            println!();
            if expenses_rx.changed().await.is_err() {
                break;
            }
        }
    });

    println!("Commands: add <amount> <category> <title...> | rm <id> | quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "q" {
            break;
        }
        if let Err(err) = run_watch_command(service, line).await {
            println!("Error: {:#}", err);
        }
    }

    printer.abort();
    Ok(())
}

async fn run_watch_command(service: &LedgerService, line: &str) -> Result<()> {
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some("add") => {
            let amount: f64 = parts
                .next()
                .context("Usage: add <amount> <category> <title...>")?
                .parse()
                .context("Invalid amount")?;
            let category: Category = parts
                .next()
                .context("Usage: add <amount> <category> <title...>")?
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;
            let title = parts.collect::<Vec<_>>().join(" ");
            service
                .add_expense(Expense::new(title, amount, category))
                .await?;
        }
        Some("rm") => {
            let id: i64 = parts
                .next()
                .context("Usage: rm <id>")?
                .parse()
                .context("Invalid id")?;
            match service.get_expense(id).await? {
                Some(expense) => service.remove_expense(&expense).await?,
                None => println!("No expense with id {}", id),
            }
        }
        Some(other) => println!("Unknown command '{}'", other),
        None => {}
    }
    Ok(())
}
