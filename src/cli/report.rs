//! CLI commands for reports
//!
//! Chart aggregates of the monthly snapshot, with CSV export, and card
//! invoices.

use clap::Subcommand;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::config::settings::Settings;
use crate::error::{ContasError, ContasResult};
use crate::reports::{export_categories_csv, export_daily_flow_csv, CardInvoice, FinancialSnapshot};
use crate::services::CardService;
use crate::storage::Storage;

use super::parse_date;

/// Report subcommands
#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Personal income and expenses for every day of the month
    Daily {
        /// Any date in the month (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        /// Export to CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Personal expenses by category for the month
    Categories {
        /// Any date in the month (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        /// Export to CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Card invoice for the cycle containing a date
    Invoice {
        /// Card name or ID
        card: String,
        /// Reference date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        /// Show the previous cycle instead
        #[arg(long, conflicts_with = "next")]
        previous: bool,
        /// Show the next cycle instead
        #[arg(long)]
        next: bool,
    },
}

fn create_output(path: &Path) -> ContasResult<BufWriter<File>> {
    let file = File::create(path).map_err(|e| {
        ContasError::Export(format!("Failed to create file {}: {}", path.display(), e))
    })?;
    Ok(BufWriter::new(file))
}

/// Handle report commands
pub fn handle_report_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ReportCommands,
) -> ContasResult<()> {
    let user = settings.user_id;

    match cmd {
        ReportCommands::Daily { date, output } => {
            let reference = parse_date(date.as_deref())?;
            let snapshot = FinancialSnapshot::generate(storage, user, reference)?;
            match output {
                Some(path) => {
                    export_daily_flow_csv(&snapshot.daily_flow, create_output(&path)?)?;
                    println!("Daily report exported to: {}", path.display());
                }
                None => {
                    println!("Daily flow: {}", snapshot.period);
                    println!(
                        "{:<12} {:>14} {:>14} {:>14}",
                        "Date", "Income", "Expenses", "Balance"
                    );
                    println!("{}", "-".repeat(57));
                    for day in &snapshot.daily_flow {
                        println!(
                            "{:<12} {:>14} {:>14} {:>14}",
                            day.date.to_string(),
                            day.income.to_string(),
                            day.expense.to_string(),
                            day.cumulative.to_string()
                        );
                    }
                }
            }
        }

        ReportCommands::Categories { date, output } => {
            let reference = parse_date(date.as_deref())?;
            let snapshot = FinancialSnapshot::generate(storage, user, reference)?;
            match output {
                Some(path) => {
                    export_categories_csv(&snapshot.category_expenses, create_output(&path)?)?;
                    println!("Category report exported to: {}", path.display());
                }
                None if snapshot.category_expenses.is_empty() => {
                    println!("No personal expenses in {}.", snapshot.period);
                }
                None => {
                    println!("Expenses by category: {}", snapshot.period);
                    println!("{:<30} {:>14} {:>6}", "Category", "Amount", "Count");
                    println!("{}", "-".repeat(52));
                    for total in &snapshot.category_expenses {
                        println!(
                            "{:<30} {:>14} {:>6}",
                            total.category,
                            total.total.to_string(),
                            total.count
                        );
                    }
                    println!("{}", "-".repeat(52));
                    println!("{:<30} {:>14}", "Total", snapshot.total_expense_personal.to_string());
                }
            }
        }

        ReportCommands::Invoice {
            card,
            date,
            previous,
            next,
        } => {
            let service = CardService::new(storage);
            let found = service
                .find(user, &card)?
                .ok_or_else(|| ContasError::card_not_found(&card))?;

            let mut invoice = service.invoice(user, found.id, parse_date(date.as_deref())?)?;
            if previous {
                let cycle = invoice.cycle.previous(found.closing_day)?;
                invoice = CardInvoice::for_cycle(storage, &found, cycle)?;
            } else if next {
                let cycle = invoice.cycle.next(found.closing_day)?;
                invoice = CardInvoice::for_cycle(storage, &found, cycle)?;
            }
            print!("{}", invoice.format_terminal());
        }
    }

    Ok(())
}
