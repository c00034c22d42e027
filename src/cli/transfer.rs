//! CLI command handler for business-to-personal transfers

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::format_transfer_list;
use crate::error::{ContasError, ContasResult};
use crate::services::{resolve_context, TransferService};
use crate::storage::{LedgerReader, Storage};

use super::{parse_amount, parse_date};

/// Transfer subcommands
#[derive(Subcommand, Debug)]
pub enum TransferCommands {
    /// Move money from a business into the personal context
    Create {
        /// Source business name or ID
        from: String,
        /// Amount (e.g., "500.00")
        amount: String,
        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// List the 50 most recent transfers
    List,
    /// Delete a transfer and both of its movements
    Delete {
        /// Transfer ID (or its first characters)
        id: String,
    },
}

/// Handle a transfer command
pub fn handle_transfer_command(
    storage: &Storage,
    settings: &Settings,
    cmd: TransferCommands,
) -> ContasResult<()> {
    let user = settings.user_id;
    let service = TransferService::new(storage);

    match cmd {
        TransferCommands::Create { from, amount, date } => {
            let source = resolve_context(storage, user, &from).map_err(|_| {
                ContasError::InvalidTransfer(format!("Unknown source context '{}'", from))
            })?;
            let amount = parse_amount(&amount)?;
            let date = parse_date(date.as_deref())?;

            let result = service.execute_transfer(user, amount, date, source)?;

            println!("Transfer recorded:");
            println!("  Out: {} ({})", result.expense.description, result.expense.amount);
            println!("  In:  {} ({})", result.income.description, result.income.amount);
            println!("  ID:  {}", result.transfer.id);
        }

        TransferCommands::List => {
            let transfers = service.list_transfers(user)?;
            let businesses = storage.list_businesses(user)?;
            print!("{}", format_transfer_list(&transfers, &businesses));
        }

        TransferCommands::Delete { id } => {
            let found = service
                .find(user, &id)?
                .ok_or_else(|| ContasError::transfer_not_found(&id))?;
            let removed = service.delete_transfer(user, found.id)?;
            println!("Deleted transfer of {} on {}", removed.amount, removed.date);
        }
    }

    Ok(())
}
