//! Credit card CLI commands

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::{format_card_details, format_card_list, format_charge};
use crate::error::{ContasError, ContasResult};
use crate::models::{CardAccount, Money};
use crate::reports::CardInvoice;
use crate::services::{resolve_context, CardService, CardUpdate};
use crate::storage::{LedgerReader, Storage};

use super::{parse_amount, parse_date};

/// Card subcommands
#[derive(Subcommand, Debug)]
pub enum CardCommands {
    /// Register a credit card
    Create {
        name: String,
        /// Day of the month the invoice closes (1-31)
        #[arg(long)]
        closing_day: u32,
        /// Day of the month the invoice is due (1-31)
        #[arg(long)]
        due_day: u32,
        /// Credit limit
        #[arg(short, long, default_value = "0")]
        limit: String,
        /// Context: "personal" or a business name
        #[arg(short, long)]
        context: Option<String>,
    },
    /// List cards
    List,
    /// Show card details and the current invoice
    Show {
        /// Card name or ID
        card: String,
    },
    /// Edit a card
    Edit {
        /// Card name or ID
        card: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long)]
        closing_day: Option<u32>,
        #[arg(long)]
        due_day: Option<u32>,
        #[arg(short, long)]
        limit: Option<String>,
    },
    /// Delete a card; its charges are kept
    Delete {
        /// Card name or ID
        card: String,
    },
    /// Record a purchase on a card
    Charge {
        /// Card name or ID
        card: String,
        /// Amount (e.g., "120.00")
        amount: String,
        description: String,
        /// Purchase date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        /// Number of installments (1-24)
        #[arg(short, long, default_value = "1")]
        installments: u32,
        #[arg(long, default_value = "")]
        category: String,
    },
}

fn find_card(
    service: &CardService<'_, Storage>,
    settings: &Settings,
    card: &str,
) -> ContasResult<CardAccount> {
    service
        .find(settings.user_id, card)?
        .ok_or_else(|| ContasError::card_not_found(card))
}

/// Handle a card command
pub fn handle_card_command(
    storage: &Storage,
    settings: &Settings,
    cmd: CardCommands,
) -> ContasResult<()> {
    let user = settings.user_id;
    let service = CardService::new(storage);

    match cmd {
        CardCommands::Create {
            name,
            closing_day,
            due_day,
            limit,
            context,
        } => {
            let limit = Money::parse(&limit).map_err(|e| {
                ContasError::Validation(format!("Invalid limit: '{}'. Error: {}", limit, e))
            })?;
            let context = resolve_context(storage, user, context.as_deref().unwrap_or(""))?;

            let card = service.create(user, &name, closing_day, due_day, limit, context)?;
            println!("Created card: {}", card);
            println!("  ID: {}", card.id);
        }

        CardCommands::List => {
            let summaries = service.list(user)?;
            let businesses = storage.list_businesses(user)?;
            print!("{}", format_card_list(&summaries, &businesses));
        }

        CardCommands::Show { card } => {
            let found = find_card(&service, settings, &card)?;
            let businesses = storage.list_businesses(user)?;
            print!("{}", format_card_details(&found, &businesses));
            println!();
            let invoice: CardInvoice = service.invoice(user, found.id, super::today())?;
            print!("{}", invoice.format_terminal());
        }

        CardCommands::Edit {
            card,
            name,
            closing_day,
            due_day,
            limit,
        } => {
            let found = find_card(&service, settings, &card)?;
            let credit_limit = limit
                .as_deref()
                .map(|l| {
                    Money::parse(l).map_err(|e| {
                        ContasError::Validation(format!("Invalid limit: '{}'. Error: {}", l, e))
                    })
                })
                .transpose()?;

            if name.is_none()
                && closing_day.is_none()
                && due_day.is_none()
                && credit_limit.is_none()
            {
                println!("No changes specified.");
                return Ok(());
            }

            let updated = service.update(
                user,
                found.id,
                CardUpdate {
                    name,
                    credit_limit,
                    closing_day,
                    due_day,
                },
            )?;
            println!("Updated card: {}", updated);
        }

        CardCommands::Delete { card } => {
            let found = find_card(&service, settings, &card)?;
            let deleted = service.delete(user, found.id)?;
            println!("Deleted card: {}", deleted.name);
        }

        CardCommands::Charge {
            card,
            amount,
            description,
            date,
            installments,
            category,
        } => {
            let found = find_card(&service, settings, &card)?;
            let charge = service.add_charge(
                user,
                found.id,
                &description,
                parse_amount(&amount)?,
                parse_date(date.as_deref())?,
                installments,
                &category,
            )?;
            println!("Charged {}: {}", found.name, format_charge(&charge));
        }
    }

    Ok(())
}
