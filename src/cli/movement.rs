//! Income and expense CLI commands

use clap::{Args, Subcommand};

use crate::config::settings::Settings;
use crate::display::{format_movement_details, format_movement_list};
use crate::error::{ContasError, ContasResult};
use crate::models::{IncomeType, Movement, MovementKind, PaymentMethod, EXPENSE_CATEGORIES};
use crate::services::{resolve_context, MovementDraft, MovementService, MovementUpdate};
use crate::storage::{LedgerReader, Storage};

use super::{parse_amount, parse_date, parse_month};

/// Filters shared by the income and expense listings
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Context: "personal" or a business name
    #[arg(short, long)]
    context: Option<String>,
    /// Month (YYYY-MM)
    #[arg(short, long)]
    month: Option<String>,
}

/// Fields shared by the income and expense edits
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Movement ID (or its first characters)
    id: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(short, long)]
    amount: Option<String>,
    #[arg(long)]
    category: Option<String>,
    /// Date (YYYY-MM-DD)
    #[arg(short, long)]
    date: Option<String>,
    #[arg(long)]
    recurring: Option<bool>,
    #[arg(long)]
    notes: Option<String>,
}

/// Expense subcommands
#[derive(Subcommand, Debug)]
pub enum ExpenseCommands {
    /// Record an expense
    Add {
        /// Amount (e.g., "45.90")
        amount: String,
        description: String,
        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        /// Context: "personal" or a business name
        #[arg(short, long)]
        context: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Payment method (pix, cash, card)
        #[arg(short, long)]
        payment: Option<String>,
        #[arg(long)]
        recurring: bool,
        /// Total number of installments (1-99)
        #[arg(long)]
        installments: Option<u32>,
        /// Which installment this is
        #[arg(long)]
        installment_index: Option<u32>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List expenses, newest first
    List(ListArgs),
    /// Show expense details
    Show { id: String },
    /// Edit an expense
    Edit {
        #[command(flatten)]
        fields: EditArgs,
        /// Payment method (pix, cash, card)
        #[arg(short, long)]
        payment: Option<String>,
        #[arg(long)]
        installments: Option<u32>,
        #[arg(long)]
        installment_index: Option<u32>,
    },
    /// Delete an expense
    Delete { id: String },
    /// Show the suggested expense categories
    Categories,
}

/// Income subcommands
#[derive(Subcommand, Debug)]
pub enum IncomeCommands {
    /// Record an income
    Add {
        /// Amount (e.g., "3000")
        amount: String,
        description: String,
        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        /// Context: "personal" or a business name
        #[arg(short, long)]
        context: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Income type (fixed, extra, business_daily)
        #[arg(short = 't', long = "type")]
        income_type: Option<String>,
        #[arg(long)]
        recurring: bool,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List incomes, newest first
    List(ListArgs),
    /// Show income details
    Show { id: String },
    /// Edit an income
    Edit(EditArgs),
    /// Delete an income
    Delete { id: String },
}

fn parse_payment(text: &str) -> ContasResult<PaymentMethod> {
    PaymentMethod::parse(text).ok_or_else(|| {
        ContasError::Validation(format!(
            "Invalid payment method: '{}'. Valid methods: pix, cash, card",
            text
        ))
    })
}

fn find_movement(
    service: &MovementService<'_, Storage>,
    settings: &Settings,
    id: &str,
    kind: MovementKind,
) -> ContasResult<Movement> {
    service
        .find(settings.user_id, id)?
        .filter(|m| m.kind == kind)
        .ok_or_else(|| ContasError::movement_not_found(id))
}

fn build_update(fields: EditArgs) -> ContasResult<(String, MovementUpdate)> {
    let update = MovementUpdate {
        description: fields.description,
        amount: fields.amount.as_deref().map(parse_amount).transpose()?,
        category: fields.category,
        date: fields.date.as_deref().map(|d| parse_date(Some(d))).transpose()?,
        recurring: fields.recurring,
        notes: fields.notes,
        ..Default::default()
    };
    Ok((fields.id, update))
}

fn list(
    storage: &Storage,
    settings: &Settings,
    args: ListArgs,
    kind: MovementKind,
) -> ContasResult<()> {
    let user = settings.user_id;
    let context = args
        .context
        .as_deref()
        .map(|c| resolve_context(storage, user, c))
        .transpose()?;
    let month = parse_month(args.month.as_deref())?;

    let movements: Vec<Movement> = MovementService::new(storage)
        .list(user, context, month)?
        .into_iter()
        .filter(|m| m.kind == kind)
        .collect();
    let businesses = storage.list_businesses(user)?;

    print!("{}", format_movement_list(&movements, &businesses));
    Ok(())
}

fn apply_update(
    storage: &Storage,
    settings: &Settings,
    kind: MovementKind,
    id: &str,
    update: MovementUpdate,
) -> ContasResult<()> {
    let service = MovementService::new(storage);
    let found = find_movement(&service, settings, id, kind)?;

    if update.is_empty() {
        println!("No changes specified.");
        return Ok(());
    }

    let updated = service.update(settings.user_id, found.id, update)?;
    println!("Updated: {}", updated);
    Ok(())
}

/// Handle an expense command
pub fn handle_expense_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ExpenseCommands,
) -> ContasResult<()> {
    let user = settings.user_id;
    let service = MovementService::new(storage);

    match cmd {
        ExpenseCommands::Add {
            amount,
            description,
            date,
            context,
            category,
            payment,
            recurring,
            installments,
            installment_index,
            notes,
        } => {
            let context = resolve_context(storage, user, context.as_deref().unwrap_or(""))?;
            let mut draft = MovementDraft::new(
                parse_amount(&amount)?,
                parse_date(date.as_deref())?,
                context,
                description,
            );
            draft.category = category;
            draft.payment_method = Some(match payment {
                Some(p) => parse_payment(&p)?,
                None => settings.default_payment_method,
            });
            draft.recurring = recurring;
            draft.installment_total = installments;
            draft.installment_index = installment_index;
            draft.notes = notes;

            let expense = service.add_expense(user, draft)?;
            println!("Recorded expense: {}", expense);
            println!("  ID: {}", expense.id);
        }

        ExpenseCommands::List(args) => list(storage, settings, args, MovementKind::Expense)?,

        ExpenseCommands::Show { id } => {
            let found = find_movement(&service, settings, &id, MovementKind::Expense)?;
            let businesses = storage.list_businesses(user)?;
            print!("{}", format_movement_details(&found, &businesses));
        }

        ExpenseCommands::Edit {
            fields,
            payment,
            installments,
            installment_index,
        } => {
            let (id, mut update) = build_update(fields)?;
            update.payment_method = payment.as_deref().map(parse_payment).transpose()?;
            update.installment_total = installments;
            update.installment_index = installment_index;
            apply_update(storage, settings, MovementKind::Expense, &id, update)?;
        }

        ExpenseCommands::Delete { id } => {
            let found = find_movement(&service, settings, &id, MovementKind::Expense)?;
            let removed = service.delete(user, found.id)?;
            println!("Deleted expense: {}", removed);
        }

        ExpenseCommands::Categories => {
            for category in EXPENSE_CATEGORIES {
                println!("{}", category);
            }
        }
    }

    Ok(())
}

/// Handle an income command
pub fn handle_income_command(
    storage: &Storage,
    settings: &Settings,
    cmd: IncomeCommands,
) -> ContasResult<()> {
    let user = settings.user_id;
    let service = MovementService::new(storage);

    match cmd {
        IncomeCommands::Add {
            amount,
            description,
            date,
            context,
            category,
            income_type,
            recurring,
            notes,
        } => {
            let context = resolve_context(storage, user, context.as_deref().unwrap_or(""))?;
            let mut draft = MovementDraft::new(
                parse_amount(&amount)?,
                parse_date(date.as_deref())?,
                context,
                description,
            );
            draft.category = category;
            draft.income_type = income_type
                .as_deref()
                .map(|t| {
                    IncomeType::parse(t).ok_or_else(|| {
                        ContasError::Validation(format!(
                            "Invalid income type: '{}'. Valid types: fixed, extra, business_daily",
                            t
                        ))
                    })
                })
                .transpose()?;
            draft.recurring = recurring;
            draft.notes = notes;

            let income = service.add_income(user, draft)?;
            println!("Recorded income: {}", income);
            println!("  ID: {}", income.id);
        }

        IncomeCommands::List(args) => list(storage, settings, args, MovementKind::Income)?,

        IncomeCommands::Show { id } => {
            let found = find_movement(&service, settings, &id, MovementKind::Income)?;
            let businesses = storage.list_businesses(user)?;
            print!("{}", format_movement_details(&found, &businesses));
        }

        IncomeCommands::Edit(fields) => {
            let (id, update) = build_update(fields)?;
            apply_update(storage, settings, MovementKind::Income, &id, update)?;
        }

        IncomeCommands::Delete { id } => {
            let found = find_movement(&service, settings, &id, MovementKind::Income)?;
            let removed = service.delete(user, found.id)?;
            println!("Deleted income: {}", removed);
        }
    }

    Ok(())
}
