//! Movement display formatting
//!
//! Formats incomes and expenses for terminal output in table and detail
//! views.

use std::collections::HashMap;

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{BusinessEntity, BusinessId, Context, Money, Movement, MovementKind};

#[derive(Tabled)]
struct MovementRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Context")]
    context: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Amount")]
    amount: String,
}

/// Name of a context as the user knows it
pub fn context_label(context: Context, businesses: &[BusinessEntity]) -> String {
    match context {
        Context::Personal => "Personal".to_string(),
        Context::Business(id) => business_name(id, businesses),
    }
}

fn business_name(id: BusinessId, businesses: &[BusinessEntity]) -> String {
    businesses
        .iter()
        .find(|b| b.id == id)
        .map(|b| b.name.clone())
        .unwrap_or_else(|| format!("(deleted {})", id))
}

fn short_id(id: impl ToString) -> String {
    id.to_string().chars().take(8).collect()
}

/// Format a list of movements as a table with income and expense totals
pub fn format_movement_list(movements: &[Movement], businesses: &[BusinessEntity]) -> String {
    if movements.is_empty() {
        return "No movements found.\n".to_string();
    }

    let names: HashMap<BusinessId, &str> =
        businesses.iter().map(|b| (b.id, b.name.as_str())).collect();

    let rows: Vec<MovementRow> = movements
        .iter()
        .map(|m| {
            let context = match m.context {
                Context::Personal => "Personal".to_string(),
                Context::Business(id) => names
                    .get(&id)
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| format!("(deleted {})", short_id(id))),
            };
            let mut description = m.description.clone();
            if m.installment_total > 1 {
                description.push_str(&format!(
                    " [{}/{}]",
                    m.installment_index, m.installment_total
                ));
            }
            MovementRow {
                id: short_id(m.id),
                date: m.date.to_string(),
                kind: m.kind.to_string(),
                context,
                description,
                category: m.category.clone(),
                amount: m.amount.to_string(),
            }
        })
        .collect();

    let income: Money = movements
        .iter()
        .filter(|m| m.kind == MovementKind::Income)
        .map(|m| m.amount)
        .sum();
    let expense: Money = movements
        .iter()
        .filter(|m| m.kind == MovementKind::Expense)
        .map(|m| m.amount)
        .sum();

    let mut output = Table::new(rows).with(Style::psql()).to_string();
    output.push('\n');
    output.push_str(&format!(
        "{} movement(s)  Income: {}  Expenses: {}  Net: {}\n",
        movements.len(),
        income,
        expense,
        income - expense
    ));
    output
}

/// Format a single movement's details
pub fn format_movement_details(movement: &Movement, businesses: &[BusinessEntity]) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}: {}\n", movement.kind, movement.description));
    output.push_str(&format!("  ID:          {}\n", movement.id));
    output.push_str(&format!("  Date:        {}\n", movement.date));
    output.push_str(&format!("  Amount:      {}\n", movement.amount));
    output.push_str(&format!(
        "  Context:     {}\n",
        context_label(movement.context, businesses)
    ));
    if !movement.category.is_empty() {
        output.push_str(&format!("  Category:    {}\n", movement.category));
    }
    if let Some(method) = movement.payment_method {
        output.push_str(&format!("  Payment:     {}\n", method));
    }
    if let Some(income_type) = movement.income_type {
        output.push_str(&format!("  Income type: {}\n", income_type));
    }
    if movement.recurring {
        output.push_str("  Recurring:   Yes\n");
    }
    if movement.installment_total > 1 {
        output.push_str(&format!(
            "  Installment: {} of {}\n",
            movement.installment_index, movement.installment_total
        ));
    }
    if let Some(transfer_id) = movement.transfer_id {
        output.push_str(&format!("  Transfer:    {}\n", transfer_id));
    }
    if !movement.notes.is_empty() {
        output.push_str(&format!("  Notes:       {}\n", movement.notes));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;
    use chrono::NaiveDate;

    #[test]
    fn test_list_shows_business_names_and_totals() {
        let user = UserId::new();
        let arcade = BusinessEntity::new(user, "Arcade", 0);
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let movements = vec![
            Movement::income(user, Money::from_cents(10000), day, arcade.context(), "Tokens"),
            Movement::expense(user, Money::from_cents(2500), day, Context::Personal, "Lunch"),
        ];

        let output = format_movement_list(&movements, &[arcade]);

        assert!(output.contains("Arcade"));
        assert!(output.contains("Lunch"));
        assert!(output.contains("Net: R$ 75.00"));
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(format_movement_list(&[], &[]), "No movements found.\n");
    }

    #[test]
    fn test_deleted_business_label() {
        let id = BusinessId::new();
        assert!(context_label(Context::Business(id), &[]).starts_with("(deleted"));
    }
}
