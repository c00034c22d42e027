//! Business entity and transfer display formatting

use std::collections::HashMap;

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{BusinessEntity, BusinessId, Context, Transfer};

#[derive(Tabled)]
struct BusinessRow {
    #[tabled(rename = "Order")]
    order: i32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "ID")]
    id: String,
}

#[derive(Tabled)]
struct TransferRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "From")]
    source: String,
    #[tabled(rename = "Amount")]
    amount: String,
}

pub fn format_business_list(businesses: &[BusinessEntity]) -> String {
    if businesses.is_empty() {
        return "No businesses yet. Create one with 'contas business create <name>'.\n".to_string();
    }

    let rows: Vec<BusinessRow> = businesses
        .iter()
        .map(|b| BusinessRow {
            order: b.order,
            name: b.name.clone(),
            id: b.id.to_string(),
        })
        .collect();

    let mut output = Table::new(rows).with(Style::psql()).to_string();
    output.push('\n');
    output
}

/// Format transfers, newest first, naming their source businesses
pub fn format_transfer_list(transfers: &[Transfer], businesses: &[BusinessEntity]) -> String {
    if transfers.is_empty() {
        return "No transfers found.\n".to_string();
    }

    let names: HashMap<BusinessId, &str> =
        businesses.iter().map(|b| (b.id, b.name.as_str())).collect();

    let rows: Vec<TransferRow> = transfers
        .iter()
        .map(|t| TransferRow {
            id: t.id.to_string().chars().take(8).collect(),
            date: t.date.to_string(),
            source: match t.source {
                Context::Personal => "Personal".to_string(),
                Context::Business(id) => names
                    .get(&id)
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| id.to_string()),
            },
            amount: t.amount.to_string(),
        })
        .collect();

    let mut output = Table::new(rows).with(Style::psql()).to_string();
    output.push('\n');
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, UserId};
    use chrono::NaiveDate;

    #[test]
    fn test_transfer_list_names_source() {
        let user = UserId::new();
        let arcade = BusinessEntity::new(user, "Arcade", 0);
        let transfer = Transfer::new(
            user,
            Money::from_cents(50000),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            arcade.context(),
        );

        let output = format_transfer_list(&[transfer], &[arcade]);
        assert!(output.contains("Arcade"));
        assert!(output.contains("R$ 500.00"));
    }

    #[test]
    fn test_empty_business_list() {
        assert!(format_business_list(&[]).starts_with("No businesses yet"));
    }
}
