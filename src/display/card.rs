//! Card display formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{BusinessEntity, CardAccount, CardCharge};
use crate::services::CardSummary;

use super::movement::context_label;

#[derive(Tabled)]
struct CardRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Closes")]
    closing_day: u32,
    #[tabled(rename = "Due")]
    due_day: u32,
    #[tabled(rename = "Limit")]
    limit: String,
    #[tabled(rename = "Context")]
    context: String,
    #[tabled(rename = "Charges")]
    charges: usize,
}

/// Format the user's cards as a table
pub fn format_card_list(summaries: &[CardSummary], businesses: &[BusinessEntity]) -> String {
    if summaries.is_empty() {
        return "No cards found.\n".to_string();
    }

    let rows: Vec<CardRow> = summaries
        .iter()
        .map(|s| CardRow {
            name: s.card.name.clone(),
            closing_day: s.card.closing_day,
            due_day: s.card.due_day,
            limit: s.card.credit_limit.to_string(),
            context: context_label(s.card.context, businesses),
            charges: s.charge_count,
        })
        .collect();

    let mut output = Table::new(rows).with(Style::psql()).to_string();
    output.push('\n');
    output
}

pub fn format_card_details(card: &CardAccount, businesses: &[BusinessEntity]) -> String {
    let mut output = String::new();
    output.push_str(&format!("Card: {}\n", card.name));
    output.push_str(&format!("  ID:          {}\n", card.id));
    output.push_str(&format!("  Closing day: {}\n", card.closing_day));
    output.push_str(&format!("  Due day:     {}\n", card.due_day));
    output.push_str(&format!("  Limit:       {}\n", card.credit_limit));
    output.push_str(&format!(
        "  Context:     {}\n",
        context_label(card.context, businesses)
    ));
    output
}

/// One-line confirmation for a recorded charge
pub fn format_charge(charge: &CardCharge) -> String {
    let mut line = format!(
        "{} {} {} ({})",
        charge.purchase_date, charge.description, charge.amount, charge.category
    );
    if charge.installment_total > 1 {
        line.push_str(&format!(
            " in {} installments",
            charge.installment_total
        ));
    }
    line
}
