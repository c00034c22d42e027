//! Card invoice report
//!
//! The charges of one billing cycle, the bill and its due date.

use chrono::NaiveDate;

use crate::error::{ContasError, ContasResult};
use crate::models::{BillingCycle, CardAccount, CardCharge, CardId, Money};
use crate::storage::LedgerReader;

#[derive(Debug, Clone)]
pub struct CardInvoice {
    pub card_id: CardId,
    pub card_name: String,
    pub cycle: BillingCycle,
    pub due_date: NaiveDate,
    /// Charges with purchase dates inside the cycle, newest first
    pub charges: Vec<CardCharge>,
    pub total: Money,
    pub credit_limit: Money,
}

impl CardInvoice {
    /// Build the invoice of the cycle containing `reference`
    pub fn generate<R: LedgerReader + ?Sized>(
        reader: &R,
        card: &CardAccount,
        reference: NaiveDate,
    ) -> ContasResult<Self> {
        let cycle = BillingCycle::resolve(card.closing_day, reference)?;
        Self::for_cycle(reader, card, cycle)
    }

    pub fn for_cycle<R: LedgerReader + ?Sized>(
        reader: &R,
        card: &CardAccount,
        cycle: BillingCycle,
    ) -> ContasResult<Self> {
        let charges = reader.list_card_charges(card.id, Some(cycle.as_range()))?;
        let total = Money::checked_sum(charges.iter().map(|c| c.amount))
            .ok_or_else(|| ContasError::amount_overflow(format!("bill of {}", card.name)))?;

        Ok(Self {
            card_id: card.id,
            card_name: card.name.clone(),
            cycle,
            due_date: cycle.due_date(card.closing_day, card.due_day)?,
            charges,
            total,
            credit_limit: card.credit_limit,
        })
    }

    /// Credit left after this bill; zero when no limit is set
    pub fn available_credit(&self) -> Money {
        (self.credit_limit - self.total).non_negative()
    }

    /// Format the invoice for terminal display
    pub fn format_terminal(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Invoice: {} ({})\n", self.card_name, self.cycle));
        output.push_str(&"=".repeat(70));
        output.push('\n');
        output.push_str(&format!("Due date: {}\n\n", self.due_date));

        if self.charges.is_empty() {
            output.push_str("No charges in this cycle.\n");
        } else {
            output.push_str(&format!(
                "{:<12} {:<30} {:>8} {:>14}\n",
                "Date", "Description", "Inst.", "Amount"
            ));
            output.push_str(&"-".repeat(70));
            output.push('\n');
            for charge in &self.charges {
                let installments =
                    format!("{}/{}", charge.installment_index, charge.installment_total);
                output.push_str(&format!(
                    "{:<12} {:<30} {:>8} {:>14}\n",
                    charge.purchase_date,
                    truncate(&charge.description, 30),
                    installments,
                    charge.amount
                ));
            }
        }

        output.push_str(&"-".repeat(70));
        output.push('\n');
        output.push_str(&format!("{:<52} {:>14}\n", "Total", self.total));
        if self.credit_limit.is_positive() {
            output.push_str(&format!(
                "{:<52} {:>14}\n",
                "Available credit",
                self.available_credit()
            ));
        }

        output
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::ContasPaths;
    use crate::models::{Context, UserId};
    use crate::storage::Storage;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = ContasPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_invoice_next_cycle() {
        let (_temp, storage) = create_test_storage();
        let mut card = CardAccount::new(UserId::new(), "Inter", 10, 5, Context::Personal);
        card.credit_limit = Money::from_cents(10000);
        storage.cards.upsert(card.clone()).unwrap();
        storage
            .charges
            .upsert(CardCharge::new(&card, "Cinema", Money::from_cents(2000), date(2024, 2, 11)))
            .unwrap();

        let current = CardInvoice::generate(&storage, &card, date(2024, 2, 5)).unwrap();
        assert!(current.charges.is_empty());
        assert_eq!(current.total, Money::zero());

        let following = current.cycle.next(card.closing_day).unwrap();
        let next = CardInvoice::for_cycle(&storage, &card, following).unwrap();
        assert_eq!(next.total.cents(), 2000);
        // Due day 5 is before the closing day, so it falls in the month after the close
        assert_eq!(next.due_date, date(2024, 4, 5));
        assert_eq!(next.available_credit().cents(), 8000);
        assert!(next.format_terminal().contains("Cinema"));
    }
}
