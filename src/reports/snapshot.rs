//! Financial snapshot
//!
//! Month-to-date Personal totals, projection and status, per-business
//! profit and trailing-average projection, current card bills and the
//! resulting spendable margin. Recomputed on every request.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::fmt;

use crate::error::{ContasError, ContasResult};
use crate::models::{
    BillingCycle, BusinessId, CardId, Context, Money, MonthPeriod, MovementKind, UserId,
};
use crate::storage::LedgerReader;

use super::charts::{category_expenses, daily_flow, CategoryTotal, DailyFlow};

/// Three-level health classification of the Personal projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionStatus {
    Ok,
    Warning,
    Critical,
}

impl ProjectionStatus {
    /// Critical below zero, Warning below 20% of the month's expenses
    pub fn classify(projection: Money, expense: Money) -> Self {
        if projection.is_negative() {
            Self::Critical
        } else if i128::from(projection.cents()) * 5 < i128::from(expense.cents()) {
            Self::Warning
        } else {
            Self::Ok
        }
    }
}

impl fmt::Display for ProjectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Ok => "OK",
            Self::Warning => "Warning",
            Self::Critical => "Critical",
        })
    }
}

/// Month figures for one business context
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessProjection {
    pub business_id: BusinessId,
    pub name: String,
    pub income: Money,
    pub expense: Money,
    pub profit: Money,
    pub previous_profit: Money,
    /// Previous month's profit per day, exact
    pub daily_average: Decimal,
    pub month_projection: Money,
}

/// Current cycle bill of one card
#[derive(Debug, Clone, PartialEq)]
pub struct CardBill {
    pub card_id: CardId,
    pub name: String,
    pub cycle: BillingCycle,
    pub bill: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinancialSnapshot {
    pub reference_date: NaiveDate,
    pub period: MonthPeriod,
    pub current_day: u32,
    /// Context the user asked to view; the figures do not depend on it
    pub viewed_context: Context,
    pub total_income_personal: Money,
    pub total_expense_personal: Money,
    pub current_balance_personal: Money,
    pub month_end_projection: Money,
    pub status: ProjectionStatus,
    pub extra_needed: Money,
    pub businesses: Vec<BusinessProjection>,
    pub cards: Vec<CardBill>,
    pub total_card_bill: Money,
    pub spendable_margin: Money,
    pub daily_flow: Vec<DailyFlow>,
    pub category_expenses: Vec<CategoryTotal>,
}

fn overflow(what: &str) -> ContasError {
    ContasError::DataUnavailable(ContasError::amount_overflow(what).to_string())
}

fn unavailable(err: ContasError) -> ContasError {
    match err {
        ContasError::DataUnavailable(_) => err,
        other => ContasError::DataUnavailable(other.to_string()),
    }
}

/// Compute the snapshot for the month containing `reference`
///
/// Any ledger read failure, or a total that leaves the money range, becomes
/// `DataUnavailable` and no partial snapshot is returned. The ledger is
/// never written.
pub fn compute_snapshot<R: LedgerReader + ?Sized>(
    user_id: UserId,
    reference: NaiveDate,
    reader: &R,
) -> ContasResult<FinancialSnapshot> {
    let period = MonthPeriod::containing(reference);
    let month = period.range();

    let personal = reader
        .list_movements(user_id, Some(Context::Personal), Some(month))
        .map_err(unavailable)?;
    let sum = |kind: MovementKind, what: &str| -> ContasResult<Money> {
        Money::checked_sum(personal.iter().filter(|m| m.kind == kind).map(|m| m.amount))
            .ok_or_else(|| overflow(what))
    };
    let income = sum(MovementKind::Income, "personal income")?;
    let expense = sum(MovementKind::Expense, "personal expense")?;
    let balance = income
        .checked_sub(expense)
        .ok_or_else(|| overflow("personal balance"))?;
    // No forward projection of recurring items or future installments
    let projection = balance;
    let status = ProjectionStatus::classify(projection, expense);
    let extra_needed = projection
        .checked_neg()
        .ok_or_else(|| overflow("extra needed"))?
        .non_negative();

    let previous = period.prev();
    let days_current = Decimal::from(period.days());
    let days_previous = previous.days();

    let mut businesses = Vec::new();
    for business in reader.list_businesses(user_id).map_err(unavailable)? {
        let ctx = business.context();
        let total = |kind, range| {
            reader
                .sum_movements(user_id, ctx, kind, range)
                .map_err(unavailable)
        };

        let b_income = total(MovementKind::Income, month)?;
        let b_expense = total(MovementKind::Expense, month)?;
        let profit = b_income
            .checked_sub(b_expense)
            .ok_or_else(|| overflow("business profit"))?;
        let previous_profit = total(MovementKind::Income, previous.range())?
            .checked_sub(total(MovementKind::Expense, previous.range())?)
            .ok_or_else(|| overflow("business profit"))?;

        let daily_average = if days_previous == 0 {
            Decimal::ZERO
        } else {
            previous_profit.to_decimal() / Decimal::from(days_previous)
        };
        let month_projection = daily_average
            .checked_mul(days_current)
            .and_then(Money::checked_from_decimal)
            .ok_or_else(|| overflow("business projection"))?;

        businesses.push(BusinessProjection {
            business_id: business.id,
            name: business.name,
            income: b_income,
            expense: b_expense,
            profit,
            previous_profit,
            daily_average,
            month_projection,
        });
    }

    let mut cards = Vec::new();
    for card in reader.list_cards(user_id).map_err(unavailable)? {
        let cycle = BillingCycle::resolve(card.closing_day, reference)?;
        let charges = reader
            .list_card_charges(card.id, Some(cycle.as_range()))
            .map_err(unavailable)?;
        let bill = Money::checked_sum(charges.iter().map(|c| c.amount))
            .ok_or_else(|| overflow("card bill"))?;
        cards.push(CardBill {
            card_id: card.id,
            name: card.name,
            cycle,
            bill,
        });
    }
    let total_card_bill = Money::checked_sum(cards.iter().map(|c| c.bill))
        .ok_or_else(|| overflow("card bills"))?;
    let spendable_margin = projection
        .checked_sub(total_card_bill)
        .ok_or_else(|| overflow("spendable margin"))?
        .non_negative();
    let daily_flow = daily_flow(&personal, period).map_err(unavailable)?;
    let category_expenses = category_expenses(&personal, period).map_err(unavailable)?;

    tracing::debug!(
        %user_id,
        %reference,
        %status,
        businesses = businesses.len(),
        cards = cards.len(),
        "snapshot computed"
    );

    Ok(FinancialSnapshot {
        reference_date: reference,
        period,
        current_day: reference.day(),
        viewed_context: Context::Personal,
        total_income_personal: income,
        total_expense_personal: expense,
        current_balance_personal: balance,
        month_end_projection: projection,
        status,
        extra_needed,
        businesses,
        cards,
        total_card_bill,
        spendable_margin,
        daily_flow,
        category_expenses,
    })
}

fn personal_row(output: &mut String, label: &str, value: impl fmt::Display) {
    output.push_str(&format!("  {:<22} {:>14}\n", label, value));
}

impl FinancialSnapshot {
    pub fn generate<R: LedgerReader + ?Sized>(
        reader: &R,
        user_id: UserId,
        reference: NaiveDate,
    ) -> ContasResult<Self> {
        compute_snapshot(user_id, reference, reader)
    }

    pub fn with_viewed_context(mut self, context: Context) -> Self {
        self.viewed_context = context;
        self
    }

    /// Format the snapshot for terminal display
    pub fn format_terminal(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "Summary for {} (day {} of {})\n",
            self.period,
            self.current_day,
            self.period.days()
        ));
        output.push_str(&"=".repeat(60));
        output.push('\n');

        let viewed = match self.viewed_context {
            Context::Personal => "Personal".to_string(),
            Context::Business(id) => self
                .businesses
                .iter()
                .find(|b| b.business_id == id)
                .map(|b| b.name.clone())
                .unwrap_or_else(|| id.to_string()),
        };
        output.push_str(&format!("Viewing: {}\n\n", viewed));

        output.push_str("PERSONAL\n");
        personal_row(&mut output, "Income", self.total_income_personal);
        personal_row(&mut output, "Expenses", self.total_expense_personal);
        personal_row(&mut output, "Balance", self.current_balance_personal);
        personal_row(&mut output, "Month-end projection", self.month_end_projection);
        personal_row(&mut output, "Status", self.status);
        if self.extra_needed.is_positive() {
            personal_row(&mut output, "Extra needed", self.extra_needed);
        }

        if !self.businesses.is_empty() {
            output.push_str("\nBUSINESSES\n");
            output.push_str(&format!(
                "  {:<20} {:>14} {:>14} {:>14}\n",
                "Name", "Profit", "Daily avg", "Projection"
            ));
            for b in &self.businesses {
                output.push_str(&format!(
                    "  {:<20} {:>14} {:>14} {:>14}\n",
                    b.name,
                    b.profit,
                    Money::from_decimal(b.daily_average),
                    b.month_projection
                ));
            }
        }

        if !self.cards.is_empty() {
            output.push_str("\nCARDS\n");
            for c in &self.cards {
                output.push_str(&format!(
                    "  {:<20} {:>23} {:>14}\n",
                    c.name,
                    c.cycle.to_string(),
                    c.bill
                ));
            }
            output.push_str(&format!(
                "  {:<44} {:>14}\n",
                "Total card bills", self.total_card_bill
            ));
        }

        output.push_str(&"-".repeat(60));
        output.push('\n');
        output.push_str(&format!(
            "{:<46} {:>14}\n",
            "Safe to spend", self.spendable_margin
        ));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::ContasPaths;
    use crate::models::{
        BusinessEntity, CardAccount, CardCharge, DateRange, Movement, MovementId, Transfer,
        TransferId,
    };
    use crate::storage::{LedgerWriter, Storage};
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

    fn income(user: UserId, cents: i64, day: NaiveDate, ctx: Context) -> Movement {
        Movement::income(user, Money::from_cents(cents), day, ctx, "Income")
    }

    fn expense(user: UserId, cents: i64, day: NaiveDate, ctx: Context) -> Movement {
        Movement::expense(user, Money::from_cents(cents), day, ctx, "Expense")
    }

    #[test]
    fn test_empty_ledger_is_ok() {
        let (_temp, storage) = create_test_storage();
        let snapshot = compute_snapshot(UserId::new(), date(2024, 2, 5), &storage).unwrap();

        assert_eq!(snapshot.current_balance_personal, Money::zero());
        assert_eq!(snapshot.status, ProjectionStatus::Ok);
        assert_eq!(snapshot.extra_needed, Money::zero());
        assert_eq!(snapshot.spendable_margin, Money::zero());
        assert_eq!(snapshot.daily_flow.len(), 29);
    }

    #[test]
    fn test_overspent_month_is_critical() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let day = date(2024, 3, 10);
        storage
            .insert_movement(income(user, 300000, day, Context::Personal))
            .unwrap();
        storage
            .insert_movement(expense(user, 320000, day, Context::Personal))
            .unwrap();

        let snapshot = compute_snapshot(user, day, &storage).unwrap();

        assert_eq!(snapshot.current_balance_personal.cents(), -20000);
        assert_eq!(snapshot.status, ProjectionStatus::Critical);
        assert_eq!(snapshot.extra_needed.cents(), 20000);
        assert_eq!(snapshot.spendable_margin, Money::zero());
    }

    #[test]
    fn test_status_thresholds() {
        let expense = Money::from_cents(100000);
        let classify = |cents| ProjectionStatus::classify(Money::from_cents(cents), expense);

        assert_eq!(classify(-1), ProjectionStatus::Critical);
        assert_eq!(classify(19999), ProjectionStatus::Warning);
        assert_eq!(classify(20000), ProjectionStatus::Ok);
        assert_eq!(
            ProjectionStatus::classify(Money::zero(), Money::zero()),
            ProjectionStatus::Ok
        );
    }

    #[test]
    fn test_card_bill_reduces_margin() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let reference = date(2024, 2, 5);
        storage
            .insert_movement(income(user, 100000, date(2024, 2, 1), Context::Personal))
            .unwrap();

        let card = CardAccount::new(user, "Nubank", 10, 17, Context::Personal);
        storage.cards.upsert(card.clone()).unwrap();
        let charges = [
            (date(2024, 1, 15), 5000),
            (date(2024, 2, 3), 3000),
            (date(2024, 2, 11), 2000),
        ];
        for (day, cents) in charges {
            storage
                .charges
                .upsert(CardCharge::new(&card, "x", Money::from_cents(cents), day))
                .unwrap();
        }

        let snapshot = compute_snapshot(user, reference, &storage).unwrap();

        assert_eq!(snapshot.cards.len(), 1);
        assert_eq!(snapshot.cards[0].cycle.start, date(2024, 1, 11));
        assert_eq!(snapshot.cards[0].cycle.end, date(2024, 2, 10));
        assert_eq!(snapshot.total_card_bill.cents(), 8000);
        assert_eq!(snapshot.spendable_margin.cents(), 92000);
    }

    #[test]
    fn test_business_trailing_average() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let arcade = BusinessEntity::new(user, "Arcade", 0);
        storage.businesses.upsert(arcade.clone()).unwrap();
        let ctx = arcade.context();

        // February 2024 has 29 days; March has 31
        storage
            .insert_movement(income(user, 290000, date(2024, 2, 10), ctx))
            .unwrap();
        storage
            .insert_movement(expense(user, 10000, date(2024, 2, 12), ctx))
            .unwrap();
        storage
            .insert_movement(income(user, 5000, date(2024, 3, 2), ctx))
            .unwrap();

        let snapshot = compute_snapshot(user, date(2024, 3, 5), &storage).unwrap();
        let b = &snapshot.businesses[0];

        assert_eq!(b.profit.cents(), 5000);
        assert_eq!(b.previous_profit.cents(), 280000);
        assert_eq!(b.daily_average, Decimal::new(280000, 2) / Decimal::from(29));
        // 2800 / 29 * 31 = 2993.1034...
        assert_eq!(b.month_projection.cents(), 299310);
        // Business activity never touches the Personal figures
        assert_eq!(snapshot.total_income_personal, Money::zero());
    }

    #[test]
    fn test_snapshot_is_idempotent() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let day = date(2024, 5, 20);
        storage
            .insert_movement(expense(user, 1234, day, Context::Personal))
            .unwrap();

        let first = compute_snapshot(user, day, &storage).unwrap();
        let second = compute_snapshot(user, day, &storage).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_totals_beyond_money_range_are_data_unavailable() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let day = date(2024, 5, 20);
        // Written past validation, as a hand-edited file would be
        for _ in 0..2 {
            storage
                .insert_movement(expense(user, i64::MAX - 10, day, Context::Personal))
                .unwrap();
        }

        let err = compute_snapshot(user, day, &storage).unwrap_err();
        assert!(err.is_data_unavailable());
        assert_eq!(err.user_message(), "Could not load summary");
    }

    #[test]
    fn test_format_terminal_aligns_amounts() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let day = date(2024, 3, 10);
        storage
            .insert_movement(income(user, 300000, day, Context::Personal))
            .unwrap();

        let text = compute_snapshot(user, day, &storage)
            .unwrap()
            .format_terminal();

        assert!(text.contains(&format!("  {:<22} {:>14}\n", "Income", "R$ 3000.00")));
        assert!(text.contains(&format!("  {:<22} {:>14}\n", "Status", "OK")));
        assert!(text.ends_with(&format!("{:<46} {:>14}\n", "Safe to spend", "R$ 3000.00")));
    }

    struct BrokenReader;

    impl LedgerReader for BrokenReader {
        fn list_movements(
            &self,
            _: UserId,
            _: Option<Context>,
            _: Option<DateRange>,
        ) -> ContasResult<Vec<Movement>> {
            Err(ContasError::Io("disk on fire".into()))
        }

        fn get_movement(&self, _: UserId, _: MovementId) -> ContasResult<Option<Movement>> {
            Ok(None)
        }

        fn list_transfer_movements(&self, _: UserId, _: TransferId) -> ContasResult<Vec<Movement>> {
            Ok(Vec::new())
        }

        fn list_cards(&self, _: UserId) -> ContasResult<Vec<CardAccount>> {
            Ok(Vec::new())
        }

        fn get_card(&self, _: UserId, _: CardId) -> ContasResult<Option<CardAccount>> {
            Ok(None)
        }

        fn list_card_charges(
            &self,
            _: CardId,
            _: Option<DateRange>,
        ) -> ContasResult<Vec<CardCharge>> {
            Ok(Vec::new())
        }

        fn list_businesses(&self, _: UserId) -> ContasResult<Vec<BusinessEntity>> {
            Ok(Vec::new())
        }

        fn get_business(&self, _: UserId, _: BusinessId) -> ContasResult<Option<BusinessEntity>> {
            Ok(None)
        }

        fn list_transfers(&self, _: UserId) -> ContasResult<Vec<Transfer>> {
            Ok(Vec::new())
        }

        fn get_transfer(&self, _: UserId, _: TransferId) -> ContasResult<Option<Transfer>> {
            Ok(None)
        }
    }

    #[test]
    fn test_read_failure_is_data_unavailable() {
        let err = compute_snapshot(UserId::new(), date(2024, 2, 5), &BrokenReader).unwrap_err();
        assert!(err.is_data_unavailable());
    }
}
