//! Chart aggregates
//!
//! Per-day cash flow and per-category expense totals for a calendar month,
//! with CSV export.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

use crate::error::{ContasError, ContasResult};
use crate::models::{Money, MonthPeriod, Movement, MovementKind, DEFAULT_CATEGORY};

/// Income and expense totals for one day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyFlow {
    pub date: NaiveDate,
    pub income: Money,
    pub expense: Money,
    /// Running balance from the first day of the month
    pub cumulative: Money,
}

/// Expense total for one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Money,
    pub count: usize,
}

fn add(total: Money, amount: Money, what: &str) -> ContasResult<Money> {
    total
        .checked_add(amount)
        .ok_or_else(|| ContasError::amount_overflow(what))
}

/// Totals for every day of `month`, zero-filled
///
/// Movements outside the month are ignored. Fails with `AmountOverflow` if a
/// total leaves the money range.
pub fn daily_flow(movements: &[Movement], month: MonthPeriod) -> ContasResult<Vec<DailyFlow>> {
    let mut by_day: BTreeMap<NaiveDate, (Money, Money)> = month
        .range()
        .days()
        .map(|d| (d, (Money::zero(), Money::zero())))
        .collect();

    for movement in movements {
        if let Some((income, expense)) = by_day.get_mut(&movement.date) {
            match movement.kind {
                MovementKind::Income => *income = add(*income, movement.amount, "daily income")?,
                MovementKind::Expense => {
                    *expense = add(*expense, movement.amount, "daily expense")?
                }
            }
        }
    }

    let mut cumulative = Money::zero();
    let mut flow = Vec::with_capacity(by_day.len());
    for (date, (income, expense)) in by_day {
        cumulative = add(cumulative, income, "running balance")?
            .checked_sub(expense)
            .ok_or_else(|| ContasError::amount_overflow("running balance"))?;
        flow.push(DailyFlow {
            date,
            income,
            expense,
            cumulative,
        });
    }
    Ok(flow)
}

/// Expense totals by category inside `month`, largest first
pub fn category_expenses(
    movements: &[Movement],
    month: MonthPeriod,
) -> ContasResult<Vec<CategoryTotal>> {
    let mut by_category: BTreeMap<String, (Money, usize)> = BTreeMap::new();

    for movement in movements
        .iter()
        .filter(|m| m.is_expense() && month.contains(m.date))
    {
        let category = if movement.category.trim().is_empty() {
            DEFAULT_CATEGORY.to_string()
        } else {
            movement.category.clone()
        };
        let entry = by_category.entry(category).or_insert((Money::zero(), 0));
        entry.0 = add(entry.0, movement.amount, "category total")?;
        entry.1 += 1;
    }

    let mut totals: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal {
            category,
            total,
            count,
        })
        .collect();
    // Stable sort keeps alphabetical order among equal totals
    totals.sort_by(|a, b| b.total.cmp(&a.total));
    Ok(totals)
}

#[derive(Serialize)]
struct DailyFlowRow {
    date: String,
    income: String,
    expense: String,
    balance: String,
}

#[derive(Serialize)]
struct CategoryRow<'a> {
    category: &'a str,
    amount: String,
    count: usize,
}

fn export_error(e: impl std::fmt::Display) -> ContasError {
    ContasError::Export(e.to_string())
}

/// Write the daily flow as CSV
pub fn export_daily_flow_csv<W: Write>(flow: &[DailyFlow], writer: W) -> ContasResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for day in flow {
        csv.serialize(DailyFlowRow {
            date: day.date.to_string(),
            income: day.income.to_plain_string(),
            expense: day.expense.to_plain_string(),
            balance: day.cumulative.to_plain_string(),
        })
        .map_err(export_error)?;
    }
    csv.flush().map_err(export_error)
}

/// Write the category totals as CSV
pub fn export_categories_csv<W: Write>(totals: &[CategoryTotal], writer: W) -> ContasResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for total in totals {
        csv.serialize(CategoryRow {
            category: &total.category,
            amount: total.total.to_plain_string(),
            count: total.count,
        })
        .map_err(export_error)?;
    }
    csv.flush().map_err(export_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Context, UserId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expense(cents: i64, day: NaiveDate, description: &str, category: &str) -> Movement {
        let mut m = Movement::expense(
            UserId::new(),
            Money::from_cents(cents),
            day,
            Context::Personal,
            description,
        );
        m.category = category.into();
        m
    }

    fn sample() -> Vec<Movement> {
        let salary = Movement::income(
            UserId::new(),
            Money::from_cents(300000),
            date(2024, 2, 1),
            Context::Personal,
            "Salary",
        );
        vec![
            expense(4000, date(2024, 2, 3), "Market", "Food"),
            expense(500, date(2024, 2, 3), "Bus", "Transport"),
            expense(2500, date(2024, 2, 10), "Lunch", "Food"),
            salary,
            expense(999, date(2024, 1, 31), "Old", "Food"),
        ]
    }

    #[test]
    fn test_daily_flow_zero_filled() {
        let flow = daily_flow(&sample(), MonthPeriod::new(2024, 2)).unwrap();

        assert_eq!(flow.len(), 29);
        assert_eq!(flow[0].income.cents(), 300000);
        assert_eq!(flow[1].income, Money::zero());
        assert_eq!(flow[1].expense, Money::zero());
        assert_eq!(flow[2].expense.cents(), 4500);
        assert_eq!(flow[28].cumulative.cents(), 300000 - 4500 - 2500);
    }

    #[test]
    fn test_category_expenses() {
        let totals = category_expenses(&sample(), MonthPeriod::new(2024, 2)).unwrap();

        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].category, "Food");
        assert_eq!(totals[0].total.cents(), 6500);
        assert_eq!(totals[0].count, 2);
        assert_eq!(totals[1].category, "Transport");
    }

    #[test]
    fn test_totals_out_of_range_are_errors() {
        let huge = vec![
            expense(i64::MAX - 10, date(2024, 2, 3), "Hand-edited", "Food"),
            expense(i64::MAX - 10, date(2024, 2, 4), "Hand-edited", "Food"),
        ];
        let month = MonthPeriod::new(2024, 2);

        let err = category_expenses(&huge, month).unwrap_err();
        assert!(matches!(err, ContasError::AmountOverflow(_)));
        let err = daily_flow(&huge, month).unwrap_err();
        assert!(matches!(err, ContasError::AmountOverflow(_)));
    }

    #[test]
    fn test_csv_export() {
        let totals = category_expenses(&sample(), MonthPeriod::new(2024, 2)).unwrap();
        let mut out = Vec::new();
        export_categories_csv(&totals, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "category,amount,count");
        assert_eq!(lines[1], "Food,65.00,2");
    }
}
