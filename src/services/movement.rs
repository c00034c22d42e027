//! Movement service
//!
//! Adds, edits, deletes and lists incomes and expenses. Writes go through a
//! unit of work so the ledger file and the audit log stay in step.

use chrono::{Duration, NaiveDate, Utc};

use crate::error::{ContasError, ContasResult};
use crate::models::movement::{DEFAULT_CATEGORY, MAX_EXPENSE_INSTALLMENTS};
use crate::models::{
    Context, DateRange, IncomeType, Money, MonthPeriod, Movement, MovementId, MovementKind,
    PaymentMethod, UserId,
};
use crate::storage::{LedgerReader, LedgerWriter};

use super::unit_of_work::UnitOfWork;

/// Maximum number of movements returned by a listing
pub const MOVEMENT_LIST_LIMIT: usize = 200;

/// How far back the deletion heuristic looks
pub const DELETION_WINDOW_DAYS: i64 = 90;

/// Fields for a new income or expense
#[derive(Debug, Clone)]
pub struct MovementDraft {
    pub amount: Money,
    pub date: NaiveDate,
    pub context: Context,
    pub description: String,
    pub category: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub income_type: Option<IncomeType>,
    pub recurring: bool,
    pub installment_total: Option<u32>,
    pub installment_index: Option<u32>,
    pub notes: Option<String>,
}

impl MovementDraft {
    pub fn new(
        amount: Money,
        date: NaiveDate,
        context: Context,
        description: impl Into<String>,
    ) -> Self {
        Self {
            amount,
            date,
            context,
            description: description.into(),
            category: None,
            payment_method: None,
            income_type: None,
            recurring: false,
            installment_total: None,
            installment_index: None,
            notes: None,
        }
    }
}

/// In-place edit; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct MovementUpdate {
    pub description: Option<String>,
    pub amount: Option<Money>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    pub recurring: Option<bool>,
    pub installment_total: Option<u32>,
    pub installment_index: Option<u32>,
    pub notes: Option<String>,
}

impl MovementUpdate {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.amount.is_none()
            && self.category.is_none()
            && self.date.is_none()
            && self.payment_method.is_none()
            && self.recurring.is_none()
            && self.installment_total.is_none()
            && self.installment_index.is_none()
            && self.notes.is_none()
    }
}

/// Service for income and expense management
pub struct MovementService<'a, S: LedgerReader + LedgerWriter> {
    ledger: &'a S,
}

impl<'a, S: LedgerReader + LedgerWriter> MovementService<'a, S> {
    pub fn new(ledger: &'a S) -> Self {
        Self { ledger }
    }

    pub fn add_expense(&self, user_id: UserId, draft: MovementDraft) -> ContasResult<Movement> {
        self.add(user_id, MovementKind::Expense, draft)
    }

    pub fn add_income(&self, user_id: UserId, draft: MovementDraft) -> ContasResult<Movement> {
        self.add(user_id, MovementKind::Income, draft)
    }

    fn add(
        &self,
        user_id: UserId,
        kind: MovementKind,
        draft: MovementDraft,
    ) -> ContasResult<Movement> {
        self.ensure_context_exists(user_id, draft.context)?;

        let description = draft.description.trim().to_string();
        let category = draft.category.as_deref().map(str::trim).unwrap_or_default();

        let mut movement = match kind {
            MovementKind::Expense => {
                let mut m = Movement::expense(
                    user_id,
                    draft.amount,
                    draft.date,
                    draft.context,
                    description,
                );
                m.category = if category.is_empty() {
                    DEFAULT_CATEGORY.to_string()
                } else {
                    category.to_string()
                };
                m.payment_method = Some(draft.payment_method.unwrap_or_default());

                if let Some(total) = draft.installment_total {
                    check_installment_total(total)?;
                    m.installment_total = total;
                }
                if let Some(index) = draft.installment_index {
                    m.installment_index = index;
                }
                m.normalize_installments();

                if draft.income_type.is_some() {
                    return Err(ContasError::Validation(
                        "Expenses do not have an income type".into(),
                    ));
                }
                m
            }
            MovementKind::Income => {
                let income_type = draft.income_type.unwrap_or_default();
                if income_type == IncomeType::Transfer {
                    return Err(ContasError::Validation(
                        "Transfer incomes are created by the transfer command".into(),
                    ));
                }
                if draft.payment_method.is_some() {
                    return Err(ContasError::Validation(
                        "Incomes do not have a payment method".into(),
                    ));
                }
                if draft.installment_total.is_some() || draft.installment_index.is_some() {
                    return Err(ContasError::Validation(
                        "Only expenses can be split into installments".into(),
                    ));
                }
                let mut m =
                    Movement::income(user_id, draft.amount, draft.date, draft.context, description);
                m.category = category.to_string();
                m.income_type = Some(income_type);
                m
            }
        };

        movement.recurring = draft.recurring;
        if let Some(notes) = draft.notes {
            movement.notes = notes.trim().to_string();
        }

        movement
            .validate()
            .map_err(|e| ContasError::Validation(e.to_string()))?;

        let mut uow = UnitOfWork::begin(self.ledger);
        uow.insert_movement(&movement)?;
        uow.commit()?;

        tracing::debug!(movement = %movement.id, kind = %movement.kind, "movement added");

        Ok(movement)
    }

    /// Edit a movement in place, keeping its id and kind
    pub fn update(
        &self,
        user_id: UserId,
        id: MovementId,
        changes: MovementUpdate,
    ) -> ContasResult<Movement> {
        let before = self.get_editable(user_id, id)?;
        let mut after = before.clone();

        if let Some(description) = changes.description {
            after.description = description.trim().to_string();
        }
        if let Some(amount) = changes.amount {
            after.amount = amount;
        }
        if let Some(category) = changes.category {
            after.category = category.trim().to_string();
        }
        if let Some(date) = changes.date {
            after.date = date;
        }
        if let Some(recurring) = changes.recurring {
            after.recurring = recurring;
        }
        if let Some(notes) = changes.notes {
            after.notes = notes.trim().to_string();
        }

        let touches_expense_fields = changes.payment_method.is_some()
            || changes.installment_total.is_some()
            || changes.installment_index.is_some();
        if touches_expense_fields && after.is_income() {
            return Err(ContasError::Validation(
                "Payment method and installments only apply to expenses".into(),
            ));
        }
        if let Some(method) = changes.payment_method {
            after.payment_method = Some(method);
        }
        if let Some(total) = changes.installment_total {
            check_installment_total(total)?;
            after.installment_total = total;
        }
        if let Some(index) = changes.installment_index {
            after.installment_index = index;
        }
        if after.is_expense() {
            after.normalize_installments();
            if after.category.is_empty() {
                after.category = DEFAULT_CATEGORY.to_string();
            }
        }

        after
            .validate()
            .map_err(|e| ContasError::Validation(e.to_string()))?;

        if after == before {
            return Ok(before);
        }
        after.updated_at = Utc::now();

        let mut uow = UnitOfWork::begin(self.ledger);
        uow.replace_movement(&before, &after)?;
        uow.commit()?;

        Ok(after)
    }

    /// Delete one movement; transfer legs must be removed with their transfer
    pub fn delete(&self, user_id: UserId, id: MovementId) -> ContasResult<Movement> {
        self.get_editable(user_id, id)?;

        let mut uow = UnitOfWork::begin(self.ledger);
        let removed = uow.remove_movement(id)?;
        uow.commit()?;

        tracing::debug!(movement = %id, "movement deleted");

        Ok(removed)
    }

    /// Newest first, optionally narrowed to a context and a month, capped at 200
    pub fn list(
        &self,
        user_id: UserId,
        context: Option<Context>,
        month: Option<MonthPeriod>,
    ) -> ContasResult<Vec<Movement>> {
        let mut movements =
            self.ledger
                .list_movements(user_id, context, month.map(|m| m.range()))?;
        movements.truncate(MOVEMENT_LIST_LIMIT);
        Ok(movements)
    }

    /// Find a movement by full or short id
    pub fn find(&self, user_id: UserId, identifier: &str) -> ContasResult<Option<Movement>> {
        Ok(self
            .ledger
            .list_movements(user_id, None, None)?
            .into_iter()
            .find(|m| m.id.matches(identifier)))
    }

    /// Pick the movement a free-text deletion request most likely refers to
    ///
    /// Considers movements dated in the 90 days up to `reference`, newest
    /// first, and returns the first whose description contains `needle`
    /// (case-insensitive) and, when given, whose amount is exactly `amount`.
    /// Transfer legs are never matched.
    pub fn find_deletion_match(
        &self,
        user_id: UserId,
        needle: &str,
        amount: Option<Money>,
        reference: NaiveDate,
    ) -> ContasResult<Option<Movement>> {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(None);
        }

        let window = DateRange::new(reference - Duration::days(DELETION_WINDOW_DAYS), reference);

        Ok(self
            .ledger
            .list_movements(user_id, None, Some(window))?
            .into_iter()
            .filter(|m| !m.is_transfer())
            .find(|m| {
                m.description.to_lowercase().contains(&needle)
                    && amount.map_or(true, |a| m.amount == a)
            }))
    }

    fn get_editable(&self, user_id: UserId, id: MovementId) -> ContasResult<Movement> {
        let movement = self
            .ledger
            .get_movement(user_id, id)?
            .ok_or_else(|| ContasError::movement_not_found(id.to_string()))?;

        if movement.is_transfer() {
            return Err(ContasError::Validation(format!(
                "Movement {} is part of a transfer; delete the transfer instead",
                id
            )));
        }

        Ok(movement)
    }

    fn ensure_context_exists(&self, user_id: UserId, context: Context) -> ContasResult<()> {
        if let Context::Business(id) = context {
            if self.ledger.get_business(user_id, id)?.is_none() {
                return Err(ContasError::business_not_found(id.to_string()));
            }
        }
        Ok(())
    }
}

fn check_installment_total(total: u32) -> ContasResult<()> {
    if total == 0 || total > MAX_EXPENSE_INSTALLMENTS {
        return Err(ContasError::Validation(format!(
            "Installments must be between 1 and {}",
            MAX_EXPENSE_INSTALLMENTS
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::ContasPaths;
    use crate::models::BusinessEntity;
    use crate::services::TransferService;
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

    fn draft(cents: i64, day: NaiveDate, description: &str) -> MovementDraft {
        MovementDraft::new(Money::from_cents(cents), day, Context::Personal, description)
    }

    #[test]
    fn test_add_expense_defaults() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let service = MovementService::new(&storage);

        let m = service
            .add_expense(user, draft(4590, date(2025, 1, 15), "  Market  "))
            .unwrap();

        assert_eq!(m.description, "Market");
        assert_eq!(m.category, DEFAULT_CATEGORY);
        assert_eq!(m.payment_method, Some(PaymentMethod::Pix));
        assert_eq!(storage.audit().read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_add_validates() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let service = MovementService::new(&storage);

        let err = service
            .add_expense(user, draft(0, date(2025, 1, 15), "Market"))
            .unwrap_err();
        assert!(err.is_validation());

        let err = service
            .add_expense(user, draft(100, date(2025, 1, 15), "   "))
            .unwrap_err();
        assert!(err.is_validation());

        let mut transfer_income = draft(100, date(2025, 1, 15), "Arcade");
        transfer_income.income_type = Some(IncomeType::Transfer);
        assert!(service.add_income(user, transfer_income).is_err());

        let mut unknown_business = draft(100, date(2025, 1, 15), "Flour");
        unknown_business.context = Context::Business(crate::models::BusinessId::new());
        let err = service.add_expense(user, unknown_business).unwrap_err();
        assert!(err.is_not_found());

        let mut too_many = draft(100, date(2025, 1, 15), "TV");
        too_many.installment_total = Some(100);
        assert!(service.add_expense(user, too_many).is_err());

        assert!(storage.list_movements(user, None, None).unwrap().is_empty());
    }

    #[test]
    fn test_installment_index_clamped() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let service = MovementService::new(&storage);

        let mut tv = draft(100000, date(2025, 1, 15), "TV");
        tv.installment_total = Some(10);
        tv.installment_index = Some(12);
        let m = service.add_expense(user, tv).unwrap();
        assert_eq!(m.installment_total, 10);
        assert_eq!(m.installment_index, 10);
    }

    #[test]
    fn test_update_preserves_identity() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let service = MovementService::new(&storage);

        let original = service
            .add_expense(user, draft(1500, date(2025, 1, 15), "Lunch"))
            .unwrap();

        let updated = service
            .update(
                user,
                original.id,
                MovementUpdate {
                    amount: Some(Money::from_cents(1800)),
                    category: Some("Food".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.kind, MovementKind::Expense);
        assert_eq!(updated.amount.cents(), 1800);
        assert_eq!(updated.created_at, original.created_at);

        let entries = storage.audit().read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[1]
            .diff_summary
            .as_deref()
            .unwrap()
            .contains("amount: 1500 -> 1800"));
    }

    #[test]
    fn test_update_income_rejects_expense_fields() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let service = MovementService::new(&storage);

        let salary = service
            .add_income(user, draft(300000, date(2025, 1, 5), "Salary"))
            .unwrap();
        let err = service
            .update(
                user,
                salary.id,
                MovementUpdate {
                    payment_method: Some(PaymentMethod::Cash),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_transfer_legs_are_protected() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let arcade = BusinessEntity::new(user, "Arcade", 0);
        storage.businesses.upsert(arcade.clone()).unwrap();

        let result = TransferService::new(&storage)
            .execute_transfer(user, Money::from_cents(1000), date(2025, 1, 5), arcade.context())
            .unwrap();

        let service = MovementService::new(&storage);
        assert!(service.delete(user, result.income.id).unwrap_err().is_validation());
        assert!(service
            .update(
                user,
                result.expense.id,
                MovementUpdate {
                    amount: Some(Money::from_cents(1)),
                    ..Default::default()
                }
            )
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_list_filters_by_context_and_month() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let arcade = BusinessEntity::new(user, "Arcade", 0);
        storage.businesses.upsert(arcade.clone()).unwrap();
        let service = MovementService::new(&storage);

        service.add_expense(user, draft(100, date(2025, 1, 2), "a")).unwrap();
        service.add_expense(user, draft(200, date(2025, 1, 20), "b")).unwrap();
        service.add_expense(user, draft(300, date(2025, 2, 1), "c")).unwrap();
        let mut biz = draft(400, date(2025, 1, 10), "d");
        biz.context = arcade.context();
        service.add_expense(user, biz).unwrap();

        let january = service
            .list(user, Some(Context::Personal), Some(MonthPeriod::new(2025, 1)))
            .unwrap();
        let descriptions: Vec<_> = january.iter().map(|m| m.description.as_str()).collect();
        assert_eq!(descriptions, vec!["b", "a"]);

        assert_eq!(service.list(user, None, None).unwrap().len(), 4);
    }

    #[test]
    fn test_deletion_match_heuristic() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let service = MovementService::new(&storage);
        let reference = date(2025, 6, 30);

        let old = service
            .add_expense(user, draft(5000, date(2025, 3, 1), "Uber to airport"))
            .unwrap();
        let older_recent = service
            .add_expense(user, draft(2500, date(2025, 6, 1), "Uber home"))
            .unwrap();
        let newest = service
            .add_expense(user, draft(1800, date(2025, 6, 20), "uber work"))
            .unwrap();

        let found = service
            .find_deletion_match(user, "UBER", None, reference)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, newest.id);

        let found = service
            .find_deletion_match(user, "uber", Some(Money::from_cents(2500)), reference)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, older_recent.id);

        // Outside the 90-day window
        let none = service
            .find_deletion_match(user, "airport", None, reference)
            .unwrap();
        assert!(none.is_none());
        assert!(service
            .find_deletion_match(user, "airport", None, date(2025, 5, 1))
            .unwrap()
            .is_some_and(|m| m.id == old.id));

        // Movements dated after the reference are outside the window too
        assert!(service
            .find_deletion_match(user, "uber", None, date(2025, 5, 20))
            .unwrap()
            .is_some_and(|m| m.id == old.id));
    }
}
