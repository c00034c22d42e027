//! Credit card service
//!
//! Card CRUD, charges, and invoices. Deleting a card leaves its charges in
//! place.

use chrono::{NaiveDate, Utc};

use crate::audit::{AuditEntry, EntityType};
use crate::error::{ContasError, ContasResult};
use crate::models::card::CardValidationError;
use crate::models::{CardAccount, CardCharge, CardId, Context, Money, UserId};
use crate::reports::CardInvoice;
use crate::storage::{LedgerReader, LedgerWriter};

use super::unit_of_work::record_audit;

/// Card edit; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct CardUpdate {
    pub name: Option<String>,
    pub credit_limit: Option<Money>,
    pub closing_day: Option<u32>,
    pub due_day: Option<u32>,
}

/// A card with its number of recorded charges
#[derive(Debug, Clone)]
pub struct CardSummary {
    pub card: CardAccount,
    pub charge_count: usize,
}

/// Service for credit card management
pub struct CardService<'a, S: LedgerReader + LedgerWriter> {
    ledger: &'a S,
}

fn validation_error(err: CardValidationError) -> ContasError {
    if err.is_day_error() {
        ContasError::InvalidConfiguration(err.to_string())
    } else {
        ContasError::Validation(err.to_string())
    }
}

impl<'a, S: LedgerReader + LedgerWriter> CardService<'a, S> {
    pub fn new(ledger: &'a S) -> Self {
        Self { ledger }
    }

    /// Create a card
    ///
    /// Closing and due days outside 1-31 fail with `InvalidConfiguration`.
    pub fn create(
        &self,
        user_id: UserId,
        name: &str,
        closing_day: u32,
        due_day: u32,
        credit_limit: Money,
        context: Context,
    ) -> ContasResult<CardAccount> {
        let name = name.trim();
        if self.ledger.find_card_by_name(user_id, name)?.is_some() {
            return Err(ContasError::Validation(format!(
                "A card named '{}' already exists",
                name
            )));
        }
        if let Context::Business(id) = context {
            if self.ledger.get_business(user_id, id)?.is_none() {
                return Err(ContasError::business_not_found(id.to_string()));
            }
        }

        let mut card = CardAccount::new(user_id, name, closing_day, due_day, context);
        card.credit_limit = credit_limit;
        card.validate().map_err(validation_error)?;

        self.ledger.save_card(card.clone())?;

        record_audit(
            self.ledger,
            &AuditEntry::create(
                EntityType::Card,
                card.id.to_string(),
                Some(card.name.clone()),
                &card,
            ),
        );

        Ok(card)
    }

    pub fn update(
        &self,
        user_id: UserId,
        id: CardId,
        changes: CardUpdate,
    ) -> ContasResult<CardAccount> {
        let before = self.get(user_id, id)?;
        let mut after = before.clone();

        if let Some(name) = changes.name {
            let name = name.trim().to_string();
            if let Some(existing) = self.ledger.find_card_by_name(user_id, &name)? {
                if existing.id != id {
                    return Err(ContasError::Validation(format!(
                        "A card named '{}' already exists",
                        name
                    )));
                }
            }
            after.name = name;
        }
        if let Some(limit) = changes.credit_limit {
            after.credit_limit = limit;
        }
        if let Some(day) = changes.closing_day {
            after.closing_day = day;
        }
        if let Some(day) = changes.due_day {
            after.due_day = day;
        }

        after.validate().map_err(validation_error)?;
        after.updated_at = Utc::now();

        self.ledger.save_card(after.clone())?;

        record_audit(
            self.ledger,
            &AuditEntry::update(
                EntityType::Card,
                after.id.to_string(),
                Some(after.name.clone()),
                &before,
                &after,
            ),
        );

        Ok(after)
    }

    /// Delete a card; charges made on it are kept
    pub fn delete(&self, user_id: UserId, id: CardId) -> ContasResult<CardAccount> {
        let card = self.get(user_id, id)?;

        self.ledger.delete_card(id)?;

        record_audit(
            self.ledger,
            &AuditEntry::delete(
                EntityType::Card,
                card.id.to_string(),
                Some(card.name.clone()),
                &card,
            ),
        );

        Ok(card)
    }

    /// Record a purchase on a card
    ///
    /// Installments are clamped to 1-24 and a blank category becomes
    /// "Other". The charge takes the card's context.
    #[allow(clippy::too_many_arguments)]
    pub fn add_charge(
        &self,
        user_id: UserId,
        card_id: CardId,
        description: &str,
        amount: Money,
        purchase_date: NaiveDate,
        installments: u32,
        category: &str,
    ) -> ContasResult<CardCharge> {
        let card = self.get(user_id, card_id)?;

        let charge = CardCharge::new(&card, description.trim(), amount, purchase_date)
            .with_installments(installments)
            .with_category(category);
        charge.validate().map_err(ContasError::Validation)?;

        self.ledger.save_card_charge(charge.clone())?;

        record_audit(
            self.ledger,
            &AuditEntry::create(
                EntityType::CardCharge,
                charge.id.to_string(),
                Some(charge.description.clone()),
                &charge,
            ),
        );

        Ok(charge)
    }

    /// Invoice of the cycle containing `reference`
    pub fn invoice(
        &self,
        user_id: UserId,
        card_id: CardId,
        reference: NaiveDate,
    ) -> ContasResult<CardInvoice> {
        let card = self.get(user_id, card_id)?;
        CardInvoice::generate(self.ledger, &card, reference)
    }

    pub fn get(&self, user_id: UserId, id: CardId) -> ContasResult<CardAccount> {
        self.ledger
            .get_card(user_id, id)?
            .ok_or_else(|| ContasError::card_not_found(id.to_string()))
    }

    /// Find a card by name or id
    pub fn find(&self, user_id: UserId, identifier: &str) -> ContasResult<Option<CardAccount>> {
        if let Some(card) = self.ledger.find_card_by_name(user_id, identifier)? {
            return Ok(Some(card));
        }
        Ok(self
            .ledger
            .list_cards(user_id)?
            .into_iter()
            .find(|c| c.id.matches(identifier)))
    }

    /// All cards of the user with their charge counts
    pub fn list(&self, user_id: UserId) -> ContasResult<Vec<CardSummary>> {
        self.ledger
            .list_cards(user_id)?
            .into_iter()
            .map(|card| {
                let charge_count = self.ledger.count_card_charges(card.id)?;
                Ok(CardSummary { card, charge_count })
            })
            .collect()
    }
}
