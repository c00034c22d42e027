//! Assistant batch processor
//!
//! Turns the language-model collaborator's structured response into ledger
//! writes. Each item is validated on its own; a bad item is counted and
//! skipped while its siblings still go through.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Number, Value};
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{ContasError, ContasResult};
use crate::models::{
    BusinessId, Context, IncomeType, Money, Movement, MovementKind, PaymentMethod, UserId,
    MAX_AMOUNT,
};
use crate::reports::{FinancialSnapshot, ProjectionStatus};
use crate::storage::{LedgerReader, LedgerWriter};

use super::business::resolve_context;
use super::movement::{MovementDraft, MovementService, DELETION_WINDOW_DAYS};

pub const MAX_DESCRIPTION_CHARS: usize = 500;
pub const MAX_CATEGORY_CHARS: usize = 100;

const NO_DESCRIPTION: &str = "No description";

/// Instructions sent to the collaborator alongside every request
pub const SYSTEM_PROMPT: &str = concat!(
    "You are a personal finance assistant. The user writes about expenses and incomes ",
    r#"(e.g. "yesterday I spent 200 on groceries, personal", "we paid Pedro 91 from Arcade") "#,
    "or asks to remove one.\n",
    "Answer ONLY with JSON, no text before or after, shaped as ",
    r#"{"reply": "<short answer>", "items": [...]}."#,
    "\nEach item is one of:\n",
    r#"- {"action": "create", "kind": "expense" | "income", "description": "<short text>", "#,
    r#""amount": <positive number>, "date": "YYYY-MM-DD", "#,
    r#""context": "personal" | "<business name>", "category": "<category>", "#,
    r#""payment_method": "pix" | "cash" | "card", "#,
    r#""income_type": "fixed" | "extra" | "business_daily"}"#,
    "\n",
    r#"- {"action": "delete", "description_contains": "<text>", "amount": <positive number>}"#,
    "\nRules: amounts are in reais; one message may produce several items; ",
    r#""date" defaults to today, "context" to personal; "#,
    "payment_method is only for expenses and income_type only for incomes; ",
    "omit fields you cannot infer; use no other fields. If nothing can be identified, ",
    r#"return {"reply": "<answer>", "items": []}."#,
);

/// Reply used when a response contained nothing usable
pub const NO_ITEMS_HINT: &str = concat!(
    "I did not find any expense or income in your message. Try something like: ",
    r#""Yesterday I spent 200 at the market, personal" or "We paid Pedro 91 from Arcade"."#,
);

/// A message plus the ledger context the collaborator needs to interpret it
#[derive(Debug, Clone)]
pub struct AssistantRequest {
    pub message: String,
    pub today: NaiveDate,
    pub yesterday: NaiveDate,
    pub personal_balance: Money,
    pub status: ProjectionStatus,
    pub spendable_margin: Money,
    pub businesses: Vec<String>,
}

impl AssistantRequest {
    pub fn context_block(&self) -> String {
        let businesses = if self.businesses.is_empty() {
            "none".to_string()
        } else {
            self.businesses.join(", ")
        };
        format!(
            "Today: {}. Yesterday: {}.\n\
             Personal balance this month: {}. Status: {}. Safe to spend: {}.\n\
             Businesses: {}.",
            self.today,
            self.yesterday,
            self.personal_balance,
            self.status,
            self.spendable_margin,
            businesses
        )
    }

    /// The full text sent to the collaborator after the system prompt
    pub fn user_prompt(&self) -> String {
        format!("{}\n\nUser message:\n{}", self.context_block(), self.message)
    }
}

/// The language-model collaborator
///
/// Returns the raw response text; parsing and validation happen here.
pub trait AssistantBackend {
    fn interpret(&self, request: &AssistantRequest) -> ContasResult<String>;
}

impl<F> AssistantBackend for F
where
    F: Fn(&AssistantRequest) -> ContasResult<String>,
{
    fn interpret(&self, request: &AssistantRequest) -> ContasResult<String> {
        self(request)
    }
}

/// A response captured ahead of time, e.g. read from a file
#[derive(Debug, Clone)]
pub struct RecordedResponse {
    text: String,
}

impl RecordedResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl AssistantBackend for RecordedResponse {
    fn interpret(&self, _request: &AssistantRequest) -> ContasResult<String> {
        Ok(self.text.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateItem {
    pub kind: MovementKind,
    pub description: String,
    pub amount: Money,
    pub date: NaiveDate,
    /// Raw context text, resolved against the user's businesses when applied
    pub context: Option<String>,
    pub category: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub income_type: Option<IncomeType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteItem {
    pub description_contains: String,
    pub amount: Option<Money>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssistantItem {
    Create(CreateItem),
    Delete(DeleteItem),
}

/// Outcome of validating one element of the response
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedItem {
    Ok(AssistantItem),
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub reply: Option<String>,
    pub items: Vec<ParsedItem>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
enum RawItem {
    Create(RawCreate),
    Delete(RawDelete),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawKind {
    Expense,
    Income,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCreate {
    kind: RawKind,
    description: String,
    amount: Number,
    date: Option<String>,
    context: Option<String>,
    category: Option<String>,
    payment_method: Option<String>,
    income_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDelete {
    description_contains: String,
    amount: Option<Number>,
}

/// Parse a raw collaborator response
///
/// Accepts `{"reply": ..., "items": [...]}` or a bare array, optionally
/// inside a ```json fence. Text that is not JSON, or JSON of another shape,
/// is `MalformedInput`.
pub fn parse_response(raw: &str, today: NaiveDate) -> ContasResult<ParsedResponse> {
    let body = strip_fence(raw);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ContasError::MalformedInput(format!("response is not valid JSON: {}", e)))?;

    let (reply, elements) = match value {
        Value::Array(elements) => (None, elements),
        Value::Object(mut map) => {
            let reply = match map.remove("reply") {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s),
                Some(_) => {
                    return Err(ContasError::MalformedInput("\"reply\" must be a string".into()))
                }
            };
            let elements = match map.remove("items") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(items)) => items,
                Some(_) => {
                    return Err(ContasError::MalformedInput("\"items\" must be an array".into()))
                }
            };
            (reply, elements)
        }
        _ => {
            return Err(ContasError::MalformedInput(
                "expected an object with items or an array of items".into(),
            ))
        }
    };

    let items = elements
        .into_iter()
        .map(|element| match validate_item(element, today) {
            Ok(item) => ParsedItem::Ok(item),
            Err(reason) => ParsedItem::Rejected(reason),
        })
        .collect();

    Ok(ParsedResponse { reply, items })
}

fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(start) = trimmed.find("```") {
        let rest = &trimmed[start + 3..];
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        if let Some(end) = rest.find("```") {
            return rest[..end].trim();
        }
    }
    trimmed
}

fn validate_item(element: Value, today: NaiveDate) -> Result<AssistantItem, String> {
    let raw: RawItem = serde_json::from_value(element).map_err(|e| e.to_string())?;

    match raw {
        RawItem::Create(raw) => {
            let kind = match raw.kind {
                RawKind::Expense => MovementKind::Expense,
                RawKind::Income => MovementKind::Income,
            };

            let amount = positive_amount(&raw.amount)?;

            let date = match raw.date.as_deref().map(str::trim) {
                None | Some("") => today,
                Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .map_err(|_| format!("date '{}' is not YYYY-MM-DD", text))?,
            };

            let payment_method = match non_blank(raw.payment_method) {
                None => None,
                Some(_) if kind == MovementKind::Income => {
                    return Err("payment_method only applies to expenses".into())
                }
                Some(text) => Some(
                    PaymentMethod::parse(&text)
                        .ok_or_else(|| format!("unknown payment_method '{}'", text))?,
                ),
            };

            let income_type = match non_blank(raw.income_type) {
                None => None,
                Some(_) if kind == MovementKind::Expense => {
                    return Err("income_type only applies to incomes".into())
                }
                Some(text) => match IncomeType::parse(&text) {
                    Some(IncomeType::Transfer) => {
                        return Err("transfer incomes cannot be created here".into())
                    }
                    Some(t) => Some(t),
                    None => return Err(format!("unknown income_type '{}'", text)),
                },
            };

            let description = truncate_chars(raw.description.trim(), MAX_DESCRIPTION_CHARS);
            let description = if description.is_empty() {
                NO_DESCRIPTION.to_string()
            } else {
                description
            };

            Ok(AssistantItem::Create(CreateItem {
                kind,
                description,
                amount,
                date,
                context: non_blank(raw.context),
                category: non_blank(raw.category).map(|c| truncate_chars(&c, MAX_CATEGORY_CHARS)),
                payment_method,
                income_type,
            }))
        }
        RawItem::Delete(raw) => {
            let needle = raw.description_contains.trim();
            if needle.is_empty() {
                return Err("description_contains cannot be empty".into());
            }
            let amount = raw.amount.as_ref().map(positive_amount).transpose()?;
            Ok(AssistantItem::Delete(DeleteItem {
                description_contains: truncate_chars(needle, MAX_DESCRIPTION_CHARS),
                amount,
            }))
        }
    }
}

fn positive_amount(number: &Number) -> Result<Money, String> {
    let text = number.to_string();
    let value = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| format!("amount {} is out of range", text))?;
    let amount = Money::checked_from_decimal(value)
        .filter(Money::is_within_limit)
        .ok_or_else(|| format!("amount {} exceeds the maximum of {}", text, MAX_AMOUNT))?;
    if amount.is_positive() {
        Ok(amount)
    } else {
        Err(format!("amount must be positive, got {}", text))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// What a batch did
#[derive(Debug, Clone)]
pub struct AssistantOutcome {
    pub created: Vec<Movement>,
    pub deleted: Vec<Movement>,
    pub errors: Vec<String>,
    pub reply: String,
}

/// Service applying collaborator responses to the ledger
pub struct AssistantService<'a, S: LedgerReader + LedgerWriter> {
    ledger: &'a S,
}

impl<'a, S: LedgerReader + LedgerWriter> AssistantService<'a, S> {
    pub fn new(ledger: &'a S) -> Self {
        Self { ledger }
    }

    /// Build the request for `message`, with a context block as of `today`
    pub fn build_request(
        &self,
        user_id: UserId,
        message: &str,
        today: NaiveDate,
    ) -> ContasResult<AssistantRequest> {
        let snapshot = FinancialSnapshot::generate(self.ledger, user_id, today)?;
        let businesses = self
            .ledger
            .list_businesses(user_id)?
            .into_iter()
            .map(|b| b.name)
            .collect();

        Ok(AssistantRequest {
            message: message.trim().to_string(),
            today,
            yesterday: today - Duration::days(1),
            personal_balance: snapshot.current_balance_personal,
            status: snapshot.status,
            spendable_margin: snapshot.spendable_margin,
            businesses,
        })
    }

    /// Ask the collaborator about `message` and apply its answer
    pub fn ask<B: AssistantBackend + ?Sized>(
        &self,
        backend: &B,
        user_id: UserId,
        message: &str,
        today: NaiveDate,
    ) -> ContasResult<AssistantOutcome> {
        let request = self.build_request(user_id, message, today)?;
        let raw = backend.interpret(&request)?;
        self.apply(user_id, &raw, today)
    }

    /// Apply a raw collaborator response
    pub fn apply(
        &self,
        user_id: UserId,
        raw: &str,
        today: NaiveDate,
    ) -> ContasResult<AssistantOutcome> {
        let parsed = parse_response(raw, today)?;
        let movements = MovementService::new(self.ledger);

        let mut created = Vec::new();
        let mut deleted = Vec::new();
        let mut errors = Vec::new();

        for (index, item) in parsed.items.into_iter().enumerate() {
            let position = index + 1;
            match item {
                ParsedItem::Rejected(reason) => {
                    tracing::debug!(item = position, %reason, "assistant item rejected");
                    errors.push(format!("item {}: {}", position, reason));
                }
                ParsedItem::Ok(AssistantItem::Create(item)) => {
                    match self.create(&movements, user_id, item) {
                        Ok(movement) => created.push(movement),
                        Err(message) => errors.push(format!("item {}: {}", position, message)),
                    }
                }
                ParsedItem::Ok(AssistantItem::Delete(item)) => {
                    let found = movements.find_deletion_match(
                        user_id,
                        &item.description_contains,
                        item.amount,
                        today,
                    )?;
                    match found {
                        Some(movement) => match movements.delete(user_id, movement.id) {
                            Ok(removed) => deleted.push(removed),
                            Err(err) => errors.push(format!(
                                "item {}: could not delete '{}' ({})",
                                position, movement.description, err
                            )),
                        },
                        None => errors.push(format!(
                            "item {}: nothing matching '{}' in the last {} days",
                            position, item.description_contains, DELETION_WINDOW_DAYS
                        )),
                    }
                }
            }
        }

        tracing::info!(
            created = created.len(),
            deleted = deleted.len(),
            errors = errors.len(),
            "assistant batch applied"
        );

        let names: HashMap<BusinessId, String> = self
            .ledger
            .list_businesses(user_id)?
            .into_iter()
            .map(|b| (b.id, b.name))
            .collect();
        let reply = compose_reply(parsed.reply.as_deref(), &created, &deleted, &errors, &names);

        Ok(AssistantOutcome {
            created,
            deleted,
            errors,
            reply,
        })
    }

    fn create(
        &self,
        movements: &MovementService<'_, S>,
        user_id: UserId,
        item: CreateItem,
    ) -> Result<Movement, String> {
        let context_text = item.context.unwrap_or_default();
        let context = resolve_context(self.ledger, user_id, &context_text)
            .map_err(|_| format!("unknown context '{}'", context_text))?;

        let mut draft =
            MovementDraft::new(item.amount, item.date, context, item.description.clone());
        draft.category = item.category;
        draft.payment_method = item.payment_method;
        draft.income_type = item.income_type;

        let result = match item.kind {
            MovementKind::Expense => movements.add_expense(user_id, draft),
            MovementKind::Income => movements.add_income(user_id, draft),
        };
        result.map_err(|err| format!("{}: could not save ({})", item.description, err))
    }
}

fn describe(movement: &Movement, names: &HashMap<BusinessId, String>) -> String {
    let context = match movement.context {
        Context::Personal => "Personal".to_string(),
        Context::Business(id) => names.get(&id).cloned().unwrap_or_else(|| id.to_string()),
    };
    format!(
        "• {}, {} ({}, {})",
        movement.description, movement.amount, context, movement.date
    )
}

fn compose_reply(
    collaborator: Option<&str>,
    created: &[Movement],
    deleted: &[Movement],
    errors: &[String],
    names: &HashMap<BusinessId, String>,
) -> String {
    let mut sections = Vec::new();

    if let Some(text) = collaborator.map(str::trim).filter(|t| !t.is_empty()) {
        sections.push(text.to_string());
    }
    if !created.is_empty() {
        let lines: Vec<_> = created.iter().map(|m| describe(m, names)).collect();
        sections.push(format!("Recorded {} item(s):\n{}", created.len(), lines.join("\n")));
    }
    if !deleted.is_empty() {
        let lines: Vec<_> = deleted.iter().map(|m| describe(m, names)).collect();
        sections.push(format!("Removed {} item(s):\n{}", deleted.len(), lines.join("\n")));
    }
    if sections.is_empty() && errors.is_empty() {
        sections.push(NO_ITEMS_HINT.to_string());
    }
    if !errors.is_empty() {
        sections.push(format!(
            "Some items could not be processed: {}",
            errors.join("; ")
        ));
    }

    sections.join("\n\n")
}
