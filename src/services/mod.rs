//! Service layer for MendozaContas
//!
//! The service layer provides business logic on top of the storage layer,
//! handling validation, cross-context operations, and the assistant batch
//! processor.

pub mod assistant;
pub mod business;
pub mod card;
pub mod movement;
pub mod transfer;
pub mod unit_of_work;

pub use assistant::{
    parse_response, AssistantBackend, AssistantItem, AssistantOutcome, AssistantRequest,
    AssistantService, ParsedItem, RecordedResponse, SYSTEM_PROMPT,
};
pub use business::{resolve_context, BusinessService};
pub use card::{CardService, CardSummary, CardUpdate};
pub use movement::{MovementDraft, MovementService, MovementUpdate};
pub use transfer::{TransferResult, TransferService};
pub use unit_of_work::UnitOfWork;
