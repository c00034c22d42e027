//! Display formatting for terminal output
//!
//! Provides utilities for formatting data models for terminal display as
//! tables and detail views.

pub mod business;
pub mod card;
pub mod movement;

pub use business::{format_business_list, format_transfer_list};
pub use card::{format_card_details, format_card_list, format_charge};
pub use movement::{context_label, format_movement_details, format_movement_list};
