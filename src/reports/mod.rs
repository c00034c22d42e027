//! Reports module for MendozaContas
//!
//! The financial snapshot, its chart aggregates, and card invoices.

pub mod charts;
pub mod invoice;
pub mod snapshot;

pub use charts::{
    category_expenses, daily_flow, export_categories_csv, export_daily_flow_csv, CategoryTotal,
    DailyFlow,
};
pub use invoice::CardInvoice;
pub use snapshot::{
    compute_snapshot, BusinessProjection, CardBill, FinancialSnapshot, ProjectionStatus,
};
