//! Summary command: the monthly financial snapshot

use crate::config::settings::Settings;
use crate::error::ContasResult;
use crate::reports::FinancialSnapshot;
use crate::services::resolve_context;
use crate::storage::Storage;

use super::parse_date;

/// Print the snapshot for the month of `date` (defaults to today)
pub fn handle_summary_command(
    storage: &Storage,
    settings: &Settings,
    date: Option<&str>,
    context: Option<&str>,
) -> ContasResult<()> {
    let user = settings.user_id;
    let reference = parse_date(date)?;
    let viewed = resolve_context(storage, user, context.unwrap_or(""))?;

    let snapshot =
        FinancialSnapshot::generate(storage, user, reference)?.with_viewed_context(viewed);
    print!("{}", snapshot.format_terminal());

    Ok(())
}
