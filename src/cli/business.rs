//! Business entity CLI commands

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::format_business_list;
use crate::error::{ContasError, ContasResult};
use crate::services::BusinessService;
use crate::storage::Storage;

/// Business subcommands
#[derive(Subcommand, Debug)]
pub enum BusinessCommands {
    /// Create a business context
    Create {
        name: String,
        /// Position in listings (defaults to last)
        #[arg(short, long)]
        order: Option<i32>,
    },
    /// List businesses
    List,
    /// Rename or reorder a business
    Edit {
        /// Business name or ID
        business: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        order: Option<i32>,
    },
    /// Delete a business; its records keep their context
    Delete {
        /// Business name or ID
        business: String,
    },
}

/// Handle a business command
pub fn handle_business_command(
    storage: &Storage,
    settings: &Settings,
    cmd: BusinessCommands,
) -> ContasResult<()> {
    let user = settings.user_id;
    let service = BusinessService::new(storage);

    match cmd {
        BusinessCommands::Create { name, order } => {
            let business = service.create(user, &name, order)?;
            println!("Created business: {}", business.name);
            println!("  ID: {}", business.id);
        }

        BusinessCommands::List => {
            print!("{}", format_business_list(&service.list(user)?));
        }

        BusinessCommands::Edit {
            business,
            name,
            order,
        } => {
            let found = service
                .find(user, &business)?
                .ok_or_else(|| ContasError::business_not_found(&business))?;

            if name.is_none() && order.is_none() {
                println!("No changes specified. Use --name or --order.");
                return Ok(());
            }

            let updated = service.update(user, found.id, name.as_deref(), order)?;
            println!("Updated business: {} (order {})", updated.name, updated.order);
        }

        BusinessCommands::Delete { business } => {
            let found = service
                .find(user, &business)?
                .ok_or_else(|| ContasError::business_not_found(&business))?;
            let deleted = service.delete(user, found.id)?;
            println!("Deleted business: {}", deleted.name);
        }
    }

    Ok(())
}
