//! Assistant CLI commands
//!
//! The language model itself lives outside this tool: `prompt` prints what
//! would be sent to it and `apply` processes a response it produced.

use clap::Subcommand;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::settings::Settings;
use crate::error::{ContasError, ContasResult};
use crate::services::{AssistantService, RecordedResponse, SYSTEM_PROMPT};
use crate::storage::Storage;

use super::today;

/// Assistant subcommands
#[derive(Subcommand, Debug)]
pub enum AssistantCommands {
    /// Apply a collaborator response to the ledger
    Apply {
        /// Response file, or "-" for stdin
        file: PathBuf,
        /// Message the response answers
        #[arg(short, long, default_value = "")]
        message: String,
    },
    /// Print the request that would be sent for a message
    Prompt {
        message: String,
        /// Include the system prompt
        #[arg(long)]
        system: bool,
    },
}

fn read_response(file: &Path) -> ContasResult<String> {
    if file.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| ContasError::Io(format!("Failed to read stdin: {}", e)))?;
        Ok(text)
    } else {
        std::fs::read_to_string(file)
            .map_err(|e| ContasError::Io(format!("Failed to read {}: {}", file.display(), e)))
    }
}

/// Handle an assistant command
pub fn handle_assistant_command(
    storage: &Storage,
    settings: &Settings,
    cmd: AssistantCommands,
) -> ContasResult<()> {
    let user = settings.user_id;
    let service = AssistantService::new(storage);

    match cmd {
        AssistantCommands::Apply { file, message } => {
            let backend = RecordedResponse::new(read_response(&file)?);
            let outcome = service.ask(&backend, user, &message, today())?;
            println!("{}", outcome.reply);
        }

        AssistantCommands::Prompt { message, system } => {
            if message.trim().is_empty() {
                return Err(ContasError::Validation("Message cannot be empty".into()));
            }
            let request = service.build_request(user, &message, today())?;
            if system {
                println!("{}", SYSTEM_PROMPT);
                println!();
            }
            println!("{}", request.user_prompt());
        }
    }

    Ok(())
}
