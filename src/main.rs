use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use mendoza_contas::cli::{
    handle_assistant_command, handle_business_command, handle_card_command,
    handle_expense_command, handle_income_command, handle_report_command, handle_summary_command,
    handle_transfer_command, AssistantCommands, BusinessCommands, CardCommands, ExpenseCommands,
    IncomeCommands, ReportCommands, TransferCommands,
};
use mendoza_contas::config::{paths::ContasPaths, settings::Settings};
use mendoza_contas::storage::{init::initialize_storage, Storage};

#[derive(Parser)]
#[command(
    name = "contas",
    version,
    about = "Personal and small-business finance tracker",
    long_about = "MendozaContas keeps incomes and expenses for your personal life and \
                  your businesses apart, tracks credit card billing cycles, and tells \
                  you how much you can still spend this month."
)]
struct Cli {
    /// Data directory (defaults to the platform config directory)
    #[arg(long, global = true, env = "MENDOZA_CONTAS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory
    Init,

    /// Show current configuration and paths
    Config {
        /// Also show the N most recent audit log entries
        #[arg(long, value_name = "N")]
        audit: Option<usize>,
    },

    /// Monthly summary: balance, projection, status and safe-to-spend margin
    Summary {
        /// Any date in the month (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        /// Context to view: "personal" or a business name
        #[arg(short, long)]
        context: Option<String>,
    },

    /// Income management commands
    #[command(subcommand)]
    Income(IncomeCommands),

    /// Expense management commands
    #[command(subcommand)]
    Expense(ExpenseCommands),

    /// Credit card commands
    #[command(subcommand)]
    Card(CardCommands),

    /// Business context commands
    #[command(subcommand)]
    Business(BusinessCommands),

    /// Business-to-personal transfer commands
    #[command(subcommand)]
    Transfer(TransferCommands),

    /// Natural-language assistant commands
    #[command(subcommand)]
    Assistant(AssistantCommands),

    /// Reports and CSV export
    #[command(subcommand)]
    Report(ReportCommands),
}

fn main() -> Result<()> {
    mendoza_contas::init_tracing();
    let cli = Cli::parse();

    let paths = match cli.data_dir {
        Some(dir) => ContasPaths::with_base_dir(dir),
        None => ContasPaths::new()?,
    };

    let command = match cli.command {
        Some(command) => command,
        None => {
            println!("MendozaContas - personal and small-business finance tracker");
            println!();
            println!("Run 'contas --help' for usage information.");
            return Ok(());
        }
    };

    match command {
        Commands::Init => {
            println!("Initializing MendozaContas at: {}", paths.base_dir().display());
            let settings = initialize_storage(&paths)?;
            println!("Initialization complete!");
            println!("  User ID: {}", settings.user_id);
            println!();
            println!("Next steps:");
            println!("  contas business create <name>");
            println!("  contas expense add <amount> <description>");
            println!("  contas summary");
            return Ok(());
        }
        Commands::Config { audit } => {
            let settings = Settings::load_or_create(&paths)?;
            println!("MendozaContas Configuration");
            println!("===========================");
            println!("Base directory:  {}", paths.base_dir().display());
            println!("Data directory:  {}", paths.data_dir().display());
            println!("Settings file:   {}", paths.settings_file().display());
            println!("Audit log:       {}", paths.audit_log().display());
            println!("Initialized:     {}", if paths.is_initialized() { "Yes" } else { "No" });
            println!();
            println!("Settings:");
            println!("  User ID:                {}", settings.user_id);
            println!("  Currency symbol:        {}", settings.currency_symbol);
            println!("  Date format:            {}", settings.date_format);
            println!("  Default payment method: {}", settings.default_payment_method);

            if let Some(count) = audit {
                let storage = Storage::new(paths.clone())?;
                let entries = storage.audit().read_recent(count)?;
                println!();
                println!("Recent activity:");
                if entries.is_empty() {
                    println!("  (none)");
                }
                for entry in entries {
                    println!("  {}", entry.format_human_readable());
                }
            }
            return Ok(());
        }
        _ => {}
    }

    // Every record carries the user id, so it must be on disk before any write
    let settings = if paths.is_initialized() {
        Settings::load_or_create(&paths)?
    } else {
        initialize_storage(&paths)?
    };

    let mut storage = Storage::new(paths)?;
    storage.load_all()?;

    let result = match command {
        Commands::Summary { date, context } => {
            handle_summary_command(&storage, &settings, date.as_deref(), context.as_deref())
        }
        Commands::Income(cmd) => handle_income_command(&storage, &settings, cmd),
        Commands::Expense(cmd) => handle_expense_command(&storage, &settings, cmd),
        Commands::Card(cmd) => handle_card_command(&storage, &settings, cmd),
        Commands::Business(cmd) => handle_business_command(&storage, &settings, cmd),
        Commands::Transfer(cmd) => handle_transfer_command(&storage, &settings, cmd),
        Commands::Assistant(cmd) => handle_assistant_command(&storage, &settings, cmd),
        Commands::Report(cmd) => handle_report_command(&storage, &settings, cmd),
        Commands::Init | Commands::Config { .. } => Ok(()),
    };

    result.map_err(|e| anyhow::anyhow!(e.user_message()))
}
