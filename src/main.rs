use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use gnucash_books::cli::{
    handle_account_command, handle_audit_command, handle_backup_command, handle_book_command,
    handle_dropbox_command, handle_export_command, handle_import_command, handle_prefs_command,
    handle_settings_command, handle_transaction_command,
};
use gnucash_books::config::paths::BookPaths;
use gnucash_books::context::AppContext;
use gnucash_books::logging;
use gnucash_books::storage::initialize_storage;

#[derive(Parser)]
#[command(
    name = "gnucash-books",
    version,
    about = "Manage multiple GnuCash-style books from the command line",
    long_about = "gnucash-books keeps several books side by side, each with its own \
                  accounts, transactions, preferences and backups. One book is active \
                  at a time; most commands act on it."
)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log format: human or json (defaults to the configured format)
    #[arg(long, value_parser = parse_log_format)]
    log_format: Option<gnucash_books::config::settings::LogFormat>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and the first book
    Init,

    /// Book management commands
    #[command(subcommand)]
    Book(gnucash_books::cli::BookCommands),

    /// Backup management commands
    #[command(subcommand)]
    Backup(gnucash_books::cli::BackupCommands),

    /// Import a book archive (JSON or YAML) as a new book
    Import {
        /// Path to the archive
        file: PathBuf,
    },

    /// Export the active book
    Export(gnucash_books::cli::ExportArgs),

    /// Per-book preferences
    #[command(subcommand, alias = "pref")]
    Prefs(gnucash_books::cli::PrefsCommands),

    /// Account commands for the active book
    #[command(subcommand)]
    Account(gnucash_books::cli::AccountCommands),

    /// Transaction commands for the active book
    #[command(subcommand, alias = "txn")]
    Transaction(gnucash_books::cli::TransactionCommands),

    /// Dropbox account link
    #[command(subcommand)]
    Dropbox(gnucash_books::cli::DropboxCommands),

    /// Show a settings screen
    Settings(gnucash_books::cli::SettingsArgs),

    /// Show current configuration and paths
    Config,

    /// Show recent audit log entries
    Audit {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

fn parse_log_format(s: &str) -> Result<gnucash_books::config::settings::LogFormat, String> {
    logging::parse_format(s).ok_or_else(|| format!("unknown log format '{}'", s))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = BookPaths::new()?;
    let ctx = AppContext::open(paths)?;
    logging::init(
        cli.verbose,
        cli.log_format.unwrap_or(ctx.settings().log_format),
    );

    let first_book = initialize_storage(ctx.storage())?;
    let repository = ctx.repository();

    match cli.command {
        Some(Commands::Init) => {
            println!(
                "Initializing gnucash-books at: {}",
                ctx.paths().base_dir().display()
            );
            ctx.settings().save(ctx.paths())?;
            match first_book {
                Some(book) => {
                    println!("Created and opened book '{}' ({})", book.display_name, book.uid);
                    println!();
                    println!("Run 'gnucash-books account defaults' to create a starter account tree.");
                }
                None => {
                    let active = ctx.storage().books().active_book_display_name()?;
                    println!("Already initialized. Active book: {}", active);
                }
            }
        }
        Some(Commands::Book(cmd)) => handle_book_command(&repository, cmd)?,
        Some(Commands::Backup(cmd)) => handle_backup_command(&repository, cmd)?,
        Some(Commands::Import { file }) => handle_import_command(&repository, &file)?,
        Some(Commands::Export(args)) => {
            handle_export_command(&repository, &ctx.exporter(), args)?
        }
        Some(Commands::Prefs(cmd)) => handle_prefs_command(&repository, cmd)?,
        Some(Commands::Account(cmd)) => handle_account_command(&repository, cmd)?,
        Some(Commands::Transaction(cmd)) => handle_transaction_command(&repository, cmd)?,
        Some(Commands::Dropbox(cmd)) => handle_dropbox_command(&ctx.dropbox_helper(), cmd)?,
        Some(Commands::Settings(args)) => handle_settings_command(ctx.settings_host(), args)?,
        Some(Commands::Config) => {
            let paths = ctx.paths();
            let settings = ctx.settings();
            println!("gnucash-books Configuration");
            println!("===========================");
            println!("Data directory:   {}", paths.base_dir().display());
            println!("Books registry:   {}", paths.books_file().display());
            println!("Backup directory: {}", paths.backup_dir().display());
            println!("Audit log:        {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!(
                "  Backup retention: {} daily, {} monthly",
                settings.backup_retention.daily_count, settings.backup_retention.monthly_count
            );
            println!("  Backup interval:  {}h", settings.backup_interval_hours);
            println!(
                "  Dropbox linked:   {}",
                if settings.dropbox_access_token.is_some() { "yes" } else { "no" }
            );
            println!("  Log format:       {:?}", settings.log_format);
        }
        Some(Commands::Audit { limit }) => handle_audit_command(repository.audit(), limit)?,
        None => {
            let active = ctx.storage().books().active_book_display_name()?;
            println!("gnucash-books - active book: {}", active);
            println!();
            println!("Run 'gnucash-books --help' for usage information.");
        }
    }

    Ok(())
}
