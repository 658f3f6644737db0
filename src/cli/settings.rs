//! Settings screens on the terminal

use clap::Args;

use crate::error::BooksResult;
use crate::ui::settings::{SettingsHost, ACTION_MANAGE_BOOKS};

#[derive(Args)]
pub struct SettingsArgs {
    /// Start on the book manager
    #[arg(long)]
    pub manage_books: bool,

    /// Screens to open in order, e.g. `accounts`
    pub screens: Vec<String>,
}

/// Open the settings host, walk to the requested screen and print it
pub fn handle_settings_command(mut host: SettingsHost, args: SettingsArgs) -> BooksResult<()> {
    host.on_create(args.manage_books.then_some(ACTION_MANAGE_BOOKS));

    for name in &args.screens {
        if !host.on_preference_start_screen(name) {
            eprintln!("Unknown settings screen: {}", name);
        }
    }

    let Some(screen) = host.current_screen() else {
        println!("No settings screen available.");
        return Ok(());
    };
    println!("{}", screen.title());
    println!("{}", "=".repeat(screen.title().len()));

    for item in host.render()? {
        println!("{:<28} {}", item.title, item.summary);
        println!("{:<28} [{}]", "", item.key);
    }
    Ok(())
}
