//! Dropbox CLI commands

use clap::Subcommand;

use crate::error::BooksResult;
use crate::export::DropboxHelper;

#[derive(Subcommand)]
pub enum DropboxCommands {
    /// Save an OAuth2 access token (a stored token is kept)
    Token {
        /// Token obtained from the Dropbox authorization flow
        token: Option<String>,
        /// Forget the stored token
        #[arg(long, conflicts_with = "token")]
        clear: bool,
    },
    /// Show whether a token is stored
    Status,
}

pub fn handle_dropbox_command(helper: &DropboxHelper, cmd: DropboxCommands) -> BooksResult<()> {
    match cmd {
        DropboxCommands::Token { clear: true, .. } => {
            helper.clear_token()?;
            println!("Dropbox token removed.");
        }
        DropboxCommands::Token { token, .. } => {
            match helper.retrieve_and_save_token(token.as_deref())? {
                Some(_) => println!("Dropbox token stored."),
                None => {
                    println!("No Dropbox token stored.");
                    println!("Authorize the app with Dropbox, then run:");
                    println!("  gnucash-books dropbox token <TOKEN>");
                }
            }
        }
        DropboxCommands::Status => {
            if helper.has_token()? {
                println!("Dropbox: linked");
            } else {
                println!("Dropbox: not linked");
            }
        }
    }
    Ok(())
}
