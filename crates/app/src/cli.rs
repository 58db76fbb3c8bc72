//! Command-line definitions.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// Command-line client for the Agenda contact manager.
#[derive(Debug, Parser)]
#[command(name = "agenda", version, about)]
pub struct Cli {
    /// Settings file (TOML). Defaults to the platform config directory.
    #[arg(long, global = true, env = "AGENDA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace). `RUST_LOG` wins.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account and sign in
    Register {
        /// Display name
        #[arg(long)]
        name: String,
        /// Login e-mail
        #[arg(long)]
        email: String,
        /// Password
        #[arg(long, env = "AGENDA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in
    Login {
        /// Login e-mail
        #[arg(long)]
        email: String,
        /// Password
        #[arg(long, env = "AGENDA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Revoke the session and forget the stored tokens
    Logout,
    /// Fetch the signed-in user from the server
    Me,
    /// Show the signed-in user, using the identity cache
    Whoami,
    /// Update name and/or e-mail
    Profile {
        /// New display name
        #[arg(long)]
        name: Option<String>,
        /// New login e-mail
        #[arg(long)]
        email: Option<String>,
    },
    /// Change the password
    Password {
        /// Current password
        #[arg(long)]
        current: String,
        /// New password
        #[arg(long = "new")]
        new_password: String,
    },
    /// Delete the account permanently
    DeleteAccount {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Manage contacts
    Contacts {
        #[command(subcommand)]
        command: ContactsCommand,
    },
    /// Check backend health
    Health,
    /// Show the local session state
    Status,
    /// Inspect API endpoint resolution
    Endpoint {
        #[command(subcommand)]
        command: EndpointCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum ContactsCommand {
    /// List contacts
    List {
        /// Page number (1-based)
        #[arg(long)]
        page: Option<u32>,
        /// Page size
        #[arg(long)]
        limit: Option<u32>,
        /// Filter by name
        #[arg(long)]
        name: Option<String>,
        /// Filter by category
        #[arg(long)]
        category: Option<String>,
        /// Filter by e-mail
        #[arg(long)]
        email: Option<String>,
    },
    /// Full-text search
    Search {
        /// Search term
        query: String,
        /// Page number (1-based)
        #[arg(long)]
        page: Option<u32>,
        /// Page size
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one contact
    Get {
        /// Contact id
        id: String,
    },
    /// Create a contact
    Create {
        /// Contact name
        #[arg(long)]
        name: String,
        /// Phone number, digits only
        #[arg(long)]
        phone: String,
        #[command(flatten)]
        details: ContactDetails,
    },
    /// Update a contact
    Update {
        /// Contact id
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New phone number
        #[arg(long)]
        phone: Option<String>,
        #[command(flatten)]
        details: ContactDetails,
    },
    /// Delete a contact
    Delete {
        /// Contact id
        id: String,
    },
}

/// Optional contact fields shared by create and update.
#[derive(Debug, Args)]
pub struct ContactDetails {
    /// E-mail
    #[arg(long)]
    pub email: Option<String>,
    /// Category
    #[arg(long)]
    pub category: Option<String>,
    /// Photo file, sent as a base64 data URL
    #[arg(long)]
    pub photo: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum EndpointCommand {
    /// Resolve and print the API address
    Show,
    /// Drop the memoized address and resolve again
    Reset,
}
