//! Agenda - Main Entry Point
//!
//! Loads settings, wires the session gateway and runs one command.

mod cli;
mod photo;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use agenda_application::AuthGateway;
use agenda_domain::{
    ContactChanges, ContactFilter, ContactSearch, Credentials, NewAccount, NewContact,
    PasswordChange, ProfileChanges,
};
use agenda_infrastructure::{build_gateway, init_tracing, load_settings};

use crate::cli::{Cli, Command, ContactDetails, ContactsCommand, EndpointCommand};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose).context("failed to initialize logging")?;

    let settings = load_settings(cli.config.as_deref())?;
    let gateway = build_gateway(&settings)?;

    run(&gateway, cli.command).await
}

async fn run(gateway: &AuthGateway, command: Command) -> Result<()> {
    match command {
        Command::Register {
            name,
            email,
            password,
        } => {
            let account = NewAccount {
                name,
                email,
                password,
            };
            let response = gateway.register(&account).await?;
            print_json(&response.user)
        }
        Command::Login { email, password } => {
            let response = gateway.login(&Credentials { email, password }).await?;
            print_json(&response.user)
        }
        Command::Logout => print_json(&gateway.logout().await?),
        Command::Me => print_json(&gateway.me().await?),
        Command::Whoami => print_json(&gateway.current_user().await?),
        Command::Profile { name, email } => {
            anyhow::ensure!(
                name.is_some() || email.is_some(),
                "nothing to update: pass --name and/or --email"
            );
            print_json(&gateway.update_me(&ProfileChanges { name, email }).await?)
        }
        Command::Password {
            current,
            new_password,
        } => {
            let change = PasswordChange {
                current_password: current,
                new_password,
            };
            print_json(&gateway.update_password(&change).await?)
        }
        Command::DeleteAccount { yes } => {
            anyhow::ensure!(yes, "refusing to delete the account without --yes");
            print_json(&gateway.delete_me().await?)
        }
        Command::Contacts { command } => run_contacts(gateway, command).await,
        Command::Health => print_json(&gateway.health().await?),
        Command::Status => {
            let state = gateway.session_state();
            println!("{}", state.message());
            Ok(())
        }
        Command::Endpoint { command } => {
            if matches!(command, EndpointCommand::Reset) {
                gateway.reset_endpoint().await;
            }
            println!("{}", gateway.resolve_endpoint().await);
            Ok(())
        }
    }
}

async fn run_contacts(gateway: &AuthGateway, command: ContactsCommand) -> Result<()> {
    match command {
        ContactsCommand::List {
            page,
            limit,
            name,
            category,
            email,
        } => {
            let filter = ContactFilter {
                page,
                limit,
                name,
                category,
                email,
            };
            print_json(&gateway.list_contacts(&filter).await?)
        }
        ContactsCommand::Search { query, page, limit } => {
            let search = ContactSearch {
                page,
                limit,
                ..ContactSearch::new(query)
            };
            print_json(&gateway.search_contacts(&search).await?)
        }
        ContactsCommand::Get { id } => print_json(&gateway.get_contact(&id).await?),
        ContactsCommand::Create {
            name,
            phone,
            details,
        } => {
            let (email, category, photo) = details.into_fields()?;
            let contact = NewContact {
                name,
                phone,
                email,
                category,
                photo,
            };
            print_json(&gateway.create_contact(&contact).await?)
        }
        ContactsCommand::Update {
            id,
            name,
            phone,
            details,
        } => {
            let (email, category, photo) = details.into_fields()?;
            let changes = ContactChanges {
                name,
                phone,
                email,
                category,
                photo,
            };
            anyhow::ensure!(!changes.is_empty(), "nothing to update");
            print_json(&gateway.update_contact(&id, &changes).await?)
        }
        ContactsCommand::Delete { id } => print_json(&gateway.delete_contact(&id).await?),
    }
}

impl ContactDetails {
    fn into_fields(self) -> Result<(Option<String>, Option<String>, Option<String>)> {
        let photo = self.photo.as_deref().map(photo::data_url).transpose()?;
        Ok((self.email, self.category, photo))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
