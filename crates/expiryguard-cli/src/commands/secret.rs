use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use comfy_table::{Cell, Table};
use std::sync::Arc;

use crate::cli::SecretCommands;
use expiryguard_core::{AppCore, Secret};

pub async fn run(core: Arc<AppCore>, command: SecretCommands) -> Result<()> {
    match command {
        SecretCommands::Add {
            name,
            expires,
            owner,
            notes,
        } => add(&core, name, &expires, owner, notes),
        SecretCommands::List { all } => list(&core, all),
        SecretCommands::Remove { id } => remove(&core, &id),
    }
}

fn add(
    core: &AppCore,
    name: String,
    expires: &str,
    owner: String,
    notes: Option<String>,
) -> Result<()> {
    let expiry_date = NaiveDate::parse_from_str(expires, "%Y-%m-%d")
        .with_context(|| format!("Invalid expiry date '{expires}', expected YYYY-MM-DD"))?;

    let secret = Secret::new(name, owner, expiry_date, notes);
    core.storage.secrets.insert(&secret)?;

    println!("Added secret '{}' ({})", secret.name, secret.id);
    Ok(())
}

fn list(core: &AppCore, all: bool) -> Result<()> {
    let secrets = if all {
        core.storage.secrets.list_all()?
    } else {
        core.storage.secrets.list_active()?
    };

    if secrets.is_empty() {
        println!("No secrets monitored");
        return Ok(());
    }

    let today = Utc::now().date_naive();
    let mut table = Table::new();
    table.set_header(vec![
        "ID",
        "Name",
        "Owner",
        "Expires",
        "Days left",
        "Last notified",
        "Active",
    ]);

    for secret in secrets {
        let days_left = (secret.expiry_date - today).num_days();
        let last_notified = match secret.last_notified_threshold {
            Some(threshold) => {
                let on = secret
                    .last_notified_on
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string());
                format!("{} on {}", threshold.label(), on)
            }
            None => "never".to_string(),
        };

        table.add_row(vec![
            Cell::new(&secret.id),
            Cell::new(&secret.name),
            Cell::new(&secret.owner_email),
            Cell::new(secret.expiry_date.to_string()),
            Cell::new(days_left.to_string()),
            Cell::new(last_notified),
            Cell::new(if secret.active { "yes" } else { "no" }),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn remove(core: &AppCore, id: &str) -> Result<()> {
    if core.storage.secrets.deactivate(id)? {
        println!("Secret {id} deactivated");
    } else {
        println!("No secret with id {id}");
    }
    Ok(())
}
