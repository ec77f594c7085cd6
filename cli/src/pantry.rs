use anyhow::{Context, Result};
use clap::Subcommand;
use grabcook_core::{HttpApiClient, Pantry};

use crate::app::App;

#[derive(Subcommand)]
pub enum PantryCommand {
    /// List ingredients you always have at home
    List,
    /// Add a catalog ingredient
    Add { ingredient: String },
    /// Remove a catalog ingredient
    Remove { ingredient: String },
}

pub fn open(app: &App) -> Result<Pantry<HttpApiClient>> {
    let token = app.require_token()?;
    Ok(Pantry::new(app.api.clone(), token))
}

pub async fn run(app: &App, command: PantryCommand) -> Result<()> {
    let pantry = open(app)?;
    match command {
        PantryCommand::List => {
            let entries = pantry.list().await.context("Failed to load pantry")?;
            if entries.is_empty() {
                println!("Spiżarnia jest pusta");
            }
            for entry in &entries {
                println!(
                    "{:<38} {:<30} [{}]",
                    entry.ingredient_id, entry.name, entry.unit_type
                );
            }
        }
        PantryCommand::Add { ingredient } => {
            pantry
                .add(&ingredient)
                .await
                .with_context(|| format!("Nie udało się dodać składnika {}", ingredient))?;
            println!("Dodano {} do spiżarni", ingredient);
        }
        PantryCommand::Remove { ingredient } => {
            pantry
                .remove(&ingredient)
                .await
                .with_context(|| format!("Nie udało się usunąć składnika {}", ingredient))?;
            println!("Usunięto {} ze spiżarni", ingredient);
        }
    }
    Ok(())
}
