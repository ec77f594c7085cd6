use anyhow::{bail, Context, Result};
use clap::Subcommand;
use grabcook_core::{
    Complexity, DraftIngredient, DraftPatch, FormProgress, ImageUpload, IngredientPatch,
    RecipeForm, RecipeSubmitter, SubmitOutcome,
};
use std::path::Path;

use crate::app::App;

#[derive(Subcommand)]
pub enum DraftCommand {
    /// Throw away the current draft and start a new one
    New {
        #[arg(long)]
        name: Option<String>,
    },
    /// Print the draft
    Show,
    /// Check the draft without sending it
    Validate,
    /// Delete the stored draft
    Discard,
    #[command(flatten)]
    Edit(DraftEdit),
}

#[derive(Subcommand)]
pub enum DraftEdit {
    /// Change name, preparation time or difficulty
    Set {
        #[arg(long)]
        name: Option<String>,
        /// Preparation time in minutes
        #[arg(long, allow_hyphen_values = true)]
        time: Option<i32>,
        /// easy, medium or hard
        #[arg(long)]
        complexity: Option<Complexity>,
        #[arg(long, conflicts_with = "time")]
        clear_time: bool,
        #[arg(long, conflicts_with = "complexity")]
        clear_complexity: bool,
    },
    /// Append a step
    AddStep { description: String },
    /// Rewrite the step at a position
    EditStep { position: u32, description: String },
    RemoveStep { position: u32 },
    /// Move a step to another position
    MoveStep { from: u32, to: u32 },
    /// Add a catalog ingredient with an amount
    AddIngredient {
        ingredient: String,
        #[arg(allow_hyphen_values = true)]
        amount: f64,
        #[arg(long)]
        optional: bool,
        #[arg(long)]
        substitute: Option<String>,
    },
    /// Change the ingredient line at a position
    EditIngredient {
        position: usize,
        #[arg(long)]
        ingredient: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        amount: Option<f64>,
        #[arg(long)]
        optional: Option<bool>,
        #[arg(long)]
        substitute: Option<String>,
    },
    RemoveIngredient { position: usize },
}

pub fn run(app: &App, command: DraftCommand) -> Result<()> {
    match command {
        DraftCommand::New { name } => {
            app.persistence
                .clear()
                .context("Failed to remove draft backup")?;
            let mut form = RecipeForm::new();
            if let Some(name) = name {
                form.apply(DraftPatch::name(name));
            }
            app.save_form(&form)?;
            println!("Rozpoczęto nowy szkic");
            Ok(())
        }
        DraftCommand::Discard => {
            app.persistence
                .clear()
                .context("Failed to remove draft backup")?;
            println!("Szkic usunięty");
            Ok(())
        }
        DraftCommand::Show => {
            let form = app.open_form();
            print_draft(&form);
            Ok(())
        }
        DraftCommand::Validate => {
            let mut form = app.open_form();
            if form.validate() {
                println!("Szkic jest gotowy do wysłania");
                return Ok(());
            }
            print_errors(&form);
            bail!("Szkic zawiera błędy");
        }
        DraftCommand::Edit(edit) => {
            let mut form = app.open_form();
            let message = apply_edit(&mut form, edit)?;
            let progress = app.save_form(&form)?;
            println!("{}", message);
            print_progress(&progress);
            Ok(())
        }
    }
}

fn apply_edit(form: &mut RecipeForm, edit: DraftEdit) -> Result<String> {
    let message = match edit {
        DraftEdit::Set {
            name,
            time,
            complexity,
            clear_time,
            clear_complexity,
        } => {
            let patch = DraftPatch {
                name,
                preparation_time_minutes: if clear_time { Some(None) } else { time.map(Some) },
                complexity_level: if clear_complexity {
                    Some(None)
                } else {
                    complexity.map(Some)
                },
            };
            if patch.is_empty() {
                bail!("Nothing to change: pass --name, --time or --complexity");
            }
            form.apply(patch);
            "Zaktualizowano szkic".to_string()
        }
        DraftEdit::AddStep { description } => {
            let position = form.add_step(description);
            format!("Dodano krok {}", position)
        }
        DraftEdit::EditStep {
            position,
            description,
        } => {
            if !form.update_step(position, description) {
                bail!("Nie ma kroku {}", position);
            }
            format!("Zmieniono krok {}", position)
        }
        DraftEdit::RemoveStep { position } => {
            form.remove_step(position)
                .with_context(|| format!("Nie ma kroku {}", position))?;
            format!("Usunięto krok {}", position)
        }
        DraftEdit::MoveStep { from, to } => {
            if !form.move_step(from, to) {
                bail!("Nie można przenieść kroku {} na pozycję {}", from, to);
            }
            format!("Przeniesiono krok {} na pozycję {}", from, to)
        }
        DraftEdit::AddIngredient {
            ingredient,
            amount,
            optional,
            substitute,
        } => {
            let index = form.add_ingredient(DraftIngredient {
                is_optional: optional,
                substitute_recommendation: substitute.unwrap_or_default(),
                ..DraftIngredient::new(ingredient, amount)
            });
            format!("Dodano składnik {}", index + 1)
        }
        DraftEdit::EditIngredient {
            position,
            ingredient,
            amount,
            optional,
            substitute,
        } => {
            let patch = IngredientPatch {
                ingredient_id: ingredient,
                amount,
                is_optional: optional,
                substitute_recommendation: substitute,
            };
            let updated = position
                .checked_sub(1)
                .is_some_and(|index| form.update_ingredient(index, patch));
            if !updated {
                bail!("Nie ma składnika {}", position);
            }
            format!("Zmieniono składnik {}", position)
        }
        DraftEdit::RemoveIngredient { position } => {
            position
                .checked_sub(1)
                .and_then(|index| form.remove_ingredient(index))
                .with_context(|| format!("Nie ma składnika {}", position))?;
            format!("Usunięto składnik {}", position)
        }
    };
    Ok(message)
}

fn print_draft(form: &RecipeForm) {
    let draft = form.draft();
    if draft.is_empty() {
        println!("Szkic jest pusty");
        return;
    }

    let name = if draft.name.trim().is_empty() {
        "(bez nazwy)"
    } else {
        draft.name.as_str()
    };
    println!("Nazwa: {}", name);
    match draft.preparation_time_minutes {
        Some(minutes) => println!("Czas przygotowania: {} min", minutes),
        None => println!("Czas przygotowania: -"),
    }
    println!(
        "Poziom trudności: {}",
        draft.complexity_level.map_or("-", |c| c.label())
    );

    println!("\nSkładniki:");
    for (index, line) in draft.ingredients.iter().enumerate() {
        let mut text = format!("  {}. {} x {}", index + 1, line.ingredient_id, line.amount);
        if line.is_optional {
            text.push_str(" (opcjonalnie)");
        }
        if !line.substitute_recommendation.trim().is_empty() {
            text.push_str(&format!(", zamiennik: {}", line.substitute_recommendation));
        }
        println!("{}", text);
    }

    println!("\nKroki:");
    for step in &draft.steps {
        println!("  {}. {}", step.step, step.description);
    }
    println!();
    print_progress(&form.progress());
}

fn print_progress(progress: &FormProgress) {
    println!(
        "Postęp: {}% ({}/4 sekcji)",
        progress.percent(),
        progress.completed_sections()
    );
}

fn print_errors(form: &RecipeForm) {
    for message in form.errors().messages() {
        eprintln!("  - {}", message);
    }
}

pub async fn check_image(path: &Path) -> Result<()> {
    let mut upload = ImageUpload::new();
    let image = upload
        .select(path)
        .await
        .with_context(|| format!("Obraz odrzucony: {}", path.display()))?;
    println!(
        "{}: {} {}x{} px, {} B",
        image.file_name,
        image.content_type,
        image.width,
        image.height,
        image.data.len()
    );
    Ok(())
}

pub async fn submit(app: &App, image: Option<&Path>) -> Result<()> {
    let mut form = app.open_form();

    // The image is never part of the stored draft, so it is attached here.
    let mut upload = ImageUpload::new();
    if let Some(path) = image {
        let image = upload
            .select(path)
            .await
            .with_context(|| format!("Obraz odrzucony: {}", path.display()))?;
        form.set_image(image);
    }

    let submitter = RecipeSubmitter::new(app.api.clone());
    match submitter
        .submit(&mut form, &app.sessions, &app.persistence)
        .await
    {
        SubmitOutcome::Created { recipe, redirect } => {
            let link = app
                .config
                .web_url
                .join(&redirect)
                .context("Invalid web front-end URL")?;
            println!("Zapisano przepis \"{}\"", recipe.name);
            println!("{}", link);
            Ok(())
        }
        SubmitOutcome::Invalid(_) => {
            print_errors(&form);
            bail!("Popraw błędy w szkicu przed wysłaniem");
        }
        SubmitOutcome::Unauthorized { message, redirect } => {
            bail!("{} Użyj `grabcook login` ({}).", message, redirect);
        }
        SubmitOutcome::Failed { message, .. } => bail!(message),
        SubmitOutcome::Busy => bail!("Przepis jest już wysyłany"),
    }
}
