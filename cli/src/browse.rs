use anyhow::{bail, Context, Result};
use grabcook_core::catalog::filter_ingredients;
use grabcook_core::types::IngredientQuery;
use grabcook_core::{
    CatalogIngredient, CatalogSource, Complexity, IngredientSelection, IngredientSource,
    RecipeApi, RecipeQuery, RecipeSearch, RecipeSource, RecipeSummary, SearchController,
    SortField, SortOrder,
};
use url::Url;

use crate::app::App;

pub async fn ingredients(
    app: &App,
    search: Option<&str>,
    refresh: bool,
    remote: bool,
) -> Result<()> {
    if remote {
        let term = search.context("--remote requires --search")?;
        let controller = SearchController::new(
            IngredientSource::new(app.api.clone()),
            app.config.search_debounce,
        );
        controller.search_now(IngredientQuery {
            search: Some(term.to_string()),
            ..IngredientQuery::default()
        });
        let state = controller.settled().await;
        if let Some(error) = state.error {
            bail!(error);
        }
        print_ingredients(state.results.iter());
        println!("{} z {} wyników", state.results.len(), state.total_items);
        return Ok(());
    }

    let catalog = app.catalog();
    let load = if refresh {
        catalog.refetch().await
    } else {
        catalog.load().await
    };
    if let Some(message) = &load.error {
        eprintln!("{}", message);
    }

    let hits = filter_ingredients(&load.ingredients, search.unwrap_or(""));
    print_ingredients(hits.iter().copied());
    let source = match load.source {
        CatalogSource::Cache => "z pamięci podręcznej",
        CatalogSource::Network => "z serwera",
        CatalogSource::Fallback => "lista domyślna",
    };
    println!("{} składników ({})", hits.len(), source);
    Ok(())
}

fn print_ingredients<'a>(ingredients: impl Iterator<Item = &'a CatalogIngredient>) {
    for ingredient in ingredients {
        println!(
            "{:<38} {:<30} [{}]",
            ingredient.id, ingredient.name, ingredient.unit_type
        );
    }
}

pub struct SearchOptions {
    pub text: Option<String>,
    pub ingredients: Vec<String>,
    pub url: Option<String>,
    pub pantry: bool,
    pub page: u32,
    pub limit: u32,
    pub complexity: Option<Complexity>,
    pub sort: SortField,
    pub order: SortOrder,
}

pub async fn search(app: &App, options: SearchOptions) -> Result<()> {
    let (mut selection, link_base) = match &options.url {
        Some(raw) => {
            let url = Url::parse(raw).with_context(|| format!("Invalid search link: {}", raw))?;
            (IngredientSelection::from_url(&url), url)
        }
        None => (
            IngredientSelection::new(),
            app.config
                .search_page_url()
                .context("Invalid web front-end URL")?,
        ),
    };
    for id in &options.ingredients {
        selection.add(id);
    }
    if options.pantry {
        let added = crate::pantry::open(app)?
            .seed(&mut selection)
            .await
            .context("Failed to load pantry")?;
        tracing::debug!(added, "search: pantry ingredients selected");
    }

    let query = if selection.is_empty() {
        RecipeSearch::Text(RecipeQuery {
            search: options.text,
            page: options.page,
            limit: options.limit,
            complexity: options.complexity,
            sort_by: options.sort,
            sort_order: options.order,
        })
    } else {
        if options.text.is_some() {
            eprintln!("Wyszukiwanie po składnikach: pomijam zapytanie tekstowe");
        }
        RecipeSearch::Ingredients(selection.ids().to_vec())
    };

    let controller = SearchController::new(
        RecipeSource::new(app.api.clone()),
        app.config.search_debounce,
    );
    controller.search_now(query);
    let state = controller.settled().await;
    if let Some(error) = state.error {
        bail!(error);
    }

    if state.results.is_empty() {
        println!("Nie znaleziono przepisów");
    }
    for recipe in &state.results {
        print_summary(recipe);
    }
    if state.total_pages > 1 {
        println!(
            "Strona {} z {} ({} przepisów)",
            state.page, state.total_pages, state.total_items
        );
    }
    if !selection.is_empty() {
        println!("Link: {}", selection.to_url(&link_base));
    }
    Ok(())
}

fn print_summary(recipe: &RecipeSummary) {
    println!(
        "{}  {}  {} min  {}  ★ {:.1} ({})",
        recipe.id,
        recipe.name,
        recipe.preparation_time_minutes,
        recipe.complexity_level.label(),
        recipe.average_rating,
        recipe.total_votes
    );
}

pub async fn recipe(app: &App, id: &str) -> Result<()> {
    let recipe = app
        .api
        .get_recipe(id)
        .await
        .with_context(|| format!("Failed to load recipe {}", id))?;

    println!("{}", recipe.name);
    println!(
        "{} min · {} · ★ {:.1} ({} głosów)",
        recipe.preparation_time_minutes,
        recipe.complexity_level.label(),
        recipe.average_rating,
        recipe.total_votes
    );

    println!("\nSkładniki:");
    for line in &recipe.ingredients {
        let mut text = format!("  - {} {} {}", line.name, line.amount, line.unit_type);
        if line.is_optional {
            text.push_str(" (opcjonalnie)");
        }
        if let Some(substitute) = &line.substitute_recommendation {
            text.push_str(&format!(", zamiennik: {}", substitute));
        }
        println!("{}", text);
    }

    println!("\nPrzygotowanie:");
    for step in &recipe.steps {
        println!("  {}. {}", step.step, step.description);
    }
    Ok(())
}

pub async fn rate(app: &App, id: &str, rating: u8) -> Result<()> {
    let token = app.require_token()?;
    let update = app
        .api
        .rate_recipe(&token, id, rating)
        .await
        .with_context(|| format!("Failed to rate recipe {}", id))?;
    println!(
        "Dziękujemy! Średnia ocena: {:.1} ({} głosów)",
        update.average_rating, update.total_votes
    );
    Ok(())
}
