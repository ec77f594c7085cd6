use anyhow::{Context, Result};
use grabcook_core::RecipeApi;

use crate::app::App;

pub async fn login(app: &App, email: &str, password: &str) -> Result<()> {
    let session = app
        .sessions
        .login(&*app.api, email, password)
        .await
        .context("Logowanie nie powiodło się")?;
    println!("Zalogowano jako {}", session.user.email);
    Ok(())
}

pub async fn register(
    app: &App,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<()> {
    let session = app
        .sessions
        .register(&*app.api, email, password, confirm_password)
        .await
        .context("Rejestracja nie powiodła się")?;
    println!("Utworzono konto {}", session.user.email);
    Ok(())
}

pub fn logout(app: &App) -> Result<()> {
    if app.sessions.logout().context("Failed to clear session")? {
        println!("Wylogowano");
    } else {
        println!("Nie było aktywnej sesji");
    }
    Ok(())
}

pub async fn me(app: &App) -> Result<()> {
    let token = app.require_token()?;
    let profile = app
        .api
        .current_user(&token)
        .await
        .context("Failed to load profile")?;
    println!("{}", profile.email);
    println!("id: {}", profile.id);
    println!("Konto od: {}", profile.created_at.format("%Y-%m-%d"));
    Ok(())
}

pub async fn history(app: &App, page: u32, limit: u32) -> Result<()> {
    let token = app.require_token()?;
    let views = app
        .api
        .recipe_views(&token, page, limit)
        .await
        .context("Failed to load view history")?;

    if views.data.is_empty() {
        println!("Brak historii przeglądania");
        return Ok(());
    }
    for view in &views.data {
        println!(
            "{}  {}  {}",
            view.view_start.format("%Y-%m-%d %H:%M"),
            view.recipe_id,
            view.recipe_name
        );
    }
    if views.pagination.total_pages > 1 {
        println!(
            "Strona {} z {}",
            views.pagination.page, views.pagination.total_pages
        );
    }
    Ok(())
}
