mod account;
mod app;
mod browse;
mod draft;
mod pantry;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use grabcook_core::{ClientConfig, Complexity, SortField, SortOrder};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use app::App;
use draft::DraftCommand;
use pantry::PantryCommand;

#[derive(Parser)]
#[command(name = "grabcook")]
#[command(about = "Grab & Cook: wyszukiwanie i dodawanie przepisów", long_about = None)]
struct Cli {
    /// API base URL (default: GRABCOOK_API_URL or http://localhost:8000)
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and log in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in account
    Me,
    /// Recently viewed recipes
    History {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=100))]
        limit: u32,
    },
    /// Manage the ingredients you always have at home
    Pantry {
        #[command(subcommand)]
        action: PantryCommand,
    },
    /// List catalog ingredients
    Ingredients {
        /// Filter by name
        #[arg(long)]
        search: Option<String>,
        /// Ignore the local cache
        #[arg(long)]
        refresh: bool,
        /// Search on the server instead of the cached catalog
        #[arg(long)]
        remote: bool,
    },
    /// Search recipes by text or by ingredients
    Search {
        /// Free-text query
        text: Option<String>,
        /// Catalog ingredient id (repeatable)
        #[arg(long = "ingredient")]
        ingredients: Vec<String>,
        /// Shared search link to take the ingredient selection from
        #[arg(long)]
        url: Option<String>,
        /// Also select every ingredient from your pantry
        #[arg(long)]
        pantry: bool,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        #[arg(long)]
        complexity: Option<Complexity>,
        /// name, rating, prep_time or created_at
        #[arg(long, default_value = "created_at")]
        sort: SortField,
        /// asc or desc
        #[arg(long, default_value = "desc")]
        order: SortOrder,
    },
    /// Show one recipe
    Recipe { id: String },
    /// Rate a recipe from 1 to 5
    Rate {
        id: String,
        #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,
    },
    /// Edit the recipe draft
    Draft {
        #[command(subcommand)]
        action: DraftCommand,
    },
    /// Check an image file against the upload rules
    Image { path: PathBuf },
    /// Send the draft to the server
    Submit {
        /// Image to attach
        #[arg(long)]
        image: Option<PathBuf>,
    },
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env().context("Invalid configuration")?;
    if let Some(server) = &cli.server {
        config = config
            .with_api_url(server)
            .with_context(|| format!("Invalid server URL: {}", server))?;
    }
    let app = App::new(config)?;

    let result = tokio::select! {
        result = run(&app, cli.command) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::debug!("interrupted");
            eprintln!("Przerwano.");
            Ok(())
        }
    };

    // Unsaved draft edits are written even when the command failed.
    app.shutdown()?;
    result
}

async fn run(app: &App, command: Commands) -> Result<()> {
    match command {
        Commands::Login { email, password } => account::login(app, &email, &password).await,
        Commands::Register {
            email,
            password,
            confirm_password,
        } => account::register(app, &email, &password, &confirm_password).await,
        Commands::Logout => account::logout(app),
        Commands::Me => account::me(app).await,
        Commands::History { page, limit } => account::history(app, page, limit).await,
        Commands::Pantry { action } => pantry::run(app, action).await,
        Commands::Ingredients {
            search,
            refresh,
            remote,
        } => browse::ingredients(app, search.as_deref(), refresh, remote).await,
        Commands::Search {
            text,
            ingredients,
            url,
            pantry,
            page,
            limit,
            complexity,
            sort,
            order,
        } => {
            let options = browse::SearchOptions {
                text,
                ingredients,
                url,
                pantry,
                page,
                limit,
                complexity,
                sort,
                order,
            };
            browse::search(app, options).await
        }
        Commands::Recipe { id } => browse::recipe(app, &id).await,
        Commands::Rate { id, rating } => browse::rate(app, &id, rating).await,
        Commands::Draft { action } => draft::run(app, action),
        Commands::Image { path } => draft::check_image(&path).await,
        Commands::Submit { image } => draft::submit(app, image.as_deref()).await,
    }
}
