use anyhow::Context;
use axum::{routing::get, Router};
use clap::{Parser, Subcommand};
use sakan::{auth, db, inbox, pages, profiles, res, rooms, seed, AppState};
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sakan", about = "Roommate and room finder for the Muslim community")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web server
    Serve,
    /// Fill the lookup tables; --demo also creates sample members and listings
    Seed {
        #[arg(long)]
        demo: bool,
    },
}

fn env_or(key: &str, fallback: &str) -> String {
    dotenv::var(key).unwrap_or_else(|_| fallback.to_owned())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sakan=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    let database_url = env_or("DATABASE_URL", "sqlite:sakan.db?mode=rwc");
    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(&database_url)
        .await
        .with_context(|| format!("opening {database_url}"))?;
    db::MIGRATOR
        .run(&db_pool)
        .await
        .context("running migrations")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Seed { demo } => {
            seed::run(&db_pool, demo).await?;
            tracing::info!("seeding finished");
            Ok(())
        }
        Command::Serve => serve(db_pool).await,
    }
}

async fn serve(db_pool: sqlx::SqlitePool) -> anyhow::Result<()> {
    let base_url = env_or("BASE_URL", "http://localhost:8080");
    let secret_file = env_or("CLIENT_SECRET_FILE", "client_secret.json");
    let clients = match auth::Clients::load(&secret_file, &base_url) {
        Ok(clients) => clients,
        Err(err) => {
            tracing::warn!(error = %err, "social sign-in disabled");
            auth::Clients::disabled()
        }
    };

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(2)));

    let app_state = AppState { db_pool, clients };

    let app = Router::new()
        .route("/", get(pages::home))
        .route("/about", get(pages::about))
        .route("/dashboard", get(pages::dashboard))
        .route("/my-listings", get(pages::my_listings))
        .route("/style.css", get(res::stylesheet))
        .merge(auth::router())
        .nest("/profiles", profiles::router())
        .nest("/rooms", rooms::router())
        .nest("/inbox", inbox::router())
        .with_state(app_state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http());

    let bind_addr = env_or("BIND_ADDR", "0.0.0.0:8080");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "listening");
    axum::serve(listener, app).await.context("serving")?;
    Ok(())
}
