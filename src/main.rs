use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use darkroom::config::Config;
use darkroom::db::{create_pool, init_db, queries, AppState};
use darkroom::email::Mailer;
use darkroom::handlers;
use darkroom::models::CreateUser;
use darkroom::storage::MediaStore;

#[derive(Parser, Debug)]
#[command(name = "darkroom")]
#[command(about = "Photo studio back office: gallery management and PayPal order reconciliation")]
struct Cli {
    /// Seed the database with dev data (staff user, customer, order, category)
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Create the first staff user if none exists, printing their API key once.
fn bootstrap_staff_user(state: &AppState, email: &str) {
    let conn = state.db.get().expect("Failed to get db connection for bootstrap");

    let count = queries::count_staff_users(&conn).expect("Failed to count staff users");
    if count > 0 {
        tracing::info!("Staff users already exist, skipping bootstrap");
        return;
    }

    let input = CreateUser {
        username: "studio".to_string(),
        email: email.to_string(),
        first_name: "Studio".to_string(),
        last_name: "Admin".to_string(),
        is_staff: true,
    };
    let user = queries::create_user(&conn, &input).expect("Failed to create bootstrap staff user");

    let api_key = queries::generate_api_key();
    queries::set_user_api_key(&conn, user.id, &api_key)
        .expect("Failed to store bootstrap API key");

    tracing::info!("============================================");
    tracing::info!("BOOTSTRAP STAFF USER CREATED");
    tracing::info!("Email: {}", email);
    tracing::info!("API Key: {}", api_key);
    tracing::info!("============================================");
    tracing::info!("SAVE THIS API KEY - IT WILL NOT BE SHOWN AGAIN");
    tracing::info!("============================================");
}

/// Seeds the database with dev data for manual testing.
/// Only runs in dev mode and when the database is empty.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let count = queries::count_staff_users(&conn).expect("Failed to count staff users");
    if count > 0 {
        tracing::info!("Database already has data, skipping seed");
        return;
    }

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    let staff = queries::create_user(
        &conn,
        &CreateUser {
            username: "studio".to_string(),
            email: "studio@darkroom.local".to_string(),
            first_name: "Studio".to_string(),
            last_name: "Admin".to_string(),
            is_staff: true,
        },
    )
    .expect("Failed to create dev staff user");
    let staff_api_key = queries::generate_api_key();
    queries::set_user_api_key(&conn, staff.id, &staff_api_key)
        .expect("Failed to store dev API key");

    let customer = queries::create_user(
        &conn,
        &CreateUser {
            username: "customer".to_string(),
            email: "customer@example.com".to_string(),
            first_name: "Test".to_string(),
            last_name: "Customer".to_string(),
            is_staff: false,
        },
    )
    .expect("Failed to create dev customer");

    let order = queries::create_order(
        &conn,
        &darkroom::models::CreateOrder {
            user_id: customer.id,
            paypal_email: None,
        },
        &state.default_paypal_email,
    )
    .expect("Failed to create dev order");

    let category = queries::create_category(&conn, "Portraits", None, "portraits")
        .expect("Failed to create dev category");

    tracing::info!("Staff user: {} ({})", staff.username, staff.email);
    tracing::info!("Customer: {} ({})", customer.username, customer.email);
    tracing::info!("Order id: {}", order.id);
    tracing::info!("Category: {} (id: {})", category.name, category.id);

    // Copy-paste friendly output (no log formatting)
    println!();
    println!("--- COPY FROM HERE ---");
    println!("  staff_api_key: {}", staff_api_key);
    println!("  customer_id: {}", customer.id);
    println!("  order_id: {}", order.id);
    println!("  category_id: {}", category.id);
    println!("--- END COPY ---");
    println!();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "darkroom=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let media = MediaStore::new(&config.media_root).expect("Failed to open media root");

    let mailer = if config.resend_api_key.is_some() {
        Mailer::new(config.resend_api_key.clone(), config.notify.from_email.clone())
    } else {
        tracing::info!("No RESEND_API_KEY configured, emails will be logged only");
        Mailer::disabled(config.notify.from_email.clone())
    };

    let state = AppState {
        db: db_pool,
        media,
        mailer,
        notify: config.notify.clone(),
        default_paypal_email: config.default_paypal_email.clone(),
        base_url: config.base_url.clone(),
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set DARKROOM_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    if let Some(ref email) = config.bootstrap_staff_email {
        bootstrap_staff_user(&state, email);
    }

    let app = Router::new()
        // Public gallery (no auth)
        .merge(handlers::gallery::router())
        // Gateway webhook
        .merge(handlers::webhooks::router())
        // Staff admin surface (API key auth)
        .merge(handlers::admin::router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("Darkroom server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral database...");
        if let Err(e) = std::fs::remove_file(&db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        } else {
            tracing::info!("Removed {}", db_path);
        }
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
