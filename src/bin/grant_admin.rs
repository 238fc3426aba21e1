use dotenvy::dotenv;
use std::env;
use tracing_subscriber::EnvFilter;

use mergington::database::{self, users_repo};
use mergington::models::Role;
use mergington::services::auth_service;
use mergington::AppConfig;

#[tokio::main]
async fn main() {
    dotenv().ok();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mergington=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let Some(raw_email) = env::args().nth(1) else {
        eprintln!("usage: grant_admin <email>");
        std::process::exit(2);
    };
    let email = auth_service::normalize_email(&raw_email);

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("grant_admin: {}", e);
            std::process::exit(1);
        }
    };
    let pool = match database::connect(&config.database_url, 1).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("grant_admin: cannot open {}: {}", config.database_url, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = database::migrations::apply_migrations(&pool).await {
        eprintln!("grant_admin: {}", e);
        std::process::exit(1);
    }

    match users_repo::update_role(&pool, &email, Role::Admin.as_str()).await {
        Ok(0) => {
            eprintln!("grant_admin: no account for {}", email);
            std::process::exit(1);
        }
        Ok(_) => println!("{} is now an admin", email),
        Err(e) => {
            eprintln!("grant_admin failed: {}", e);
            std::process::exit(1);
        }
    }
}
