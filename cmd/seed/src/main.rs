//! Bootstraps a Complaint Box database: the first admin account and,
//! optionally, a spread of demo complaints of different ages.

use std::sync::Arc;

use anyhow::Context;
use cb_auth_jwt::JwtAuthProvider;
use cb_config::Settings;
use cb_core::models::{Category, Urgency};
use cb_core::service::{AuthService, ComplaintService, NewComplaint, SignupInput};
use cb_db_sqlite::SqliteStore;
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;

#[derive(Parser)]
#[command(name = "seed")]
#[command(about = "Seed a Complaint Box database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an administrator account
    Admin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Insert anonymous demo complaints spread over the last few weeks
    Demo,
}

const DEMO: [(&str, Category, Urgency, i64); 6] = [
    ("Hazing in the east dorms", Category::Bullying, Urgency::Critical, 1),
    ("Exam results missing", Category::Academic, Urgency::High, 6),
    ("Library printer jammed", Category::Facility, Urgency::Low, 40),
    ("Unhelpful front desk", Category::Staff, Urgency::Medium, 12),
    ("Parking permits", Category::Other, Urgency::Low, 3),
    ("Broken lab fume hood", Category::Facility, Urgency::Critical, 20),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().context("invalid configuration")?;

    let store = Arc::new(
        SqliteStore::connect(&settings.database.url, settings.database.max_connections)
            .await
            .context("failed to open database")?,
    );

    match cli.command {
        Commands::Admin {
            username,
            email,
            password,
        } => {
            let provider = Arc::new(JwtAuthProvider::new(
                settings.auth.jwt_secret.expose_secret(),
                Duration::hours(settings.auth.token_ttl_hours),
            ));
            let auth = AuthService::new(store, provider);
            let input = SignupInput {
                username: Some(username),
                email: Some(email),
                password: Some(password),
                role: Some("admin".to_string()),
            };
            let admin = auth.signup(input, Utc::now()).await?;
            println!("Created admin {} <{}>.", admin.username, admin.email);
        }
        Commands::Demo => {
            let complaints = ComplaintService::new(store.clone(), store);
            let now = Utc::now();
            for (title, category, urgency, age_days) in DEMO {
                let input = NewComplaint {
                    title: Some(title.to_string()),
                    description: Some(format!("Demo complaint: {title}.")),
                    category: Some(category),
                    urgency: Some(urgency),
                    is_anonymous: None,
                };
                let created = complaints
                    .submit(None, input, now - Duration::days(age_days))
                    .await?;
                println!("- {title} (score at creation {})", created.priority_score);
            }
            println!("Inserted {} demo complaints.", DEMO.len());
        }
    }

    Ok(())
}
