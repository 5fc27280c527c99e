//! Database seed script for the initial admin account
//! Run with: cargo run --bin seed

use codelearn_api::config::Config;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    println!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database.url)
        .await?;

    println!("Connected successfully!");

    let email = std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
    let name = std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string());

    println!("Hashing password...");
    let password_hash = crypto_core::hash_password(&password)?;

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(&email)
            .fetch_optional(&pool)
            .await?;

    if let Some((id,)) = existing {
        println!("Updating existing admin account...");
        sqlx::query(
            "UPDATE users SET name = $1, password_hash = $2, role = 'admin', updated_at = NOW() WHERE id = $3",
        )
        .bind(&name)
        .bind(&password_hash)
        .bind(id)
        .execute(&pool)
        .await?;
        println!("Admin account updated successfully!");
    } else {
        println!("Creating new admin account...");
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, 'admin')
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&name)
        .bind(&email)
        .bind(&password_hash)
        .execute(&pool)
        .await?;
        println!("Admin account created successfully!");
    }

    println!("\n========================================");
    println!("Admin Account Ready!");
    println!("========================================");
    println!("Email:    {}", email);
    println!("Name:     {}", name);
    println!("Role:     admin");
    println!("========================================");

    Ok(())
}
