//! Provision a credential record.
//!
//! Usage: create-user --email EMAIL --name NAME [--role Student|Warden|Admin] [--phone PHONE]
//!                    [--dashboard] [--student-profile]
//!   The password is read from the CREATE_USER_PASSWORD environment variable.

use anyhow::Context;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use hostel_api::{
    db::users::{PgUserStore, UserStore},
    models::user::{NewUser, UserRole},
    services::{
        auth::{meets_min_password_length, normalize_email, MIN_PASSWORD_LEN},
        password::PasswordHasher,
    },
};

#[derive(Parser)]
#[command(name = "create-user", about = "Create a hostel account")]
struct Args {
    #[arg(long)]
    email: String,

    /// Display name
    #[arg(long)]
    name: String,

    /// Student, Warden or Admin
    #[arg(long, default_value = "Student")]
    role: String,

    #[arg(long)]
    phone: Option<String>,

    /// Grant dashboard access
    #[arg(long)]
    dashboard: bool,

    /// Also create the linked student profile (Student role only)
    #[arg(long)]
    student_profile: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let role: UserRole = args.role.parse()?;
    if args.student_profile && role != UserRole::Student {
        anyhow::bail!("--student-profile only applies to the Student role");
    }

    let password = std::env::var("CREATE_USER_PASSWORD")
        .context("CREATE_USER_PASSWORD environment variable not set")?;
    if !meets_min_password_length(&password) {
        anyhow::bail!("Password must be at least {MIN_PASSWORD_LEN} characters long");
    }

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL required")?;
    let cost: u32 = std::env::var("BCRYPT_COST")
        .unwrap_or_else(|_| "10".into())
        .parse()?;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    let store = PgUserStore::new(pool.clone());
    let user = store
        .create_user(&NewUser {
            email: normalize_email(&args.email),
            password_hash: PasswordHasher::new(cost).hash(&password)?,
            role,
            name: args.name,
            phone: args.phone,
            can_access_dashboard: args.dashboard,
        })
        .await
        .context("Failed to insert user")?;
    tracing::info!("Created {} account {} ({})", user.role, user.email, user.id);

    if args.student_profile {
        let student_id: uuid::Uuid =
            sqlx::query_scalar("INSERT INTO students (user_id) VALUES ($1) RETURNING id")
                .bind(user.id)
                .fetch_one(&pool)
                .await
                .context("Failed to create student profile")?;
        tracing::info!("Created student profile {}", student_id);
    }

    Ok(())
}
