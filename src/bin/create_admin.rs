//! Create an admin account, or reset the password of an existing one.
//!
//! Reads the username and password from stdin and writes to the database named
//! by `FOLIO_DATABASE_URL`. The account must pick a new password at its next
//! web login.

use std::io::{self, Write};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use folio::db::{self, AdminsStorage};
use folio::service::CredentialStore;
use folio::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    let username = prompt("Enter admin username: ")?;
    let password = prompt("Enter admin password: ")?;

    let pool = db::connect(&cfg.database_url).await?;
    db::init_schema(&pool).await?;
    let store = CredentialStore::new(AdminsStorage::new(pool));

    if store.upsert_admin(&username, &password).await? {
        println!("New admin '{}' created", username.trim());
    } else {
        println!("Password updated for admin '{}'", username.trim());
    }
    println!("A password change will be required at the next login.");
    Ok(())
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
