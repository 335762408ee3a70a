//! Apikit CLI
//!
//! Command-line administration of the credential file used by protected
//! routes.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use apikit_hex::CredentialService;
use apikit_store::{DEFAULT_CREDENTIALS_FILE, FileCredentialStore, HashingCost};

#[derive(Parser)]
#[command(name = "apikit")]
#[command(author, version, about = "Apikit credential file administration", long_about = None)]
struct Cli {
    /// Path of the credential file
    #[arg(
        long,
        env = "APIKIT_CREDENTIALS_FILE",
        default_value = DEFAULT_CREDENTIALS_FILE
    )]
    credentials_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User operations
    User {
        #[command(subcommand)]
        action: UserCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Add a new user
    Add {
        /// Username
        username: String,
        /// Password (read from stdin when omitted)
        #[arg(long, env = "APIKIT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Delete a user
    Delete {
        /// Username
        username: String,
        /// Only delete if this password matches
        #[arg(long)]
        password: Option<String>,
    },
    /// Check a username/password pair
    Verify {
        /// Username
        username: String,
        /// Password (read from stdin when omitted)
        #[arg(long, env = "APIKIT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// List all users
    List,
}

fn read_password(given: Option<String>) -> Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }

    eprint!("Enter password: ");
    io::stderr().flush()?;

    let mut password = String::new();
    io::stdin().lock().read_line(&mut password)?;
    let password = password.trim_end_matches(['\r', '\n']).to_string();

    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }
    Ok(password)
}

async fn run(cli: Cli, cost: HashingCost) -> Result<()> {
    let store = FileCredentialStore::open_with_cost(&cli.credentials_file, cost).await?;
    let service = CredentialService::new(store);

    match cli.command {
        Commands::User { action } => match action {
            UserCommands::Add { username, password } => {
                let password = read_password(password)?;
                let username = service.add_user(&username, &password).await?;
                println!("✓ User {} added", username);
            }
            UserCommands::Delete { username, password } => match password {
                Some(password) => {
                    if service.delete_user_verified(&username, &password).await? {
                        println!("✓ User {} deleted", username);
                    } else {
                        println!("✗ Incorrect username or password");
                        std::process::exit(1);
                    }
                }
                None => {
                    service.delete_user(&username).await?;
                    println!("✓ User {} deleted", username);
                }
            },
            UserCommands::Verify { username, password } => {
                let password = read_password(password)?;
                if service.verify(&username, &password).await {
                    println!("✓ Credentials valid");
                } else {
                    println!("✗ Incorrect username or password");
                    std::process::exit(1);
                }
            }
            UserCommands::List => {
                let users: Vec<String> = service
                    .list_users()
                    .await?
                    .into_iter()
                    .map(String::from)
                    .collect();
                println!("{}", serde_json::to_string_pretty(&users)?);
            }
        },
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    run(cli, HashingCost::default()).await
}
