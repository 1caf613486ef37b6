use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use userdesk::{
    config::api::ApiConfig,
    models::{LoginCredentials, UserUpdate},
    services::{ReqresClient, UsersApi},
};

#[derive(Parser)]
#[command(name = "userdesk-cli")]
#[command(about = "CLI tool for talking to the users API directly", long_about = None)]
struct Cli {
    /// Base URL of the users API (defaults to API_BASE_URL or the hosted API)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print the token
    Login {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// User management commands
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List one page of users
    List {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },

    /// Update the given fields of a user
    Update {
        #[arg(long)]
        id: i64,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },

    /// Delete a user
    Delete {
        #[arg(long)]
        id: i64,
    },
}

fn get_password(prompt: &str) -> anyhow::Result<String> {
    use std::io::{self, Write};
    print!("{}: ", prompt);
    io::stdout().flush()?;

    Ok(rpassword::read_password()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = ApiConfig::from_env();
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    let client = ReqresClient::new(&config).context("Failed to build API client")?;

    match cli.command {
        Commands::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => get_password("Password")?,
            };

            let response = client
                .login(&LoginCredentials { email, password })
                .await
                .context("Login request failed")?;

            match (response.token, response.error) {
                (Some(token), _) if !token.is_empty() => println!("{}", token),
                (_, Some(error)) => bail!("Login failed: {}", error),
                _ => bail!("Login failed: no token in response"),
            }
        }
        Commands::Users { command } => match command {
            UserCommands::List { page } => {
                let users = client
                    .list_users(page)
                    .await
                    .with_context(|| format!("Failed to fetch page {}", page))?;

                println!(
                    "Page {} of {} ({} users in total)",
                    users.page, users.total_pages, users.total
                );
                println!("{:<6} {:<30} {:<40}", "ID", "Name", "Email");
                println!("{}", "-".repeat(76));
                for user in users.data {
                    println!("{:<6} {:<30} {:<40}", user.id, user.full_name(), user.email);
                }
            }
            UserCommands::Update {
                id,
                first_name,
                last_name,
                email,
            } => {
                let update = UserUpdate {
                    email,
                    first_name,
                    last_name,
                    avatar: None,
                };
                if update.is_empty() {
                    bail!("Nothing to update; pass at least one of --first-name, --last-name, --email");
                }

                let echoed = client
                    .update_user(id, &update)
                    .await
                    .with_context(|| format!("Failed to update user {}", id))?;
                println!("{}", serde_json::to_string_pretty(&echoed)?);
            }
            UserCommands::Delete { id } => {
                let deleted = client
                    .delete_user(id)
                    .await
                    .with_context(|| format!("Failed to delete user {}", id))?;
                if !deleted {
                    bail!("Server refused to delete user {}", id);
                }
                println!("Deleted user {}", id);
            }
        },
    }

    Ok(())
}
