//! Soko CLI binary entry point.

use clap::Parser;
use soko::api::ApiClient;
use soko::cli::{AuthCommands, Cli, Commands, PaymentCommands, ProductsCommands};
use soko::config::SokoConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("soko=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = SokoConfig::from_env()?;
    if let Some(profile) = cli.profile {
        config = config.with_profile(profile);
    }
    let client = ApiClient::new(config)?;

    match cli.command {
        Commands::Auth(auth) => match auth.command {
            AuthCommands::Login(args) => {
                soko::cli::auth::handle_login(&client, &args.email, args.password).await
            }
            AuthCommands::Logout => soko::cli::auth::handle_logout(&client).await,
            AuthCommands::Whoami => soko::cli::auth::handle_whoami(&client).await,
        },
        Commands::Products(products) => match products.command {
            ProductsCommands::List(args) => soko::cli::products::handle_list(&client, args).await,
            ProductsCommands::Show { id } => soko::cli::products::handle_show(&client, &id).await,
        },
        Commands::Payment(payment) => match payment.command {
            PaymentCommands::Watch(args) => soko::cli::payment::handle_watch(&client, args).await,
        },
    }
}
