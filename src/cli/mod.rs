//! CLI entry point for Soko.

pub mod auth;
pub mod payment;
pub mod products;

use clap::{Parser, Subcommand};

/// Soko marketplace CLI
#[derive(Parser, Debug)]
#[command(name = "soko", version, about = "Soko marketplace CLI")]
pub struct Cli {
    /// Credentials profile (overrides SOKO_PROFILE)
    #[arg(long, global = true)]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Account session management
    Auth(AuthArgs),
    /// Browse the product catalogue
    Products(ProductsArgs),
    /// Payment tracking
    Payment(PaymentArgs),
}

#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Log in and store the token pair
    Login(LoginArgs),
    /// Clear stored credentials
    Logout,
    /// Show the logged-in user
    Whoami,
}

#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Account email
    pub email: String,

    /// Password; read from stdin when omitted
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ProductsArgs {
    #[command(subcommand)]
    pub command: ProductsCommands,
}

#[derive(Subcommand, Debug)]
pub enum ProductsCommands {
    /// List products
    List(ListArgs),
    /// Show one product
    Show {
        /// Product id
        id: String,
    },
}

#[derive(Parser, Debug, Default)]
pub struct ListArgs {
    #[arg(short, long)]
    pub search: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub brand: Option<String>,

    #[arg(long)]
    pub featured: bool,

    #[arg(short, long)]
    pub page: Option<u32>,

    #[arg(short, long)]
    pub limit: Option<u32>,
}

#[derive(Parser, Debug)]
pub struct PaymentArgs {
    #[command(subcommand)]
    pub command: PaymentCommands,
}

#[derive(Subcommand, Debug)]
pub enum PaymentCommands {
    /// Poll a payment until it completes or fails
    Watch(WatchArgs),
}

#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Payment id
    pub payment_id: String,

    /// Seconds between checks (defaults to SOKO_POLL_INTERVAL_SECS)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Give up after this many checks
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_auth_login_with_password() {
        let cli = Cli::try_parse_from([
            "soko",
            "auth",
            "login",
            "asha@example.com",
            "--password",
            "Secret#123",
        ])
        .unwrap();
        match cli.command {
            Commands::Auth(auth) => match auth.command {
                AuthCommands::Login(args) => {
                    assert_eq!(args.email, "asha@example.com");
                    assert_eq!(args.password.as_deref(), Some("Secret#123"));
                }
                other => panic!("expected Login, got {other:?}"),
            },
            other => panic!("expected Auth, got {other:?}"),
        }
    }

    #[test]
    fn parse_auth_whoami_with_profile() {
        let cli = Cli::try_parse_from(["soko", "--profile", "seller", "auth", "whoami"]).unwrap();
        assert_eq!(cli.profile.as_deref(), Some("seller"));
        match cli.command {
            Commands::Auth(auth) => assert!(matches!(auth.command, AuthCommands::Whoami)),
            other => panic!("expected Auth, got {other:?}"),
        }
    }

    #[test]
    fn parse_products_list_filters() {
        let cli = Cli::try_parse_from([
            "soko", "products", "list", "--search", "kanga", "--page", "2", "--featured",
        ])
        .unwrap();
        match cli.command {
            Commands::Products(products) => match products.command {
                ProductsCommands::List(args) => {
                    assert_eq!(args.search.as_deref(), Some("kanga"));
                    assert_eq!(args.page, Some(2));
                    assert!(args.featured);
                }
                other => panic!("expected List, got {other:?}"),
            },
            other => panic!("expected Products, got {other:?}"),
        }
    }

    #[test]
    fn parse_payment_watch() {
        let cli = Cli::try_parse_from(["soko", "payment", "watch", "pay-42", "--max-attempts", "3"])
            .unwrap();
        match cli.command {
            Commands::Payment(payment) => match payment.command {
                PaymentCommands::Watch(args) => {
                    assert_eq!(args.payment_id, "pay-42");
                    assert_eq!(args.max_attempts, Some(3));
                    assert!(args.interval.is_none());
                }
            },
            other => panic!("expected Payment, got {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["soko", "chat"]).is_err());
    }
}
