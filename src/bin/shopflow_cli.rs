use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde_json::json;
use shopflow::{
    auth::{AuthConfig, AuthService},
    config,
};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "shopflow-cli", about = "Operator tooling for ShopFlow", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue a bearer token scoped to one shop owner
    IssueToken(IssueTokenArgs),
    /// Load and validate configuration, then print the effective settings
    CheckConfig,
}

#[derive(Args)]
struct IssueTokenArgs {
    #[arg(long, help = "Owner id the token is scoped to; generated when omitted")]
    owner: Option<Uuid>,
    #[arg(long, help = "Display name carried in the token")]
    name: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config().context("failed to load configuration")?;

    match cli.command {
        Commands::IssueToken(args) => {
            let owner_id = args.owner.unwrap_or_else(Uuid::new_v4);
            let auth = AuthService::new(AuthConfig::from(&cfg));
            let token = auth
                .issue_token(owner_id, args.name)
                .context("failed to issue token")?;

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "owner_id": owner_id,
                        "token": token,
                        "expires_in": cfg.jwt_expiration,
                    }))?
                );
            } else {
                println!("Owner: {}", owner_id);
                println!("Token: {}", token);
            }
        }
        Commands::CheckConfig => {
            let summary = json!({
                "environment": cfg.environment,
                "host": cfg.host,
                "port": cfg.port,
                "auto_migrate": cfg.auto_migrate,
                "default_tax_rate": cfg.default_tax_rate.to_string(),
                "bill_number_prefix": cfg.bill_number_prefix,
                "bill_number_max_attempts": cfg.bill_number_max_attempts,
                "default_min_stock_level": cfg.default_min_stock_level,
            });
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Configuration OK ({} environment)", cfg.environment);
            }
        }
    }

    Ok(())
}
