//! CLI for shopping-list resolution
//!
//! Usage:
//!   cargo run --bin cart_cli -- resolve -l shopping_list.json
//!   cargo run --bin cart_cli -- resolve -l list.json --retry --format json
//!   cargo run --bin cart_cli -- lookup -i 10451002
//!
//! The shopping list file is a JSON array of
//! `{"ingredient": ..., "product": ..., "quantity": ...}` objects.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use recipe_cart::walmart::StaticHeaders;
use recipe_cart::{AffiliateClient, Config, ShoppingListEntry, ShoppingListResolver};

#[derive(Parser)]
#[command(name = "cart_cli")]
#[command(about = "Resolve a shopping list into a Walmart cart URL")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a shopping-list file into a cart URL
    Resolve {
        /// Path to the shopping list JSON file
        #[arg(short = 'l', long)]
        list: PathBuf,

        /// Retry failed items with refined search terms instead of skipping
        /// them on first failure
        #[arg(long)]
        retry: bool,

        /// Output format (text, json)
        #[arg(short = 'f', long, default_value = "text")]
        format: String,
    },
    /// Look up a product by item id
    Lookup {
        /// Catalog item id
        #[arg(short = 'i', long)]
        item_id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    match args.command {
        Command::Resolve {
            list,
            retry,
            format,
        } => resolve(list, retry, &format).await,
        Command::Lookup { item_id } => lookup(item_id).await,
    }
}

async fn resolve(list: PathBuf, retry: bool, format: &str) -> Result<()> {
    let raw = std::fs::read_to_string(&list)
        .with_context(|| format!("reading shopping list {}", list.display()))?;
    let entries: Vec<ShoppingListEntry> =
        serde_json::from_str(&raw).context("parsing shopping list JSON")?;

    let resolver = ShoppingListResolver::from_env()?;
    let result = resolver.resolve_to_cart(&entries, None, !retry).await;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => {
            println!("Proposed Cart ({} items):", result.items.len());
            for line in &result.items {
                println!(
                    "- {} x{} ({})",
                    line.item_id, line.quantity, line.rationale
                );
            }
            if !result.skipped.is_empty() {
                println!("\nSkipped items:");
                for name in &result.skipped {
                    println!("- {name}");
                }
            }
            println!("\n{}", result.summary);
            println!("Cart URL: {}", result.url);
        }
    }
    Ok(())
}

async fn lookup(item_id: i64) -> Result<()> {
    let config = Config::from_env();
    let headers = Arc::new(StaticHeaders::from_config(&config));
    let client = AffiliateClient::new(&config, headers);
    let items = client.lookup(item_id).await?;
    println!("{}", serde_json::to_string_pretty(&items)?);
    Ok(())
}
