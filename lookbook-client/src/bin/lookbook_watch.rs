//! lookbook-watch - follow the live catalog from a terminal
//!
//! ```text
//! lookbook-watch --category tops --sort price_low
//! LOOKBOOK_ADMIN_EMAIL=... LOOKBOOK_ADMIN_PASSWORD=... lookbook-watch --json
//! ```

use clap::Parser;
use lookbook_client::{
    AuthProvider, CategoryFilter, ClientConfig, Credential, LiveView, PasswordAuth, RestStore,
    SortKey, ViewModel, init_logger,
};
use shared::catalog::{filter_public, outfit_display_total, sort_products};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "lookbook-watch", about = "Follow the live catalog")]
struct Args {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, env = "LOOKBOOK_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// JSON log output
    #[arg(long)]
    json: bool,

    /// Also write daily rotating logs here
    #[arg(long, env = "LOOKBOOK_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Category to list ("all" for everything)
    #[arg(long, default_value = "all")]
    category: CategoryFilter,

    /// featured | newest | price_low | price_high
    #[arg(long, default_value = "featured")]
    sort: SortKey,

    /// Admin email; signs in when given with a password
    #[arg(long, env = "LOOKBOOK_ADMIN_EMAIL")]
    email: Option<String>,

    #[arg(long, env = "LOOKBOOK_ADMIN_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = ClientConfig::from_env();
    init_logger(&args.log_level, args.json, args.log_dir.as_deref())?;

    tracing::info!(database = %config.database_url, "lookbook-watch starting");

    let mut store = RestStore::new(&config)?;
    if let (Some(email), Some(password)) = (&args.email, &args.password) {
        let auth = PasswordAuth::new(&config)?;
        let session = auth.sign_in(&Credential::new(email, password)).await?;
        store = store.with_session(&session);
    }

    let mut view = LiveView::builder(&store)
        .name("watch")
        .from_config(&config)
        .spawn()
        .await?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C signal, shutting down...");
                break;
            }
            model = view.changed() => {
                let Some(model) = model else {
                    tracing::warn!("Live view stopped");
                    break;
                };
                print_model(&model, &args);
            }
        }
    }

    view.close().await;
    Ok(())
}

fn print_model(model: &ViewModel, args: &Args) {
    let counts = model.counts;
    println!(
        "\n== {} products | {} outfits | {} categories ==",
        counts.products, counts.outfits, counts.categories
    );
    for (label, error) in [
        ("products", model.products.error()),
        ("outfits", model.outfits.error()),
    ] {
        if let Some(error) = error {
            println!("!! {label}: {error}");
        }
    }
    if !model.categories.is_empty() {
        println!("categories: {}", model.categories.join(", "));
    }

    let products = sort_products(&filter_public(&model.products.entities, &args.category), args.sort);
    for product in &products {
        let badge = match (product.is_new, product.is_sale) {
            (true, true) => " [new, sale]",
            (true, false) => " [new]",
            (false, true) => " [sale]",
            (false, false) => "",
        };
        println!("  {:<40} {:>10.2}  {}{badge}", product.name, product.price, product.category);
    }
    for outfit in &model.outfits.entities {
        println!(
            "  outfit {:<33} {:>10.2}  {} items",
            outfit.name,
            outfit_display_total(outfit),
            outfit.items.len()
        );
    }
}
