use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use tracing::info;

#[derive(Parser)]
#[command(name = "drk")]
#[command(about = "Drink shop operator CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> site -> local...)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    /// Connectivity, order table presence and optional order columns.
    Status,

    /// Apply SQL migrations.
    Migrate,

    /// Upsert stores and products from a YAML catalog.
    Seed {
        /// Catalog file with `stores:` and `products:` lists
        #[arg(long)]
        catalog: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env.local if present (dev convenience).
    let _ = dotenvy::from_filename(".env.local");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Db { cmd } => {
            let pool = connect_configured().await?;
            match cmd {
                DbCmd::Status => {
                    let s = drk_db::status(&pool).await?;
                    println!("db_ok={} has_order_table={}", s.ok, s.has_order_table);
                    if s.has_order_table {
                        let caps = drk_db::probe_capabilities(&pool).await?;
                        println!(
                            "has_store_id={} has_order_code={} has_total_amount={} has_status={}",
                            caps.has_store_id,
                            caps.has_order_code,
                            caps.has_total_amount,
                            caps.has_status
                        );
                        println!(
                            "item_sweetness={} item_has_note={}",
                            caps.item_sweetness.map(|c| c.as_str()).unwrap_or("none"),
                            caps.item_has_note
                        );
                    }
                }
                DbCmd::Migrate => {
                    drk_db::migrate(&pool).await?;
                    info!("migrations applied");
                    println!("migrations_applied=true");
                }
                DbCmd::Seed { catalog } => {
                    let raw = fs::read_to_string(&catalog)
                        .with_context(|| format!("failed to read catalog: {catalog}"))?;
                    let parsed: drk_db::Catalog =
                        serde_yaml::from_str(&raw).context("invalid catalog yaml")?;
                    let report = drk_db::seed_catalog(&pool, &parsed).await?;
                    info!(%catalog, stores = report.stores, products = report.products, "catalog seeded");
                    println!(
                        "seeded_stores={} seeded_products={}",
                        report.stores, report.products
                    );
                }
            }
        }

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = drk_config::load_layered_yaml(&path_refs)?;
            let unused =
                drk_config::report_unused_keys(&loaded.config_json, drk_config::UnusedKeyPolicy::Warn)?;
            for key in &unused.unused_leaf_pointers {
                eprintln!("unused_key={key}");
            }
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}

/// Connect using the env var named by the layered config (`DRK_CONFIG`).
async fn connect_configured() -> Result<sqlx::PgPool> {
    let cfg = drk_config::load_from_env()?.shop()?;
    let secret = drk_config::resolve_database_url(&cfg)?;
    drk_db::connect(&secret.url, cfg.database.max_connections).await
}
