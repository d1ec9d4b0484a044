//! IMPACTO33 CLI - Database migrations and sitemap generation.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! i33-cli migrate
//!
//! # Write sitemap.xml, sitemap-pages.xml and sitemap-products.xml
//! i33-cli sitemap --out crates/storefront/static
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "i33-cli")]
#[command(author, version, about = "IMPACTO33 CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Generate the XML sitemaps
    Sitemap {
        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        /// Public site URL used in `<loc>` entries
        #[arg(long, env = "STOREFRONT_BASE_URL", default_value = impacto33_storefront::site::SITE_URL)]
        base_url: String,

        /// Directory holding `categories/*.json`
        #[arg(long, default_value = "crates/storefront/content")]
        content_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Sitemap {
            out,
            base_url,
            content_dir,
        } => {
            commands::sitemap::generate(&out, &base_url, &content_dir).await?;
        }
    }
    Ok(())
}
