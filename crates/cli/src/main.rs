//! Masala CLI - Cart and catalog tools.
//!
//! # Usage
//!
//! ```bash
//! # Work with a local cart (stored in $MASALA_DATA_DIR/cart.json)
//! masala-cli cart add --id 1 --name "Lakadong Turmeric" --price 180 --weight 250g
//! masala-cli cart list
//! masala-cli cart checkout-url --phone 919876543210
//!
//! # Convert a YAML catalog for the storefront
//! masala-cli catalog import catalog.yaml -o crates/storefront/content/products.json
//! ```
//!
//! # Commands
//!
//! - `cart` - List, add, remove, update and clear cart lines; print the order
//!   message or checkout link
//! - `catalog` - Import a YAML catalog to JSON, validate a JSON catalog

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;

use commands::CliError;
use commands::cart::NewLine;

#[derive(Parser)]
#[command(name = "masala-cli")]
#[command(author, version, about = "Masala spice shop CLI tools")]
struct Cli {
    /// Directory holding the local cart
    #[arg(long, env = "MASALA_DATA_DIR", default_value = ".masala", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the local cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the product catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines with their indices
    List,
    /// Add a line (merges with an existing line for the same product and weight)
    Add {
        /// Product ID
        #[arg(long)]
        id: i32,

        /// Product name
        #[arg(long)]
        name: String,

        /// Unit price in rupees
        #[arg(long, allow_hyphen_values = true)]
        price: Decimal,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Pack size (e.g. 250g)
        #[arg(short, long)]
        weight: Option<String>,

        /// Image URL
        #[arg(long)]
        image: Option<String>,
    },
    /// Remove the line at INDEX
    Remove { index: usize },
    /// Set the quantity of the line at INDEX (0 is ignored)
    Update { index: usize, quantity: u32 },
    /// Remove every line
    Clear,
    /// Print the order message
    Message,
    /// Print the WhatsApp checkout link
    CheckoutUrl {
        /// Shop's WhatsApp number, international format
        #[arg(long, env = "MASALA_ORDER_PHONE")]
        phone: String,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Convert a YAML catalog to validated JSON
    Import {
        /// YAML catalog
        input: PathBuf,

        /// JSON output path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Check that a JSON catalog loads
    Validate { path: PathBuf },
}

fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let data_dir = cli.data_dir.as_path();
    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::List => commands::cart::list(data_dir)?,
            CartAction::Add {
                id,
                name,
                price,
                quantity,
                weight,
                image,
            } => commands::cart::add(
                data_dir,
                NewLine {
                    id,
                    name,
                    price,
                    quantity,
                    weight,
                    image,
                },
            )?,
            CartAction::Remove { index } => commands::cart::remove(data_dir, index)?,
            CartAction::Update { index, quantity } => {
                commands::cart::update(data_dir, index, quantity)?;
            }
            CartAction::Clear => commands::cart::clear(data_dir)?,
            CartAction::Message => commands::cart::message(data_dir)?,
            CartAction::CheckoutUrl { phone } => commands::cart::checkout(data_dir, &phone)?,
        },
        Commands::Catalog { action } => match action {
            CatalogAction::Import { input, output } => {
                let count = commands::catalog::import(&input, &output)?;
                tracing::info!(count, "Catalog imported");
            }
            CatalogAction::Validate { path } => commands::catalog::validate(&path)?,
        },
    }
    Ok(())
}
