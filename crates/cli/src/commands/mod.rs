//! CLI command implementations.

pub mod cart;
pub mod catalog;

use std::path::PathBuf;

use masala_core::{CartEntryError, CartError, PhoneError};
use masala_storefront::catalog::CatalogError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Cart operation was rejected.
    #[error("{0}")]
    Cart(#[from] CartError),

    /// Cart line could not be built.
    #[error("invalid cart line: {0}")]
    Entry(#[from] CartEntryError),

    /// Catalog failed to load or validate.
    #[error("{0}")]
    Catalog(#[from] CatalogError),

    /// File could not be read or written.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// YAML input is malformed.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON output could not be produced.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing to stdout failed.
    #[error("output error: {0}")]
    Output(#[from] std::io::Error),

    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// Phone number is not usable in a WhatsApp link.
    #[error("invalid phone number: {0}")]
    InvalidPhone(#[from] PhoneError),
}
