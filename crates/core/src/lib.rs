//! Masala Core - Cart engine and shared types.
//!
//! This crate provides the pieces every Masala component builds on:
//! - `storefront` - Public-facing spice shop (renders products and carts)
//! - `cli` - Command-line cart and catalog tools
//!
//! # Architecture
//!
//! The core crate owns the cart state machine and the product schema. It has
//! no HTTP or template dependencies. Persistence goes through the
//! [`store::KeyValueStore`] trait so the same engine runs against a browser
//! session slot, a file on disk, or plain memory in tests.
//!
//! # Modules
//!
//! - [`cart`] - Cart engine, line entries, subscriber bus, order hand-off
//! - [`store`] - Key/value persistence backends and the cart slot adapter
//! - [`product`] - Catalog product schema with reviews and discounts
//! - [`types`] - Newtype IDs and currency formatting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod product;
pub mod store;
pub mod types;

pub use cart::{
    Cart, CartEntry, CartEntryError, CartError, LineKey, PhoneError, SubscriberError, SubscriptionId,
};
pub use product::{Category, Product, ProductError, Review, StarRating};
pub use store::{CartStore, FileStore, KeyValueStore, MemoryStore, StoreError};
pub use types::*;
