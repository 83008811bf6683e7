//! # stream-cms
//!
//! Static site builder for a sports streaming schedule.
//!
//! ## Architecture
//!
//! - **models**: Match records and the raw feed envelope
//! - **config**: App configuration (TOML) and the operator's site config (JSON)
//! - **classify**: Groups matches into sport and league buckets
//! - **priority**: Ranks, titles and filters buckets per country
//! - **assemble**: Splits a page's matches into live, top upcoming and sections
//! - **render**: Fills the HTML template
//! - **fetch**: Feed download
//! - **build**: One full rebuild, end to end
//! - **publish**: git publishing
//! - **api**: Admin HTTP server

pub mod api;
pub mod assemble;
pub mod build;
pub mod classify;
pub mod config;
pub mod fetch;
pub mod models;
pub mod priority;
pub mod publish;
pub mod render;

pub use models::*;
