//! # Portfolio Site
//!
//! Renders a personal portfolio (projects, tools, skills, education) either
//! as a live web service or as a pre-rendered static site. Content comes
//! from a seed archive that is loaded into a SQLite document store at
//! startup.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────┐   ┌──────────┐
//! │ Seed zip    │──▶│  Loader  │──▶│  SQLite  │
//! │ json+images │   │ (staged) │   │  tables  │
//! └─────────────┘   └──────────┘   └────┬─────┘
//!                                       │
//!                        Reader ─▶ Aggregator ─▶ PageAssembler
//!                                       │
//!                      ┌────────────────┤
//!                      ▼                ▼
//!                 ┌──────────┐     ┌──────────┐
//!                 │  Static  │     │   HTTP   │
//!                 │  build   │     │  server  │
//!                 └──────────┘     └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration with environment overrides |
//! | [`db`] | Storage handle (lazily connected pool) |
//! | [`migrate`] | Collection tables |
//! | [`models`] | Collection record types |
//! | [`loader`] | Seed loading with staged swap |
//! | [`assets`] | Image fallback resolution |
//! | [`reader`] | Read-only queries |
//! | [`aggregate`] | Category grouping and product tables |
//! | [`pages`] | View models |
//! | [`render`] | Maud templates |
//! | [`server`] | Live HTTP server |
//! | [`builder`] | Static site generation |
//! | [`archive`] | Seed archive extraction |

pub mod aggregate;
pub mod app;
pub mod archive;
pub mod assets;
pub mod builder;
pub mod config;
pub mod db;
pub mod error;
pub mod loader;
pub mod logging;
pub mod migrate;
pub mod models;
pub mod pages;
pub mod reader;
pub mod render;
pub mod server;
