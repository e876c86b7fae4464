//! # Snippets
//!
//! A local-first snippet manager with ranked lookup and `{variable}`
//! templates.
//!
//! Snippets are short keyed texts. A value may contain `{name}`
//! placeholders that are filled from `name=value` arguments when the
//! snippet is used. Lookups are ranked by key match quality, usage
//! history, recency, template completeness and favorites.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌────────────────────┐
//! │   CLI    │──▶│   Manager    │──▶│ Store              │
//! │  (snip)  │   │ query/expand │   │ SQLite │ JSON file │
//! └──────────┘   └──────┬───────┘   └────────────────────┘
//!                       │
//!            ┌──────────┴─────────┐
//!            ▼                    ▼
//!      ┌──────────┐        ┌──────────┐
//!      │ template │        │ ranking  │
//!      └──────────┘        └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! snip init
//! snip add greet "Hello {name}, welcome to {place}"
//! snip query gr name=Ada place=Paris
//! snip use greet name=Ada place=Paris
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | The `Snippet` record and timestamp formats |
//! | [`error`] | Typed rejections surfaced to users |
//! | [`template`] | `{variable}` extraction and substitution |
//! | [`ranking`] | Composite display score |
//! | [`store`] | Storage trait with SQLite and JSON backends |
//! | [`db`] | SQLite connection options |
//! | [`migrate`] | Schema creation and additive upgrades |
//! | [`manager`] | Validation and flushing over a store |
//! | [`search`] | Query tokenization and ranking pipeline |
//! | [`export`] | JSON import and export |
//! | [`get`] | `snip get` output |
//! | [`stats`] | `snip stats` output |

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod get;
pub mod manager;
pub mod migrate;
pub mod models;
pub mod ranking;
pub mod search;
pub mod stats;
pub mod store;
pub mod template;
