//! # moon-catalog
//!
//! A chat bot over a fixed book catalog, with a letter-indexed mirror of the
//! catalog published as hosted pages.
//!
//! ## Architecture
//!
//! - **catalog**: Immutable book list loaded once from a CSV file
//! - **partition**: Grouping of records by leading letter, in publish order
//! - **page**: Page model for one letter group (HTML and page-service nodes)
//! - **publish**: Rate-paced sequential publishing into a sparse letter index
//! - **telegraph**: Page service client
//! - **indexer**: Background publish run and the shared read-only state
//! - **query**: Search, random pick and index listing
//! - **reply**: Chat reply texts
//! - **bot**: Telegram command dispatch and long polling
//! - **config**: Resolution of paths, tokens and settings

pub mod bot;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod indexer;
pub mod page;
pub mod partition;
pub mod publish;
pub mod query;
pub mod reply;
pub mod telegraph;
