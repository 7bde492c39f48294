//! # Roster Compactor
//!
//! Ingests pasted Warhammer 40k army lists written in any of the common
//! export dialects and turns them into one canonical tree plus a compact
//! wargear abbreviation index.
//!
//! ## Architecture
//!
//! - **classify**: Dialect detection by weighted signal scoring
//! - **parsers**: One parser per dialect over a shared body engine
//! - **standardize**: Faction, family and total-points normalization
//! - **abbrev**: Unique wargear abbreviations and skip rules
//! - **ingest**: The classify → parse → standardize → abbreviate pipeline
//! - **models**: Core data structures (lists, units, items, formats)
//! - **text** / **factions**: Name helpers and lookup tables
//! - **storage**: JSONL output for batch runs
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod abbrev;
pub mod api;
pub mod classify;
pub mod config;
pub mod factions;
pub mod ingest;
pub mod models;
pub mod parsers;
pub mod standardize;
pub mod storage;
pub mod text;

pub use models::*;
