//! jobharvest - job posting harvester.
//!
//! Pulls listings from a fixed set of job boards, keeps the ones relevant to
//! a target occupation and normalizes them into [`models::Posting`] records
//! that are handed to an external document store.

pub mod cli;
pub mod config;
pub mod harvest;
pub mod models;
pub mod scrapers;
pub mod server;
pub mod storage;

pub use harvest::Harvester;
pub use models::{HarvestIssue, HarvestRequest, HarvestResult, Posting, SourceId};
