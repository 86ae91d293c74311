//! Data models for jobharvest.

mod harvest;
mod posting;
mod source;

pub use harvest::{HarvestIssue, HarvestRequest, HarvestResult, RequestDefaults};
pub use posting::{LifecycleStatus, Posting};
pub use source::SourceId;
