//! Data models for every resource kind the dashboard manages.
//!
//! Field names follow the remote store's JSON exactly.

mod blog;
mod career;
mod catalog;
mod query;
mod record;
mod team;

pub use blog::*;
pub use career::*;
pub use catalog::*;
pub use query::*;
pub use record::{Record, Resource};
pub use team::*;
