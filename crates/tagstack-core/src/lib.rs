//! # tagstack-core
//!
//! Core types, traits, and the tag hierarchy engine for tagstack.
//!
//! Each owner (tenant) keeps a forest of tags and a set of bookmarks tagged
//! with them. This crate provides:
//! - the data model and error taxonomy,
//! - the [`TagRepository`] / [`BookmarkRepository`] contracts every store
//!   implements,
//! - [`TagForest`], the owner-scoped read model that enforces acyclic
//!   reparenting,
//! - [`HierarchyViewBuilder`], which renders a bookmark's tags as pruned
//!   root-to-tag trees,
//! - an in-memory store ([`memory::InMemoryStore`]).
//!
//! Structured log events use the fields `subsystem`, `component`, `op`,
//! `owner_id`, `tag_id`, `bookmark_id`, `duration_ms`, `result_count` and
//! `deleted_count`.

pub mod error;
pub mod forest;
pub mod hierarchy;
pub mod memory;
pub mod models;
pub mod traits;
pub mod validation;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use forest::TagForest;
pub use hierarchy::{
    bookmark_view, bookmark_views, render_bookmark_hierarchy, HierarchyViewBuilder,
};
pub use models::*;
pub use traits::*;
pub use validation::{normalize_tag_name, require_fragment, require_url, MAX_TAG_NAME_LEN};
