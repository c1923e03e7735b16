//! The demo content site served over the machine-callable interface.
//!
//! [`store`] holds the posts behind an `RwLock`; [`features`] registers the
//! post-management tools, the site resources and the authoring prompts that
//! expose it.

pub mod features;
pub mod store;

pub use features::register_features;
pub use store::{Post, SiteStore, StoreError};
