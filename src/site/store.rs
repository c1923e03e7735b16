//! In-memory posts store backing the demo site features.
//!
//! The store is the only mutable state in the process; everything else is
//! frozen at boot. It sits behind an `RwLock` so concurrent requests can
//! read while the management tools write. Lock poisoning surfaces as
//! [`StoreError::Poisoned`] rather than a panic.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::{json, Value};
use thiserror::Error;

/// One post on the site.
#[derive(Debug, Clone)]
pub struct Post {
    /// URL-safe identifier, unique across the site.
    pub permalink: String,
    /// Display title.
    pub title: String,
    /// Markdown body.
    pub body: String,
    /// Whether the post is publicly visible.
    pub published: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Renders the full post as a structured value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        json!({
            "permalink": self.permalink,
            "title": self.title,
            "body": self.body,
            "published": self.published,
            "createdAt": self.created_at.to_rfc3339(),
            "updatedAt": self.updated_at.to_rfc3339(),
        })
    }

    /// Renders a listing summary without the body.
    #[must_use]
    pub fn summary_value(&self) -> Value {
        json!({
            "permalink": self.permalink,
            "title": self.title,
            "published": self.published,
            "updatedAt": self.updated_at.to_rfc3339(),
        })
    }

    /// Renders the post as a markdown document.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        format!("# {}\n\n{}\n", self.title, self.body)
    }
}

/// Failures raised by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No post exists under the permalink.
    #[error("no post with permalink '{permalink}'")]
    PostNotFound {
        /// The permalink that was requested.
        permalink: String,
    },

    /// A post already exists under the permalink.
    #[error("a post with permalink '{permalink}' already exists")]
    DuplicatePermalink {
        /// The permalink that collided.
        permalink: String,
    },

    /// The permalink cannot address a post.
    #[error("invalid permalink '{permalink}': must be non-empty and contain no '/'")]
    InvalidPermalink {
        /// The rejected permalink.
        permalink: String,
    },

    /// A writer panicked while holding the lock.
    #[error("posts store lock poisoned")]
    Poisoned,
}

/// The posts collection, ordered by creation.
#[derive(Debug, Default)]
pub struct SiteStore {
    posts: RwLock<IndexMap<String, Post>>,
}

impl SiteStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with a published post and a draft, enough to
    /// exercise every site feature out of the box.
    ///
    /// The seed data is infallible: permalinks are static and distinct.
    #[must_use]
    pub fn with_sample_content() -> Self {
        let store = Self::new();
        let _ = store.create(
            "hello-world",
            "Hello, world",
            "Welcome to the site. Everything here is managed through the \
             machine-callable interface.",
            true,
        );
        let _ = store.create(
            "drafting-in-public",
            "Drafting in public",
            "An unfinished thought about writing where everyone can see.",
            false,
        );
        store
    }

    /// Creates a post.
    ///
    /// # Errors
    ///
    /// Fails on an invalid or duplicate permalink.
    pub fn create(
        &self,
        permalink: &str,
        title: &str,
        body: &str,
        published: bool,
    ) -> Result<Post, StoreError> {
        if permalink.is_empty() || permalink.contains('/') {
            return Err(StoreError::InvalidPermalink {
                permalink: permalink.to_string(),
            });
        }

        let mut posts = self.posts.write().map_err(|_| StoreError::Poisoned)?;
        if posts.contains_key(permalink) {
            return Err(StoreError::DuplicatePermalink {
                permalink: permalink.to_string(),
            });
        }

        let now = Utc::now();
        let post = Post {
            permalink: permalink.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            published,
            created_at: now,
            updated_at: now,
        };
        posts.insert(permalink.to_string(), post.clone());
        Ok(post)
    }

    /// Fetches a post by permalink.
    ///
    /// # Errors
    ///
    /// Fails when no post has the permalink.
    pub fn get(&self, permalink: &str) -> Result<Post, StoreError> {
        let posts = self.posts.read().map_err(|_| StoreError::Poisoned)?;
        posts
            .get(permalink)
            .cloned()
            .ok_or_else(|| StoreError::PostNotFound {
                permalink: permalink.to_string(),
            })
    }

    /// Updates a post's title and/or body.
    ///
    /// # Errors
    ///
    /// Fails when no post has the permalink.
    pub fn update(
        &self,
        permalink: &str,
        title: Option<&str>,
        body: Option<&str>,
    ) -> Result<Post, StoreError> {
        let mut posts = self.posts.write().map_err(|_| StoreError::Poisoned)?;
        let post = posts
            .get_mut(permalink)
            .ok_or_else(|| StoreError::PostNotFound {
                permalink: permalink.to_string(),
            })?;

        if let Some(title) = title {
            post.title = title.to_string();
        }
        if let Some(body) = body {
            post.body = body.to_string();
        }
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    /// Deletes a post, returning it.
    ///
    /// # Errors
    ///
    /// Fails when no post has the permalink.
    pub fn delete(&self, permalink: &str) -> Result<Post, StoreError> {
        let mut posts = self.posts.write().map_err(|_| StoreError::Poisoned)?;
        // shift_remove keeps the remaining posts in creation order.
        posts
            .shift_remove(permalink)
            .ok_or_else(|| StoreError::PostNotFound {
                permalink: permalink.to_string(),
            })
    }

    /// Sets a post's published flag.
    ///
    /// # Errors
    ///
    /// Fails when no post has the permalink.
    pub fn publish(&self, permalink: &str, published: bool) -> Result<Post, StoreError> {
        let mut posts = self.posts.write().map_err(|_| StoreError::Poisoned)?;
        let post = posts
            .get_mut(permalink)
            .ok_or_else(|| StoreError::PostNotFound {
                permalink: permalink.to_string(),
            })?;
        post.published = published;
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    /// Returns all posts in creation order, optionally filtered by their
    /// published flag.
    ///
    /// # Errors
    ///
    /// Fails only when the lock is poisoned.
    pub fn list(&self, published: Option<bool>) -> Result<Vec<Post>, StoreError> {
        let posts = self.posts.read().map_err(|_| StoreError::Poisoned)?;
        Ok(posts
            .values()
            .filter(|post| published.map_or(true, |wanted| post.published == wanted))
            .cloned()
            .collect())
    }
}
