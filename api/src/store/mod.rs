//! Persistence for blogs, comments, notifications and sessions.
//!
//! Every write is a single statement. Callers compose them into multi-step
//! operations without a surrounding transaction, so a failure between two
//! calls leaves the earlier ones applied.

use async_trait::async_trait;
use diesel_async::pooled_connection::deadpool::PoolError;

use crate::blog::models::{
    blog::Blog,
    blog_comment::{BlogComment, NewBlogComment},
    notification::NewNotification,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("could not get a database connection: {0}")]
    Pool(#[from] PoolError),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A page of rows, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn find_blog(&self, blog_id: i32) -> StoreResult<Option<Blog>>;

    /// Adds the deltas to the blog's comment counters.
    async fn increment_blog_counters(
        &self,
        blog_id: i32,
        total_comments: i64,
        total_parent_comments: i64,
    ) -> StoreResult<()>;

    async fn find_comment(&self, id: i32) -> StoreResult<Option<BlogComment>>;

    async fn insert_comment(&self, comment: NewBlogComment) -> StoreResult<BlogComment>;

    /// Top-level comments of a blog.
    async fn find_top_level_comments(&self, blog_id: i32, page: Page)
    -> StoreResult<Vec<BlogComment>>;

    /// The comments among `ids`, ordered by creation time descending with ties
    /// broken by id descending.
    async fn find_comments_in(&self, ids: &[i32], page: Page) -> StoreResult<Vec<BlogComment>>;

    async fn push_child(&self, parent_id: i32, child_id: i32) -> StoreResult<()>;

    async fn pull_child(&self, parent_id: i32, child_id: i32) -> StoreResult<()>;

    /// Deletes the comment and returns the removed row. Returns `None` when the
    /// row was already gone, so only one of several racing deletes sees it.
    async fn delete_comment(&self, id: i32) -> StoreResult<Option<BlogComment>>;

    async fn insert_notification(&self, notification: NewNotification) -> StoreResult<()>;

    /// Records `reply_id` as the reply to a notification owned by `recipient_id`.
    async fn set_notification_reply(
        &self,
        notification_id: i32,
        recipient_id: i32,
        reply_id: i32,
    ) -> StoreResult<()>;

    /// Deletes notifications whose subject is the comment.
    async fn delete_notifications_for_comment(&self, comment_id: i32) -> StoreResult<u64>;

    /// Clears the reply reference on notifications pointing at the comment.
    async fn clear_notification_reply(&self, comment_id: i32) -> StoreResult<u64>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The identity owning an active, unexpired session with this token.
    async fn find_session_identity(&self, token: &str) -> StoreResult<Option<i32>>;
}

pub trait Store: CommentStore + SessionStore {}

impl<T: CommentStore + SessionStore> Store for T {}
