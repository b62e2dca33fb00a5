pub mod create;
pub mod delete;
pub mod get;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{
    blog::models::blog_comment::BlogComment,
    error::{ApiRequestError, AppError},
    store::StoreError,
};

pub const MAX_CONTENT_LENGTH: usize = 5000;

#[derive(thiserror::Error, Debug)]
pub enum CommentError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("You can not delete this comment")]
    PermissionDenied,

    /// A store call failed. Steps applied before the failure are kept.
    #[error("Something went wrong: {0}")]
    Dependency(#[from] StoreError),
}

impl ApiRequestError for CommentError {
    fn status_code(&self) -> StatusCode {
        match self {
            CommentError::Validation(_) => StatusCode::BAD_REQUEST,
            CommentError::NotFound(_) => StatusCode::NOT_FOUND,
            CommentError::PermissionDenied => StatusCode::FORBIDDEN,
            CommentError::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CommentError> for AppError {
    fn from(e: CommentError) -> Self {
        match e {
            CommentError::Dependency(e) => e.into(),
            e => AppError::from_request_error(e),
        }
    }
}

// The model that will be returned to the client
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CommentView {
    pub id: i32,
    pub blog_id: i32,
    pub author_id: i32,
    pub content: String,
    pub parent_id: Option<i32>,
    pub is_reply: bool,
    pub depth: i32,
    pub children: Vec<i32>,
    pub created_at: chrono::NaiveDateTime,
}

impl From<BlogComment> for CommentView {
    fn from(c: BlogComment) -> Self {
        CommentView {
            id: c.id,
            blog_id: c.blog_id,
            author_id: c.author_id,
            content: c.content,
            parent_id: c.parent_id,
            is_reply: c.is_reply,
            depth: c.depth,
            children: c.children,
            created_at: c.created_at,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use crate::{
        blog::models::{blog::Blog, blog_comment::BlogComment},
        store::MemoryStore,
    };

    use super::create::{CommentSubmission, add_comment};

    pub const BLOG_AUTHOR: i32 = 1000;
    pub const COMMENTER: i32 = 2000;
    pub const REPLIER: i32 = 3000;
    pub const STRANGER: i32 = 4000;

    pub fn store_with_blog() -> (MemoryStore, Blog) {
        let store = MemoryStore::new();
        let blog = store.create_blog(BLOG_AUTHOR, "Threads").unwrap();
        (store, blog)
    }

    pub async fn comment(
        store: &MemoryStore,
        blog_id: i32,
        author_id: i32,
        content: &str,
        parent_id: Option<i32>,
    ) -> BlogComment {
        add_comment(
            store,
            blog_id,
            author_id,
            CommentSubmission::new(content, parent_id),
        )
        .await
        .unwrap()
    }
}
