use axum::{
    Json, debug_handler,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use super::{CommentError, CommentView, MAX_CONTENT_LENGTH};
use crate::{
    App,
    blog::models::{
        blog_comment::{BlogComment, NewBlogComment},
        notification::NewNotification,
    },
    error::AppError,
    identity::AuthUser,
    store::{CommentStore, StoreResult},
};

#[debug_handler]
pub async fn create_comment(
    State(ctx): State<App>,
    Path(blog_id): Path<i32>,
    AuthUser(auth_user): AuthUser,
    crate::json::Json(submission): crate::json::Json<CommentSubmission>,
) -> Result<Json<CommentView>, AppError> {
    let comment = add_comment(ctx.store.as_ref(), blog_id, auth_user.id, submission).await?;

    Ok(Json(comment.into()))
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CommentSubmission {
    content: String,
    parent_id: Option<i32>,

    /// Set when replying from the notifications page; the notification gets
    /// linked to the new reply.
    #[serde(default)]
    notification_id: Option<i32>,
}

impl CommentSubmission {
    pub fn new(content: impl Into<String>, parent_id: Option<i32>) -> Self {
        CommentSubmission {
            content: content.into(),
            parent_id,
            notification_id: None,
        }
    }

    pub fn from_notification(mut self, notification_id: i32) -> Self {
        self.notification_id = Some(notification_id);
        self
    }

    fn validate(&mut self) -> Result<(), CommentError> {
        self.content = self.content.trim().to_string();

        if self.content.is_empty() {
            return Err(CommentError::Validation(
                "Write something to leave a comment",
            ));
        }

        if self.content.len() > MAX_CONTENT_LENGTH {
            return Err(CommentError::Validation(
                "Content too long (max 5000 characters)",
            ));
        }

        Ok(())
    }
}

/// Creates a comment on a blog, or a reply when `parent_id` is set.
///
/// The comment row is written first, then the parent's children list, the
/// blog counters and the notifications. A failure in any later step is
/// returned as [`CommentError::Dependency`] and the comment stays.
pub async fn add_comment<S: CommentStore + ?Sized>(
    store: &S,
    blog_id: i32,
    author_id: i32,
    mut submission: CommentSubmission,
) -> Result<BlogComment, CommentError> {
    submission.validate()?;

    let blog = store
        .find_blog(blog_id)
        .await?
        .ok_or(CommentError::NotFound("Blog"))?;

    let parent = match submission.parent_id {
        Some(parent_id) => {
            let parent = store
                .find_comment(parent_id)
                .await?
                .ok_or(CommentError::NotFound("Parent comment"))?;

            if parent.blog_id != blog.id {
                return Err(CommentError::Validation(
                    "You're replying to a comment that does not belong to this blog",
                ));
            }

            Some(parent)
        }
        None => None,
    };

    let comment = store
        .insert_comment(NewBlogComment {
            blog_id: blog.id,
            author_id,
            blog_author_id: blog.author_id,
            content: submission.content,
            parent_id: parent.as_ref().map(|p| p.id),
            is_reply: parent.is_some(),
            depth: parent.as_ref().map_or(0, |p| p.depth + 1),
        })
        .await?;

    tracing::info!(
        comment_id = comment.id,
        blog_id,
        parent_id = ?comment.parent_id,
        depth = comment.depth,
        "New comment created"
    );

    if let Err(e) = link_comment(
        store,
        &comment,
        parent.as_ref(),
        submission.notification_id,
    )
    .await
    {
        tracing::error!(
            comment_id = comment.id,
            blog_id,
            error = %e,
            "Comment was saved, but updating the thread failed"
        );
        return Err(e.into());
    }

    Ok(comment)
}

async fn link_comment<S: CommentStore + ?Sized>(
    store: &S,
    comment: &BlogComment,
    parent: Option<&BlogComment>,
    notification_id: Option<i32>,
) -> StoreResult<()> {
    if let Some(parent) = parent {
        store.push_child(parent.id, comment.id).await?;
    }

    store
        .increment_blog_counters(comment.blog_id, 1, if parent.is_none() { 1 } else { 0 })
        .await?;

    let recipient_id = match parent {
        Some(parent) => {
            if let Some(notification_id) = notification_id {
                store
                    .set_notification_reply(notification_id, comment.author_id, comment.id)
                    .await?;
                tracing::debug!(notification_id, reply_id = comment.id, "Notification updated");
            }
            parent.author_id
        }
        None => comment.blog_author_id,
    };

    store
        .insert_notification(NewNotification::for_comment(
            comment.blog_id,
            comment.author_id,
            comment.id,
            recipient_id,
            parent.map(|p| p.id),
        ))
        .await?;

    tracing::debug!(comment_id = comment.id, recipient_id, "New notification created");

    Ok(())
}
