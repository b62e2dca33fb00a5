use axum::{
    Json, debug_handler,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use super::CommentError;
use crate::{
    App,
    blog::models::blog_comment::BlogComment,
    error::AppError,
    identity::AuthUser,
    store::{CommentStore, StoreResult},
};

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Deleted {
    pub status: String,
    /// Number of comments removed, the target included.
    pub removed: u64,
}

#[debug_handler]
pub async fn delete_comment(
    State(ctx): State<App>,
    Path(id): Path<i32>,
    AuthUser(auth_user): AuthUser,
) -> Result<Json<Deleted>, AppError> {
    let removed = delete_comment_tree(ctx.store.as_ref(), auth_user.id, id).await?;

    Ok(Json(Deleted {
        status: "done".into(),
        removed,
    }))
}

/// Deletes a comment together with all of its replies, at any depth.
///
/// Only the comment's author and the blog's author may do this. Returns the
/// number of comments removed.
pub async fn delete_comment_tree<S: CommentStore + ?Sized>(
    store: &S,
    caller_id: i32,
    comment_id: i32,
) -> Result<u64, CommentError> {
    let comment = store
        .find_comment(comment_id)
        .await?
        .ok_or(CommentError::NotFound("Comment"))?;

    if !comment.can_be_deleted_by(caller_id) {
        tracing::warn!(
            comment_id,
            caller_id,
            "Refusing to delete a comment the caller does not own"
        );
        return Err(CommentError::PermissionDenied);
    }

    let mut removed = 0;
    if let Err(e) = delete_subtree(store, &comment, &mut removed).await {
        tracing::error!(
            comment_id,
            removed,
            error = %e,
            "Comment deletion stopped part way"
        );
        return Err(e.into());
    }

    tracing::info!(comment_id, blog_id = comment.blog_id, removed, "Comment deleted");

    Ok(removed)
}

/// Deletes replies before their parent, unlinking each comment from its
/// parent before its row goes. Whatever a failure leaves behind is still a
/// well-formed tree.
async fn delete_subtree<S: CommentStore + ?Sized>(
    store: &S,
    root: &BlogComment,
    removed: &mut u64,
) -> StoreResult<()> {
    let subtree = collect_subtree(store, root).await?;

    for comment in subtree.iter().rev() {
        if let Some(parent_id) = comment.parent_id {
            store.pull_child(parent_id, comment.id).await?;
        }

        // Someone else got to it first; their delete already did the cleanup.
        let Some(comment) = store.delete_comment(comment.id).await? else {
            tracing::debug!(comment_id = comment.id, "Comment already deleted");
            continue;
        };

        store.delete_notifications_for_comment(comment.id).await?;
        store.clear_notification_reply(comment.id).await?;

        store
            .increment_blog_counters(
                comment.blog_id,
                -1,
                if comment.is_top_level() { -1 } else { 0 },
            )
            .await?;

        *removed += 1;
    }

    Ok(())
}

/// The root and every reply below it, in depth-first pre-order.
async fn collect_subtree<S: CommentStore + ?Sized>(
    store: &S,
    root: &BlogComment,
) -> StoreResult<Vec<BlogComment>> {
    let mut subtree = vec![];
    let mut pending = vec![root.clone()];

    while let Some(comment) = pending.pop() {
        for child_id in comment.children.iter().rev() {
            if let Some(child) = store.find_comment(*child_id).await? {
                pending.push(child);
            }
        }
        subtree.push(comment);
    }

    Ok(subtree)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        blog::comment::{
            create::{CommentSubmission, add_comment},
            test_utils::{BLOG_AUTHOR, COMMENTER, REPLIER, STRANGER, comment, store_with_blog},
        },
        store::{MemoryStore, memory::StoreOp},
    };

    #[tokio::test]
    async fn deleting_a_top_level_comment_removes_every_descendant() {
        let (store, blog) = store_with_blog();
        let top = comment(&store, blog.id, COMMENTER, "root", None).await;
        let a = comment(&store, blog.id, REPLIER, "a", Some(top.id)).await;
        let b = comment(&store, blog.id, REPLIER, "b", Some(top.id)).await;
        comment(&store, blog.id, COMMENTER, "a1", Some(a.id)).await;
        let a2 = comment(&store, blog.id, COMMENTER, "a2", Some(a.id)).await;
        comment(&store, blog.id, REPLIER, "a2x", Some(a2.id)).await;
        comment(&store, blog.id, COMMENTER, "b1", Some(b.id)).await;
        let survivor = comment(&store, blog.id, STRANGER, "other", None).await;

        let before = store.blog(blog.id).unwrap();
        assert_eq!(before.total_comments, 8);
        assert_eq!(before.total_parent_comments, 2);

        let removed = delete_comment_tree(&store, COMMENTER, top.id).await.unwrap();
        assert_eq!(removed, 7);

        let after = store.blog(blog.id).unwrap();
        assert_eq!(after.total_comments, 1);
        assert_eq!(after.total_parent_comments, 1);
        assert_eq!(
            store.comments().into_iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![survivor.id]
        );
    }

    #[tokio::test]
    async fn deleting_a_reply_keeps_parent_counters_and_unlinks_it() {
        let (store, blog) = store_with_blog();
        let a = comment(&store, blog.id, COMMENTER, "A", None).await;
        let r1 = comment(&store, blog.id, REPLIER, "R1", Some(a.id)).await;
        let r1a = comment(&store, blog.id, COMMENTER, "R1a", Some(r1.id)).await;
        let r2 = comment(&store, blog.id, REPLIER, "R2", Some(a.id)).await;
        comment(&store, blog.id, STRANGER, "B", None).await;

        let removed = delete_comment_tree(&store, REPLIER, r1.id).await.unwrap();
        assert_eq!(removed, 2);

        assert!(store.comment(r1.id).is_none());
        assert!(store.comment(r1a.id).is_none());
        assert_eq!(store.comment(a.id).unwrap().children, vec![r2.id]);

        let blog = store.blog(blog.id).unwrap();
        assert_eq!(blog.total_comments, 3);
        assert_eq!(blog.total_parent_comments, 2);
    }

    #[tokio::test]
    async fn blog_author_can_delete_any_comment() {
        let (store, blog) = store_with_blog();
        let top = comment(&store, blog.id, COMMENTER, "spam", None).await;

        let removed = delete_comment_tree(&store, BLOG_AUTHOR, top.id).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.comments().is_empty());
    }

    #[tokio::test]
    async fn strangers_cannot_delete() {
        let (store, blog) = store_with_blog();
        let top = comment(&store, blog.id, COMMENTER, "mine", None).await;
        let reply = comment(&store, blog.id, REPLIER, "reply", Some(top.id)).await;

        // Replying under a comment does not grant rights over it.
        let result = delete_comment_tree(&store, REPLIER, top.id).await;
        assert!(matches!(result, Err(CommentError::PermissionDenied)));

        let result = delete_comment_tree(&store, STRANGER, reply.id).await;
        assert!(matches!(result, Err(CommentError::PermissionDenied)));

        assert_eq!(store.comments().len(), 2);
        assert_eq!(store.comment(top.id).unwrap().children, vec![reply.id]);
        assert_eq!(store.blog(blog.id).unwrap().total_comments, 2);
        assert_eq!(store.notifications().len(), 2);
    }

    #[tokio::test]
    async fn unknown_comment_is_not_found() {
        let (store, _) = store_with_blog();
        let result = delete_comment_tree(&store, COMMENTER, 404).await;
        assert!(matches!(result, Err(CommentError::NotFound(_))));
    }

    #[tokio::test]
    async fn notifications_are_cleaned_up() {
        let (store, blog) = store_with_blog();
        let top = comment(&store, blog.id, COMMENTER, "question", None).await;
        let notification = store.notifications()[0].clone();

        // The blog author answers from the notification, linking the reply.
        let answer = add_comment(
            &store,
            blog.id,
            BLOG_AUTHOR,
            CommentSubmission::new("answer", Some(top.id)).from_notification(notification.id),
        )
        .await
        .unwrap();

        delete_comment_tree(&store, BLOG_AUTHOR, answer.id).await.unwrap();

        let notifications = store.notifications();
        // The reply notification went away with its comment.
        assert_eq!(notifications.len(), 1);
        // The notification the author answered survives without its reply.
        assert_eq!(notifications[0].id, notification.id);
        assert_eq!(notifications[0].reply_id, None);
    }

    #[tokio::test]
    async fn second_delete_of_the_same_comment_is_not_found() {
        let (store, blog) = store_with_blog();
        let top = comment(&store, blog.id, COMMENTER, "once", None).await;

        delete_comment_tree(&store, COMMENTER, top.id).await.unwrap();
        let result = delete_comment_tree(&store, COMMENTER, top.id).await;

        assert!(matches!(result, Err(CommentError::NotFound(_))));
        let blog = store.blog(blog.id).unwrap();
        assert_eq!(blog.total_comments, 0);
        assert_eq!(blog.total_parent_comments, 0);
    }

    #[tokio::test]
    async fn store_failure_is_a_dependency_error() {
        let (store, blog) = store_with_blog();
        let top = comment(&store, blog.id, COMMENTER, "root", None).await;
        store.fail_on(StoreOp::DeleteComment).unwrap();

        let result = delete_comment_tree(&store, COMMENTER, top.id).await;
        assert!(matches!(result, Err(CommentError::Dependency(_))));
        assert!(store.comment(top.id).is_some());
    }

    /// `A -> R1 -> R1a`, where `R1` is owned by the replier.
    async fn chain(store: &MemoryStore, blog_id: i32) -> (BlogComment, BlogComment, BlogComment) {
        let a = comment(store, blog_id, COMMENTER, "A", None).await;
        let r1 = comment(store, blog_id, REPLIER, "R1", Some(a.id)).await;
        let r1a = comment(store, blog_id, COMMENTER, "R1a", Some(r1.id)).await;
        (a, r1, r1a)
    }

    #[tokio::test]
    async fn failing_to_unlink_leaves_the_subtree_in_place() {
        let (store, blog) = store_with_blog();
        let (a, r1, r1a) = chain(&store, blog.id).await;
        store.fail_on(StoreOp::PullChild).unwrap();

        let result = delete_comment_tree(&store, REPLIER, r1.id).await;
        assert!(matches!(result, Err(CommentError::Dependency(_))));

        assert_eq!(store.comment(a.id).unwrap().children, vec![r1.id]);
        assert_eq!(store.comment(r1.id).unwrap().children, vec![r1a.id]);
        assert!(store.comment(r1a.id).is_some());
        assert_eq!(store.blog(blog.id).unwrap().total_comments, 3);

        store.recover().unwrap();
        let removed = delete_comment_tree(&store, REPLIER, r1.id).await.unwrap();
        assert_eq!(removed, 2);
        assert!(store.comment(a.id).unwrap().children.is_empty());
        let blog = store.blog(blog.id).unwrap();
        assert_eq!(blog.total_comments, 1);
        assert_eq!(blog.total_parent_comments, 1);
    }

    #[tokio::test]
    async fn failure_part_way_leaves_no_deleted_ids_behind() {
        let (store, blog) = store_with_blog();
        let (a, r1, r1a) = chain(&store, blog.id).await;
        store.fail_on(StoreOp::IncrementBlogCounters).unwrap();

        let result = delete_comment_tree(&store, REPLIER, r1.id).await;
        assert!(matches!(result, Err(CommentError::Dependency(_))));

        // The deepest reply went first and was unlinked before its row.
        assert!(store.comment(r1a.id).is_none());
        assert!(store.comment(r1.id).unwrap().children.is_empty());
        assert_eq!(store.comment(a.id).unwrap().children, vec![r1.id]);
        assert_eq!(store.blog(blog.id).unwrap().total_comments, 3);

        store.recover().unwrap();
        let removed = delete_comment_tree(&store, REPLIER, r1.id).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.comment(a.id).unwrap().children.is_empty());
        // The failed decrement is not replayed.
        assert_eq!(store.blog(blog.id).unwrap().total_comments, 2);
    }

    #[tokio::test]
    async fn failing_notification_cleanup_keeps_counters() {
        let (store, blog) = store_with_blog();
        let top = comment(&store, blog.id, COMMENTER, "root", None).await;
        store.fail_on(StoreOp::DeleteNotifications).unwrap();

        let result = delete_comment_tree(&store, COMMENTER, top.id).await;
        assert!(matches!(result, Err(CommentError::Dependency(_))));

        assert!(store.comment(top.id).is_none());
        assert_eq!(store.notifications().len(), 1);
        let blog = store.blog(blog.id).unwrap();
        assert_eq!(blog.total_comments, 1);
        assert_eq!(blog.total_parent_comments, 1);
    }

    #[tokio::test]
    async fn failing_to_clear_reply_link_keeps_it() {
        let (store, blog) = store_with_blog();
        let top = comment(&store, blog.id, COMMENTER, "question", None).await;
        let notification = store.notifications()[0].clone();
        let answer = add_comment(
            &store,
            blog.id,
            BLOG_AUTHOR,
            CommentSubmission::new("answer", Some(top.id)).from_notification(notification.id),
        )
        .await
        .unwrap();
        store.fail_on(StoreOp::ClearNotificationReply).unwrap();

        let result = delete_comment_tree(&store, BLOG_AUTHOR, answer.id).await;
        assert!(matches!(result, Err(CommentError::Dependency(_))));

        assert!(store.comment(answer.id).is_none());
        assert!(store.comment(top.id).unwrap().children.is_empty());
        let notifications = store.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].reply_id, Some(answer.id));
        assert_eq!(store.blog(blog.id).unwrap().total_comments, 2);
    }
}
