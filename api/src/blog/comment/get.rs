use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use super::{CommentError, CommentView};
use crate::{
    App,
    blog::models::blog_comment::BlogComment,
    error::AppError,
    store::{CommentStore, Page},
};

#[derive(Deserialize)]
pub struct CommentsQuery {
    skip: Option<i64>,
}

#[derive(Deserialize)]
pub struct RepliesQuery {
    skip: Option<i64>,
    limit: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Replies {
    pub replies: Vec<CommentView>,
}

pub async fn get_comments(
    State(ctx): State<App>,
    Path(blog_id): Path<i32>,
    q: Query<CommentsQuery>,
) -> Result<Json<Vec<CommentView>>, AppError> {
    let page = Page {
        skip: q.skip.unwrap_or(0).max(0),
        limit: ctx.config.comment_page_size,
    };

    let comments = load_comments(ctx.store.as_ref(), blog_id, page).await?;

    Ok(Json(comments.into_iter().map(CommentView::from).collect()))
}

pub async fn get_replies(
    State(ctx): State<App>,
    Path(parent_id): Path<i32>,
    q: Query<RepliesQuery>,
) -> Result<Json<Replies>, AppError> {
    let max = ctx.config.reply_page_size;
    let page = Page {
        skip: q.skip.unwrap_or(0).max(0),
        limit: q.limit.unwrap_or(max).clamp(0, max),
    };

    let replies = load_replies(ctx.store.as_ref(), parent_id, page).await?;

    Ok(Json(Replies {
        replies: replies.into_iter().map(CommentView::from).collect(),
    }))
}

/// A page of a blog's top-level comments, newest first.
pub async fn load_comments<S: CommentStore + ?Sized>(
    store: &S,
    blog_id: i32,
    page: Page,
) -> Result<Vec<BlogComment>, CommentError> {
    if store.find_blog(blog_id).await?.is_none() {
        return Err(CommentError::NotFound("Blog"));
    }

    Ok(store.find_top_level_comments(blog_id, page).await?)
}

/// A page of the parent's direct replies, newest first. Pages taken with
/// increasing `skip` cover every reply exactly once as long as no sibling is
/// added or removed in between.
pub async fn load_replies<S: CommentStore + ?Sized>(
    store: &S,
    parent_id: i32,
    page: Page,
) -> Result<Vec<BlogComment>, CommentError> {
    let parent = store
        .find_comment(parent_id)
        .await?
        .ok_or(CommentError::NotFound("Comment"))?;

    let mut replies = store.find_comments_in(&parent.children, page).await?;
    for reply in &mut replies {
        reply.depth = parent.depth + 1;
    }

    Ok(replies)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        blog::comment::test_utils::{COMMENTER, REPLIER, comment, store_with_blog},
        store::MemoryStore,
    };

    fn page(skip: i64, limit: i64) -> Page {
        Page { skip, limit }
    }

    fn ids(comments: &[BlogComment]) -> Vec<i32> {
        comments.iter().map(|c| c.id).collect()
    }

    /// A top-level comment with five replies, returned newest first.
    async fn thread_with_five_replies(store: &MemoryStore, blog_id: i32) -> (i32, Vec<i32>) {
        let top = comment(store, blog_id, COMMENTER, "root", None).await;
        let mut replies = vec![];
        for i in 0..5 {
            let r = comment(store, blog_id, REPLIER, &format!("reply {i}"), Some(top.id)).await;
            replies.push(r.id);
        }
        replies.reverse();
        (top.id, replies)
    }

    #[tokio::test]
    async fn replies_are_paginated_newest_first() {
        let (store, blog) = store_with_blog();
        let (parent, c) = thread_with_five_replies(&store, blog.id).await;

        let first = load_replies(&store, parent, page(0, 2)).await.unwrap();
        assert_eq!(ids(&first), vec![c[0], c[1]]);

        let second = load_replies(&store, parent, page(2, 2)).await.unwrap();
        assert_eq!(ids(&second), vec![c[2], c[3]]);

        let third = load_replies(&store, parent, page(4, 2)).await.unwrap();
        assert_eq!(ids(&third), vec![c[4]]);

        let past_end = load_replies(&store, parent, page(5, 2)).await.unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn replies_carry_the_next_depth() {
        let (store, blog) = store_with_blog();
        let top = comment(&store, blog.id, COMMENTER, "root", None).await;
        let reply = comment(&store, blog.id, REPLIER, "one", Some(top.id)).await;
        comment(&store, blog.id, COMMENTER, "two", Some(reply.id)).await;

        let replies = load_replies(&store, reply.id, page(0, 5)).await.unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].depth, 2);
        assert_eq!(replies[0].parent_id, Some(reply.id));
    }

    #[tokio::test]
    async fn replies_of_unknown_comment_are_not_found() {
        let (store, _) = store_with_blog();
        let result = load_replies(&store, 42, page(0, 5)).await;
        assert!(matches!(result, Err(CommentError::NotFound(_))));
    }

    #[tokio::test]
    async fn top_level_comments_exclude_replies() {
        let (store, blog) = store_with_blog();
        let older = comment(&store, blog.id, COMMENTER, "older", None).await;
        comment(&store, blog.id, REPLIER, "reply", Some(older.id)).await;
        let newer = comment(&store, blog.id, COMMENTER, "newer", None).await;

        let comments = load_comments(&store, blog.id, page(0, 5)).await.unwrap();
        assert_eq!(ids(&comments), vec![newer.id, older.id]);

        let rest = load_comments(&store, blog.id, page(1, 5)).await.unwrap();
        assert_eq!(ids(&rest), vec![older.id]);
    }

    #[tokio::test]
    async fn comments_of_unknown_blog_are_not_found() {
        let (store, _) = store_with_blog();
        let result = load_comments(&store, 42, page(0, 5)).await;
        assert!(matches!(result, Err(CommentError::NotFound("Blog"))));
    }
}
