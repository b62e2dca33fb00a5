use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{
    AsyncPgConnection, RunQueryDsl,
    pooled_connection::{AsyncDieselConnectionManager, deadpool::Pool},
};

use super::{CommentStore, Page, SessionStore, StoreResult};
use crate::{
    blog::models::{
        blog::Blog,
        blog_comment::{BlogComment, NewBlogComment},
        notification::NewNotification,
    },
    schema::{blog_comments, blogs, notifications, sessions},
};

mod sql {
    use diesel::sql_types::{Array, Int4};

    diesel::define_sql_function! {
        fn array_append(array: Array<Int4>, element: Int4) -> Array<Int4>;
    }

    diesel::define_sql_function! {
        fn array_remove(array: Array<Int4>, element: Int4) -> Array<Int4>;
    }
}

pub type DieselPool = Pool<AsyncPgConnection>;

#[derive(Clone)]
pub struct PgStore {
    pool: DieselPool,
}

impl PgStore {
    pub fn connect(database_url: &str, max_size: usize) -> eyre::Result<Self> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let pool = Pool::builder(manager).max_size(max_size).build()?;
        Ok(PgStore { pool })
    }
}

#[async_trait]
impl CommentStore for PgStore {
    async fn find_blog(&self, blog_id: i32) -> StoreResult<Option<Blog>> {
        let mut conn = self.pool.get().await?;

        Ok(blogs::table
            .find(blog_id)
            .select(Blog::as_select())
            .first(&mut conn)
            .await
            .optional()?)
    }

    async fn increment_blog_counters(
        &self,
        blog_id: i32,
        total_comments: i64,
        total_parent_comments: i64,
    ) -> StoreResult<()> {
        let mut conn = self.pool.get().await?;

        diesel::update(blogs::table.find(blog_id))
            .set((
                blogs::total_comments.eq(blogs::total_comments + total_comments),
                blogs::total_parent_comments
                    .eq(blogs::total_parent_comments + total_parent_comments),
            ))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    async fn find_comment(&self, id: i32) -> StoreResult<Option<BlogComment>> {
        let mut conn = self.pool.get().await?;

        Ok(blog_comments::table
            .find(id)
            .select(BlogComment::as_select())
            .first(&mut conn)
            .await
            .optional()?)
    }

    async fn insert_comment(&self, comment: NewBlogComment) -> StoreResult<BlogComment> {
        let mut conn = self.pool.get().await?;

        Ok(diesel::insert_into(blog_comments::table)
            .values(&comment)
            .returning(BlogComment::as_returning())
            .get_result(&mut conn)
            .await?)
    }

    async fn find_top_level_comments(
        &self,
        blog_id: i32,
        page: Page,
    ) -> StoreResult<Vec<BlogComment>> {
        let mut conn = self.pool.get().await?;

        Ok(blog_comments::table
            .filter(blog_comments::blog_id.eq(blog_id))
            .filter(blog_comments::parent_id.is_null())
            .order((blog_comments::created_at.desc(), blog_comments::id.desc()))
            .offset(page.skip)
            .limit(page.limit)
            .select(BlogComment::as_select())
            .load(&mut conn)
            .await?)
    }

    async fn find_comments_in(&self, ids: &[i32], page: Page) -> StoreResult<Vec<BlogComment>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let mut conn = self.pool.get().await?;

        Ok(blog_comments::table
            .filter(blog_comments::id.eq_any(ids.to_vec()))
            .order((blog_comments::created_at.desc(), blog_comments::id.desc()))
            .offset(page.skip)
            .limit(page.limit)
            .select(BlogComment::as_select())
            .load(&mut conn)
            .await?)
    }

    async fn push_child(&self, parent_id: i32, child_id: i32) -> StoreResult<()> {
        let mut conn = self.pool.get().await?;

        diesel::update(blog_comments::table.find(parent_id))
            .set(
                blog_comments::children
                    .eq(sql::array_append(blog_comments::children, child_id)),
            )
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    async fn pull_child(&self, parent_id: i32, child_id: i32) -> StoreResult<()> {
        let mut conn = self.pool.get().await?;

        diesel::update(blog_comments::table.find(parent_id))
            .set(
                blog_comments::children
                    .eq(sql::array_remove(blog_comments::children, child_id)),
            )
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    async fn delete_comment(&self, id: i32) -> StoreResult<Option<BlogComment>> {
        let mut conn = self.pool.get().await?;

        Ok(diesel::delete(blog_comments::table.find(id))
            .returning(BlogComment::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?)
    }

    async fn insert_notification(&self, notification: NewNotification) -> StoreResult<()> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(notifications::table)
            .values(&notification)
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    async fn set_notification_reply(
        &self,
        notification_id: i32,
        recipient_id: i32,
        reply_id: i32,
    ) -> StoreResult<()> {
        let mut conn = self.pool.get().await?;

        diesel::update(
            notifications::table
                .find(notification_id)
                .filter(notifications::recipient_id.eq(recipient_id)),
        )
        .set(notifications::reply_id.eq(Some(reply_id)))
        .execute(&mut conn)
        .await?;

        Ok(())
    }

    async fn delete_notifications_for_comment(&self, comment_id: i32) -> StoreResult<u64> {
        let mut conn = self.pool.get().await?;

        let deleted =
            diesel::delete(notifications::table.filter(notifications::comment_id.eq(comment_id)))
                .execute(&mut conn)
                .await?;

        Ok(deleted as u64)
    }

    async fn clear_notification_reply(&self, comment_id: i32) -> StoreResult<u64> {
        let mut conn = self.pool.get().await?;

        let updated =
            diesel::update(notifications::table.filter(notifications::reply_id.eq(comment_id)))
                .set(notifications::reply_id.eq(None::<i32>))
                .execute(&mut conn)
                .await?;

        Ok(updated as u64)
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn find_session_identity(&self, token: &str) -> StoreResult<Option<i32>> {
        let mut conn = self.pool.get().await?;

        Ok(sessions::table
            .filter(sessions::token.eq(token))
            .filter(sessions::active.eq(true))
            .filter(sessions::expires_at.gt(diesel::dsl::now))
            .filter(sessions::issued_at.le(diesel::dsl::now))
            .select(sessions::identity_id)
            .first::<i32>(&mut conn)
            .await
            .optional()?)
    }
}
