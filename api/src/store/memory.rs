//! In-process store used by tests, benches and local runs without a database.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::{CommentStore, Page, SessionStore, StoreError, StoreResult};
use crate::blog::models::{
    blog::Blog,
    blog_comment::{BlogComment, NewBlogComment},
    notification::{NewNotification, Notification},
};

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    InsertComment,
    PushChild,
    PullChild,
    DeleteComment,
    IncrementBlogCounters,
    InsertNotification,
    SetNotificationReply,
    DeleteNotifications,
    ClearNotificationReply,
}

#[derive(Default)]
struct MemoryState {
    next_id: i32,
    last_timestamp: Option<NaiveDateTime>,
    blogs: BTreeMap<i32, Blog>,
    comments: BTreeMap<i32, BlogComment>,
    notifications: BTreeMap<i32, Notification>,
    sessions: HashMap<String, i32>,
    failing: HashSet<StoreOp>,
}

impl MemoryState {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    // Strictly increasing so creation order is never ambiguous.
    fn now(&mut self) -> NaiveDateTime {
        let now = chrono::Utc::now().naive_utc();
        let now = match self.last_timestamp {
            Some(last) if now <= last => last + chrono::Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(now);
        now
    }

    fn check(&self, op: StoreOp) -> StoreResult<()> {
        if self.failing.contains(&op) {
            return Err(StoreError::Unavailable(format!("{op:?} failed")));
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    pub fn create_blog(&self, author_id: i32, title: &str) -> StoreResult<Blog> {
        let mut state = self.state()?;
        let blog = Blog {
            id: state.next_id(),
            author_id,
            title: title.to_owned(),
            total_comments: 0,
            total_parent_comments: 0,
            created_at: state.now(),
        };
        state.blogs.insert(blog.id, blog.clone());
        Ok(blog)
    }

    pub fn create_session(&self, token: &str, identity_id: i32) -> StoreResult<()> {
        self.state()?.sessions.insert(token.to_owned(), identity_id);
        Ok(())
    }

    /// Makes every later call of `op` fail until [`MemoryStore::recover`].
    pub fn fail_on(&self, op: StoreOp) -> StoreResult<()> {
        self.state()?.failing.insert(op);
        Ok(())
    }

    pub fn recover(&self) -> StoreResult<()> {
        self.state()?.failing.clear();
        Ok(())
    }

    pub fn blog(&self, id: i32) -> Option<Blog> {
        self.state().ok()?.blogs.get(&id).cloned()
    }

    pub fn comment(&self, id: i32) -> Option<BlogComment> {
        self.state().ok()?.comments.get(&id).cloned()
    }

    pub fn comments(&self) -> Vec<BlogComment> {
        self.state()
            .map(|s| s.comments.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state()
            .map(|s| s.notifications.values().cloned().collect())
            .unwrap_or_default()
    }
}

fn newest_first(comments: &mut [BlogComment]) {
    comments.sort_unstable_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
}

fn paginate(comments: Vec<BlogComment>, page: Page) -> Vec<BlogComment> {
    comments
        .into_iter()
        .skip(page.skip.max(0) as usize)
        .take(page.limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn find_blog(&self, blog_id: i32) -> StoreResult<Option<Blog>> {
        Ok(self.state()?.blogs.get(&blog_id).cloned())
    }

    async fn increment_blog_counters(
        &self,
        blog_id: i32,
        total_comments: i64,
        total_parent_comments: i64,
    ) -> StoreResult<()> {
        let mut state = self.state()?;
        state.check(StoreOp::IncrementBlogCounters)?;

        if let Some(blog) = state.blogs.get_mut(&blog_id) {
            blog.total_comments += total_comments;
            blog.total_parent_comments += total_parent_comments;
        }
        Ok(())
    }

    async fn find_comment(&self, id: i32) -> StoreResult<Option<BlogComment>> {
        Ok(self.state()?.comments.get(&id).cloned())
    }

    async fn insert_comment(&self, comment: NewBlogComment) -> StoreResult<BlogComment> {
        let mut state = self.state()?;
        state.check(StoreOp::InsertComment)?;

        let comment = BlogComment {
            id: state.next_id(),
            blog_id: comment.blog_id,
            author_id: comment.author_id,
            blog_author_id: comment.blog_author_id,
            content: comment.content,
            parent_id: comment.parent_id,
            is_reply: comment.is_reply,
            depth: comment.depth,
            children: vec![],
            created_at: state.now(),
        };
        state.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find_top_level_comments(
        &self,
        blog_id: i32,
        page: Page,
    ) -> StoreResult<Vec<BlogComment>> {
        let mut comments: Vec<BlogComment> = self
            .state()?
            .comments
            .values()
            .filter(|c| c.blog_id == blog_id && c.parent_id.is_none())
            .cloned()
            .collect();

        newest_first(&mut comments);
        Ok(paginate(comments, page))
    }

    async fn find_comments_in(&self, ids: &[i32], page: Page) -> StoreResult<Vec<BlogComment>> {
        let state = self.state()?;
        let mut comments: Vec<BlogComment> = ids
            .iter()
            .filter_map(|id| state.comments.get(id).cloned())
            .collect();

        newest_first(&mut comments);
        Ok(paginate(comments, page))
    }

    async fn push_child(&self, parent_id: i32, child_id: i32) -> StoreResult<()> {
        let mut state = self.state()?;
        state.check(StoreOp::PushChild)?;

        if let Some(parent) = state.comments.get_mut(&parent_id) {
            parent.children.push(child_id);
        }
        Ok(())
    }

    async fn pull_child(&self, parent_id: i32, child_id: i32) -> StoreResult<()> {
        let mut state = self.state()?;
        state.check(StoreOp::PullChild)?;

        if let Some(parent) = state.comments.get_mut(&parent_id) {
            parent.children.retain(|id| *id != child_id);
        }
        Ok(())
    }

    async fn delete_comment(&self, id: i32) -> StoreResult<Option<BlogComment>> {
        let mut state = self.state()?;
        state.check(StoreOp::DeleteComment)?;

        Ok(state.comments.remove(&id))
    }

    async fn insert_notification(&self, notification: NewNotification) -> StoreResult<()> {
        let mut state = self.state()?;
        state.check(StoreOp::InsertNotification)?;

        let notification = Notification {
            id: state.next_id(),
            kind: notification.kind,
            blog_id: notification.blog_id,
            recipient_id: notification.recipient_id,
            actor_id: notification.actor_id,
            comment_id: notification.comment_id,
            replied_on_comment: notification.replied_on_comment,
            reply_id: None,
            seen: false,
            created_at: state.now(),
        };
        state.notifications.insert(notification.id, notification);
        Ok(())
    }

    async fn set_notification_reply(
        &self,
        notification_id: i32,
        recipient_id: i32,
        reply_id: i32,
    ) -> StoreResult<()> {
        let mut state = self.state()?;
        state.check(StoreOp::SetNotificationReply)?;

        if let Some(n) = state
            .notifications
            .get_mut(&notification_id)
            .filter(|n| n.recipient_id == recipient_id)
        {
            n.reply_id = Some(reply_id);
        }
        Ok(())
    }

    async fn delete_notifications_for_comment(&self, comment_id: i32) -> StoreResult<u64> {
        let mut state = self.state()?;
        state.check(StoreOp::DeleteNotifications)?;

        let before = state.notifications.len();
        state.notifications.retain(|_, n| n.comment_id != comment_id);
        Ok((before - state.notifications.len()) as u64)
    }

    async fn clear_notification_reply(&self, comment_id: i32) -> StoreResult<u64> {
        let mut state = self.state()?;
        state.check(StoreOp::ClearNotificationReply)?;

        let mut cleared = 0;
        for n in state.notifications.values_mut() {
            if n.reply_id == Some(comment_id) {
                n.reply_id = None;
                cleared += 1;
            }
        }
        Ok(cleared)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find_session_identity(&self, token: &str) -> StoreResult<Option<i32>> {
        Ok(self.state()?.sessions.get(token).copied())
    }
}
