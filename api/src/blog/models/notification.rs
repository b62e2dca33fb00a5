use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Comment,
    Reply,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Comment => "comment",
            NotificationKind::Reply => "reply",
        }
    }
}

#[derive(Queryable, Selectable, Debug, Serialize, Clone, PartialEq)]
#[diesel(table_name = crate::schema::notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Notification {
    pub id: i32,
    pub kind: String,
    pub blog_id: i32,
    pub recipient_id: i32,
    pub actor_id: i32,
    pub comment_id: i32,
    pub replied_on_comment: Option<i32>,
    pub reply_id: Option<i32>,
    pub seen: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::notifications)]
pub struct NewNotification {
    pub kind: String,
    pub blog_id: i32,
    pub recipient_id: i32,
    pub actor_id: i32,
    pub comment_id: i32,
    pub replied_on_comment: Option<i32>,
}

impl NewNotification {
    /// A notification about a new comment. Top-level comments notify the blog
    /// author, replies notify the author of the comment being replied to.
    pub fn for_comment(
        blog_id: i32,
        actor_id: i32,
        comment_id: i32,
        recipient_id: i32,
        replied_on_comment: Option<i32>,
    ) -> Self {
        let kind = match replied_on_comment {
            Some(_) => NotificationKind::Reply,
            None => NotificationKind::Comment,
        };

        NewNotification {
            kind: kind.as_str().to_owned(),
            blog_id,
            recipient_id,
            actor_id,
            comment_id,
            replied_on_comment,
        }
    }
}
