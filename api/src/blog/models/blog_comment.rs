use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

#[derive(Queryable, Selectable, Debug, Serialize, Clone, PartialEq)]
#[diesel(table_name = crate::schema::blog_comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BlogComment {
    pub id: i32,
    pub blog_id: i32,
    pub author_id: i32,
    pub blog_author_id: i32,
    pub content: String,
    pub parent_id: Option<i32>,
    pub is_reply: bool,
    pub depth: i32,
    pub children: Vec<i32>,
    pub created_at: NaiveDateTime,
}

impl BlogComment {
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Whether `identity_id` may delete this comment: its author or the
    /// author of the blog it was posted on.
    pub fn can_be_deleted_by(&self, identity_id: i32) -> bool {
        identity_id == self.author_id || identity_id == self.blog_author_id
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::blog_comments)]
pub struct NewBlogComment {
    pub blog_id: i32,
    pub author_id: i32,
    pub blog_author_id: i32,
    pub content: String,
    pub parent_id: Option<i32>,
    pub is_reply: bool,
    pub depth: i32,
}
