use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

#[derive(Queryable, Selectable, Debug, Serialize, Clone, PartialEq)]
#[diesel(table_name = crate::schema::blogs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Blog {
    pub id: i32,
    pub author_id: i32,
    pub title: String,
    pub total_comments: i64,
    pub total_parent_comments: i64,
    pub created_at: NaiveDateTime,
}

/// The comment counters a blog keeps in sync with its comment rows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct BlogActivity {
    pub total_comments: i64,
    pub total_parent_comments: i64,
}

impl From<&Blog> for BlogActivity {
    fn from(blog: &Blog) -> Self {
        BlogActivity {
            total_comments: blog.total_comments,
            total_parent_comments: blog.total_parent_comments,
        }
    }
}
