pub mod blog;
pub mod blog_comment;
pub mod notification;
