use axum::{
    Router,
    routing::{delete, get},
};

use crate::App;

use super::comment::{
    create::create_comment,
    delete::delete_comment,
    get::{get_comments, get_replies},
};

pub fn route() -> Router<App> {
    // TODO rate limit comment creation per identity
    Router::<App>::new()
        .route(
            "/blogs/{blog_id}/comments",
            get(get_comments).post(create_comment),
        )
        .route("/comments/{id}/replies", get(get_replies))
        .route("/comments/{id}", delete(delete_comment))
}
