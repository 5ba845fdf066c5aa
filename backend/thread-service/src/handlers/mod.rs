/// HTTP handlers for thread-service
///
/// - Content: feed, detail, create and reply for `threads` and `posts`
/// - Users: current user lookup and onboarding
pub mod content;
pub mod users;

use actix_web::web;
use std::sync::Arc;

use crate::cache::Revalidator;
use crate::config::FeedConfig;
use crate::db::ContentStore;
use crate::middleware::IdentityMiddleware;
use crate::services::{ContentWriter, DetailReader, FeedReader, UserDirectory};

pub use content::{create_content, create_reply, get_content, list_content};
pub use users::{get_current_user, update_current_user};

/// Shared handler state
pub struct AppState {
    pub writer: ContentWriter,
    pub feed: FeedReader,
    pub detail: DetailReader,
    pub users: UserDirectory,
    pub default_page_size: u32,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ContentStore>,
        revalidator: Arc<dyn Revalidator>,
        feed: &FeedConfig,
    ) -> Self {
        Self {
            writer: ContentWriter::new(store.clone(), revalidator),
            feed: FeedReader::new(store.clone(), feed.max_page_size),
            detail: DetailReader::new(store.clone()),
            users: UserDirectory::new(store),
            default_page_size: feed.default_page_size,
        }
    }
}

/// Register the `/api/v1` routes. `users` is registered ahead of `{kind}`
/// so it is never read as a collection name.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .wrap(IdentityMiddleware)
            .service(
                web::resource("/users/me")
                    .route(web::get().to(get_current_user))
                    .route(web::put().to(update_current_user)),
            )
            .service(
                web::resource("/{kind}")
                    .route(web::get().to(list_content))
                    .route(web::post().to(create_content)),
            )
            .route("/{kind}/{id}", web::get().to(get_content))
            .route("/{kind}/{id}/replies", web::post().to(create_reply)),
    );
}
