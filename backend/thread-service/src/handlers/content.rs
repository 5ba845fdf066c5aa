/// Content handlers - feed, detail and creation endpoints
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::AppState;
use crate::error::{AppError, Result};
use crate::middleware::ExternalUserId;
use crate::models::{ContentKind, NewContent, PageRequest};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateContentRequest {
    #[validate(length(min = 1, max = 10000))]
    pub text: String,
    pub community_id: Option<Uuid>,
    /// Path to revalidate, defaults to `/`
    #[validate(length(min = 1, max = 512))]
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReplyRequest {
    #[validate(length(min = 1, max = 10000))]
    pub text: String,
    /// Path to revalidate, defaults to the parent's detail page
    #[validate(length(min = 1, max = 512))]
    pub path: Option<String>,
}

fn parse_kind(segment: &str) -> Result<ContentKind> {
    ContentKind::from_segment(segment)
        .ok_or_else(|| AppError::NotFound(format!("unknown collection '{}'", segment)))
}

/// GET /api/v1/{kind}?page=&page_size=
pub async fn list_content(
    state: web::Data<AppState>,
    kind: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let kind = parse_kind(&kind)?;
    let page = PageRequest::new(
        query.page.unwrap_or(1),
        query.page_size.unwrap_or(state.default_page_size),
    )?;

    let feed = state.feed.list_top_level(kind, page).await?;
    Ok(HttpResponse::Ok().json(feed))
}

/// GET /api/v1/{kind}/{id}
pub async fn get_content(
    state: web::Data<AppState>,
    path: web::Path<(String, Uuid)>,
) -> Result<HttpResponse> {
    let (segment, id) = path.into_inner();
    let kind = parse_kind(&segment)?;

    match state.detail.get_content_by_id(kind, id).await? {
        Some(content) => Ok(HttpResponse::Ok().json(content)),
        None => Err(AppError::NotFound(format!("{} {}", kind, id))),
    }
}

/// POST /api/v1/{kind}
pub async fn create_content(
    state: web::Data<AppState>,
    kind: web::Path<String>,
    identity: ExternalUserId,
    req: web::Json<CreateContentRequest>,
) -> Result<HttpResponse> {
    let kind = parse_kind(&kind)?;
    req.validate()?;
    let author = state.users.require_onboarded(&identity.0).await?;

    let req = req.into_inner();
    let content = state
        .writer
        .create_content(
            kind,
            NewContent {
                text: req.text,
                author_id: author.id,
                community_id: req.community_id,
                parent_id: None,
                notify_path: req.path.unwrap_or_else(|| "/".to_string()),
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(content))
}

/// POST /api/v1/{kind}/{id}/replies
pub async fn create_reply(
    state: web::Data<AppState>,
    path: web::Path<(String, Uuid)>,
    identity: ExternalUserId,
    req: web::Json<CreateReplyRequest>,
) -> Result<HttpResponse> {
    let (segment, parent_id) = path.into_inner();
    let kind = parse_kind(&segment)?;
    req.validate()?;
    let author = state.users.require_onboarded(&identity.0).await?;

    let req = req.into_inner();
    let content = state
        .writer
        .create_content(
            kind,
            NewContent {
                text: req.text,
                author_id: author.id,
                community_id: None,
                parent_id: Some(parent_id),
                notify_path: req
                    .path
                    .unwrap_or_else(|| format!("/{}/{}", kind.label(), parent_id)),
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(content))
}
