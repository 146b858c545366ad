/*
 * Responsibility
 * - home と snippet view / create handler
 * - form decode → validate → repo 呼び出し → render または redirect
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    error::AppError,
    services::session::Session,
    state::AppState,
    templates::{self, CreatePage, HomePage, TemplateData, ViewPage},
    web::{
        extractors::{CurrentUser, PostForm},
        forms::SnippetCreateForm,
    },
};

pub async fn home(
    State(state): State<AppState>,
    session: Session,
    user: Option<CurrentUser>,
) -> Result<Response, AppError> {
    let snippets = state.snippets.latest().await?;

    let page = HomePage {
        data: TemplateData::new(&session, user.as_ref())?,
        snippets,
    };
    templates::render(StatusCode::OK, &page)
}

/// Snippet ids are positive integers. Anything else is a client error.
fn parse_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|id| *id >= 1)
}

pub async fn snippet_view(
    State(state): State<AppState>,
    session: Session,
    user: Option<CurrentUser>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&raw_id).ok_or(AppError::BadRequest)?;

    let snippet = state.snippets.get(id).await?.ok_or(AppError::NotFound)?;

    let page = ViewPage {
        data: TemplateData::new(&session, user.as_ref())?,
        snippet,
    };
    templates::render(StatusCode::OK, &page)
}

pub async fn snippet_create(
    session: Session,
    user: Option<CurrentUser>,
) -> Result<Response, AppError> {
    let page = CreatePage {
        data: TemplateData::new(&session, user.as_ref())?,
        form: SnippetCreateForm::new(),
    };
    templates::render(StatusCode::OK, &page)
}

pub async fn snippet_create_post(
    State(state): State<AppState>,
    session: Session,
    user: Option<CurrentUser>,
    PostForm(mut form): PostForm<SnippetCreateForm>,
) -> Result<Response, AppError> {
    if !form.validate() {
        let page = CreatePage {
            data: TemplateData::new(&session, user.as_ref())?,
            form,
        };
        return templates::render(StatusCode::UNPROCESSABLE_ENTITY, &page);
    }

    let id = state
        .snippets
        .insert(&form.title, &form.content, form.expires)
        .await?;

    tracing::info!(
        snippet_id = id,
        user_id = ?user.map(|u| u.id),
        "snippet created"
    );

    session.put_flash("Snippet successfully created!");
    Ok(Redirect::to(&format!("/snippet/view/{id}")).into_response())
}
