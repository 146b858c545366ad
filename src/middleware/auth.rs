//! Authentication context and route guards.
//!
//! `authenticate` resolves the session's user id → `CurrentUser` in request
//! extensions. The guards only look at that extension; they are applied per
//! route group with `route_layer`.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderValue, Request, header},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};

use crate::error::AppError;
use crate::services::session::Session;
use crate::state::AppState;
use crate::web::extractors::CurrentUser;

pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, authenticate))
}

async fn authenticate(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = req.extensions().get::<Session>().and_then(Session::user_id);

    if let Some(id) = user_id {
        if state.users.exists(id).await? {
            req.extensions_mut().insert(CurrentUser { id });
        } else {
            // deleted account: treat as anonymous
            tracing::debug!(user_id = id, "session refers to unknown user");
        }
    }

    Ok(next.run(req).await)
}

fn is_authenticated(req: &Request<Body>) -> bool {
    req.extensions().get::<CurrentUser>().is_some()
}

/// Anonymous requests go to the login page. Signed-in responses are not cached.
pub async fn require_authentication(req: Request<Body>, next: Next) -> Response {
    if !is_authenticated(&req) {
        return Redirect::to("/user/login").into_response();
    }

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

/// Signup/login pages make no sense once signed in.
pub async fn require_no_authentication(req: Request<Body>, next: Next) -> Response {
    if is_authenticated(&req) {
        return Redirect::to("/").into_response();
    }
    next.run(req).await
}
