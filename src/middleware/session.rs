//! Session initialization.
//!
//! Loads the cookie session (or starts a fresh one), exposes it to the inner
//! stack through request extensions, and writes the cookie back once on the
//! way out if anything changed. Authentication and CSRF checks sit inside
//! this layer because both read session state.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::services::session::{Session, SessionData};
use crate::state::AppState;

pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, initialize))
}

async fn initialize(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let session = match state.sessions.load(req.headers()) {
        Some(data) => Session::new(data, false),
        // brand new sessions are always persisted so the CSRF secret sticks
        None => Session::new(SessionData::new()?, true),
    };

    req.extensions_mut().insert(session.clone());
    let response = next.run(req).await;

    if !session.is_modified() {
        return Ok(response);
    }

    let jar = state.sessions.save(&session.snapshot())?;
    Ok((jar, response).into_response())
}
