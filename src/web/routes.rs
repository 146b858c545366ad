/*
 * Responsibility
 * - サイトの URL 構成
 * - Route group: public / guest 専用 / ログイン必須 (group ごとに route_layer)
 * - /static 配下の静的ファイル (ディレクトリ一覧は出さない)
 */
use std::path::Path;

use axum::{
    Router,
    body::Body,
    http::Request,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;

use crate::{
    error::AppError,
    middleware::auth::{require_authentication, require_no_authentication},
    state::AppState,
    web::handlers::{
        ping::ping,
        snippets::{home, snippet_create, snippet_create_post, snippet_view},
        users::{
            user_login, user_login_post, user_logout_post, user_signup, user_signup_post,
        },
    },
};

pub fn routes(static_dir: &Path) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(home))
        .route("/ping", get(ping))
        .route("/snippet/view/{id}", get(snippet_view));

    let guest = Router::new()
        .route("/user/signup", get(user_signup).post(user_signup_post))
        .route("/user/login", get(user_login).post(user_login_post))
        .route_layer(middleware::from_fn(require_no_authentication));

    let protected = Router::new()
        .route(
            "/snippet/create",
            get(snippet_create).post(snippet_create_post),
        )
        .route("/user/logout", post(user_logout_post))
        .route_layer(middleware::from_fn(require_authentication));

    Router::new()
        .merge(public)
        .merge(guest)
        .merge(protected)
        .nest_service(
            "/static",
            ServiceBuilder::new()
                .layer(middleware::from_fn(no_directory_listing))
                .service(ServeDir::new(static_dir)),
        )
        .fallback(not_found)
}

/// Any path ending in `/` is a 404, so directories are never browsable.
async fn no_directory_listing(req: Request<Body>, next: Next) -> Response {
    if req.uri().path().ends_with('/') {
        return AppError::NotFound.into_response();
    }
    next.run(req).await
}

async fn not_found() -> AppError {
    AppError::NotFound
}
