/*
 * Responsibility
 * - signup / login / logout handler
 * - 認証失敗・email 重複はフォームを再表示 (422)、500 にはしない
 */
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    error::AppError,
    repos::RepoError,
    services::session::Session,
    state::AppState,
    templates::{self, LoginPage, SignupPage, TemplateData},
    web::{
        extractors::{CurrentUser, PostForm},
        forms::{UserLoginForm, UserSignupForm},
    },
};

fn signup_page(
    status: StatusCode,
    session: &Session,
    user: Option<CurrentUser>,
    form: UserSignupForm,
) -> Result<Response, AppError> {
    let page = SignupPage {
        data: TemplateData::new(session, user.as_ref())?,
        form,
    };
    templates::render(status, &page)
}

fn login_page(
    status: StatusCode,
    session: &Session,
    user: Option<CurrentUser>,
    form: UserLoginForm,
) -> Result<Response, AppError> {
    let page = LoginPage {
        data: TemplateData::new(session, user.as_ref())?,
        form,
    };
    templates::render(status, &page)
}

pub async fn user_signup(
    session: Session,
    user: Option<CurrentUser>,
) -> Result<Response, AppError> {
    signup_page(StatusCode::OK, &session, user, UserSignupForm::default())
}

pub async fn user_signup_post(
    State(state): State<AppState>,
    session: Session,
    user: Option<CurrentUser>,
    PostForm(mut form): PostForm<UserSignupForm>,
) -> Result<Response, AppError> {
    if !form.validate() {
        return signup_page(StatusCode::UNPROCESSABLE_ENTITY, &session, user, form);
    }

    match state
        .users
        .insert(&form.name, &form.email, &form.password)
        .await
    {
        Ok(()) => {}
        Err(RepoError::DuplicateEmail) => {
            form.validator
                .add_field_error("email", "Email address is already in use");
            return signup_page(StatusCode::UNPROCESSABLE_ENTITY, &session, user, form);
        }
        Err(e) => return Err(e.into()),
    }

    session.put_flash("Your signup was successful. Please log in.");
    Ok(Redirect::to("/user/login").into_response())
}

pub async fn user_login(
    session: Session,
    user: Option<CurrentUser>,
) -> Result<Response, AppError> {
    login_page(StatusCode::OK, &session, user, UserLoginForm::default())
}

pub async fn user_login_post(
    State(state): State<AppState>,
    session: Session,
    user: Option<CurrentUser>,
    PostForm(mut form): PostForm<UserLoginForm>,
) -> Result<Response, AppError> {
    if !form.validate() {
        return login_page(StatusCode::UNPROCESSABLE_ENTITY, &session, user, form);
    }

    let user_id = match state.users.authenticate(&form.email, &form.password).await {
        Ok(id) => id,
        Err(RepoError::InvalidCredentials) => {
            form.validator
                .add_non_field_error("Email or password is incorrect");
            return login_page(StatusCode::UNPROCESSABLE_ENTITY, &session, user, form);
        }
        Err(e) => return Err(e.into()),
    };

    session.login(user_id)?;
    tracing::info!(user_id, "user logged in");

    Ok(Redirect::to("/snippet/create").into_response())
}

pub async fn user_logout_post(session: Session) -> Result<Response, AppError> {
    session.logout()?;
    session.put_flash("You've logged out successfully!");

    Ok(Redirect::to("/").into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::{StatusCode, header};

    use crate::test_support::{TestClient, extract_csrf_token};

    const FORM_TAG: &str = "<form action='/user/signup' method='post' novalidate>";

    struct SignupCase {
        name: &'static str,
        user_name: &'static str,
        email: &'static str,
        password: &'static str,
        csrf_token: Option<&'static str>,
        want_status: StatusCode,
        want_form: bool,
    }

    const VALID_NAME: &str = "Bob";
    const VALID_EMAIL: &str = "bob@example.com";
    const VALID_PASSWORD: &str = "validPa$$word";

    fn case(
        name: &'static str,
        user_name: &'static str,
        email: &'static str,
        password: &'static str,
        want_status: StatusCode,
    ) -> SignupCase {
        SignupCase {
            name,
            user_name,
            email,
            password,
            csrf_token: None,
            want_status,
            want_form: want_status == StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    #[tokio::test]
    async fn signup() {
        let mut client = TestClient::new();
        let token = extract_csrf_token(&client.get("/user/signup").await.body);

        let cases = [
            case("valid submission", VALID_NAME, VALID_EMAIL, VALID_PASSWORD, StatusCode::SEE_OTHER),
            SignupCase {
                csrf_token: Some("wrongToken"),
                ..case("invalid csrf token", VALID_NAME, VALID_EMAIL, VALID_PASSWORD, StatusCode::BAD_REQUEST)
            },
            case("empty name", "", VALID_EMAIL, VALID_PASSWORD, StatusCode::UNPROCESSABLE_ENTITY),
            case("empty email", VALID_NAME, "", VALID_PASSWORD, StatusCode::UNPROCESSABLE_ENTITY),
            case("empty password", VALID_NAME, VALID_EMAIL, "", StatusCode::UNPROCESSABLE_ENTITY),
            case("invalid email", VALID_NAME, "bob@example.", VALID_PASSWORD, StatusCode::UNPROCESSABLE_ENTITY),
            case("short password", VALID_NAME, VALID_EMAIL, "pa$$", StatusCode::UNPROCESSABLE_ENTITY),
            case("duplicate email", VALID_NAME, "dupe@example.com", VALID_PASSWORD, StatusCode::UNPROCESSABLE_ENTITY),
        ];

        for tc in cases {
            let res = client
                .post_form(
                    "/user/signup",
                    &[
                        ("name", tc.user_name),
                        ("email", tc.email),
                        ("password", tc.password),
                        ("csrf_token", tc.csrf_token.unwrap_or(token.as_str())),
                    ],
                )
                .await;

            assert_eq!(res.status, tc.want_status, "{}", tc.name);
            if tc.want_form {
                assert!(res.body.contains(FORM_TAG), "{}: form not re-rendered", tc.name);
                assert!(!res.body.contains(VALID_PASSWORD), "{}: password echoed", tc.name);
            }
        }
    }

    #[tokio::test]
    async fn signup_success_flashes_on_login_page() {
        let mut client = TestClient::new();
        let token = extract_csrf_token(&client.get("/user/signup").await.body);

        let res = client
            .post_form(
                "/user/signup",
                &[
                    ("name", "Bob"),
                    ("email", "bob@example.com"),
                    ("password", "validPa$$word"),
                    ("csrf_token", token.as_str()),
                ],
            )
            .await;
        assert_eq!(res.headers[header::LOCATION], "/user/login");

        let res = client.get("/user/login").await;
        assert!(res.body.contains("Your signup was successful. Please log in."));
    }

    #[tokio::test]
    async fn duplicate_email_message() {
        let mut client = TestClient::new();
        let token = extract_csrf_token(&client.get("/user/signup").await.body);

        let res = client
            .post_form(
                "/user/signup",
                &[
                    ("name", "Dupe"),
                    ("email", "dupe@example.com"),
                    ("password", "validPa$$word"),
                    ("csrf_token", token.as_str()),
                ],
            )
            .await;
        assert!(res.body.contains("Email address is already in use"));
        assert!(res.body.contains("value='dupe@example.com'"));
    }

    #[tokio::test]
    async fn login_with_bad_credentials() {
        let mut client = TestClient::new();
        let token = extract_csrf_token(&client.get("/user/login").await.body);

        let res = client
            .post_form(
                "/user/login",
                &[
                    ("email", "alice@example.com"),
                    ("password", "not-her-password"),
                    ("csrf_token", token.as_str()),
                ],
            )
            .await;
        assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(res.body.contains("Email or password is incorrect"));
    }

    #[tokio::test]
    async fn login_then_logout() {
        let mut client = TestClient::new();
        client.login().await;

        // signed-in users are bounced away from guest pages
        let res = client.get("/user/login").await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
        assert_eq!(res.headers[header::LOCATION], "/");

        let token = extract_csrf_token(&client.get("/").await.body);
        let res = client
            .post_form("/user/logout", &[("csrf_token", token.as_str())])
            .await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
        assert_eq!(res.headers[header::LOCATION], "/");

        let res = client.get("/").await;
        // the apostrophe is HTML-escaped
        assert!(res.body.contains("logged out successfully!"));
        assert!(res.body.contains("href='/user/login'"));

        let res = client.get("/snippet/create").await;
        assert_eq!(res.headers[header::LOCATION], "/user/login");
    }

    #[tokio::test]
    async fn logout_requires_login() {
        let mut client = TestClient::new();
        let token = extract_csrf_token(&client.get("/user/login").await.body);

        let res = client
            .post_form("/user/logout", &[("csrf_token", token.as_str())])
            .await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
        assert_eq!(res.headers[header::LOCATION], "/user/login");
    }
}
