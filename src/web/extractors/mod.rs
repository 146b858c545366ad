/*!
 * Request extractors
 *
 * Responsibility:
 * - middleware が載せた request state (session, ログイン中ユーザー) を handler に渡す
 * - POST フォームを HTML アプリ向けのエラー規則で decode する
 */

mod current_user;
mod post_form;
mod session;

pub use current_user::CurrentUser;
pub use post_form::PostForm;
