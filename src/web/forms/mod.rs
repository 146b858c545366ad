/*
 * Responsibility
 * - リクエストフォーム (API の request DTO に相当)
 */
mod snippets;
mod users;

pub use snippets::SnippetCreateForm;
pub use users::{UserLoginForm, UserSignupForm};
