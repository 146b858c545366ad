/*
 * Responsibility
 * - snippet 作成フォーム (urlencoded POST body から decode)
 * - validate() は再表示用のメッセージを Validator に記録する
 */
use serde::Deserialize;

use crate::services::validator::{self, Validator};

pub const TITLE_MAX_CHARS: usize = 100;
pub const EXPIRY_DAYS: [i32; 3] = [1, 7, 365];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SnippetCreateForm {
    pub title: String,
    pub content: String,
    pub expires: i32,
    #[serde(skip)]
    pub validator: Validator,
}

impl SnippetCreateForm {
    /// Blank form as first shown, expiring in a year.
    pub fn new() -> Self {
        Self {
            expires: 365,
            ..Default::default()
        }
    }

    pub fn validate(&mut self) -> bool {
        let v = &mut self.validator;
        v.check_field(
            validator::not_blank(&self.title),
            "title",
            "This field cannot be blank",
        );
        v.check_field(
            validator::max_chars(&self.title, TITLE_MAX_CHARS),
            "title",
            "This field cannot be more than 100 characters long",
        );
        v.check_field(
            validator::not_blank(&self.content),
            "content",
            "This field cannot be blank",
        );
        v.check_field(
            validator::permitted_value(&self.expires, &EXPIRY_DAYS),
            "expires",
            "This field must equal 1, 7 or 365",
        );
        v.valid()
    }
}
