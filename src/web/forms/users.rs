/*
 * Responsibility
 * - signup / login フォーム
 * - パスワードは decode するがページには再表示しない
 */
use serde::Deserialize;

use crate::services::validator::{self, EMAIL_RX, Validator};

pub const PASSWORD_MIN_CHARS: usize = 8;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserSignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl UserSignupForm {
    pub fn validate(&mut self) -> bool {
        let v = &mut self.validator;
        v.check_field(
            validator::not_blank(&self.name),
            "name",
            "This field cannot be blank",
        );
        v.check_field(
            validator::not_blank(&self.email),
            "email",
            "This field cannot be blank",
        );
        v.check_field(
            validator::matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address",
        );
        v.check_field(
            validator::not_blank(&self.password),
            "password",
            "This field cannot be blank",
        );
        v.check_field(
            validator::min_chars(&self.password, PASSWORD_MIN_CHARS),
            "password",
            "This field must be at least 8 characters long",
        );
        v.valid()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserLoginForm {
    pub email: String,
    pub password: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl UserLoginForm {
    pub fn validate(&mut self) -> bool {
        let v = &mut self.validator;
        v.check_field(
            validator::not_blank(&self.email),
            "email",
            "This field cannot be blank",
        );
        v.check_field(
            validator::matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address",
        );
        v.check_field(
            validator::not_blank(&self.password),
            "password",
            "This field cannot be blank",
        );
        v.valid()
    }
}
