use askama::Template;

use super::{Page, TemplateData};
use crate::repos::Snippet;
use crate::web::forms::{SnippetCreateForm, UserLoginForm, UserSignupForm};

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomePage {
    pub data: TemplateData,
    pub snippets: Vec<Snippet>,
}

#[derive(Template)]
#[template(path = "pages/view.html")]
pub struct ViewPage {
    pub data: TemplateData,
    pub snippet: Snippet,
}

#[derive(Template)]
#[template(path = "pages/create.html")]
pub struct CreatePage {
    pub data: TemplateData,
    pub form: SnippetCreateForm,
}

#[derive(Template)]
#[template(path = "pages/signup.html")]
pub struct SignupPage {
    pub data: TemplateData,
    pub form: UserSignupForm,
}

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginPage {
    pub data: TemplateData,
    pub form: UserLoginForm,
}

macro_rules! impl_page {
    ($($page:ty),* $(,)?) => {
        $(impl Page for $page {
            fn data(&self) -> &TemplateData {
                &self.data
            }
        })*
    };
}

impl_page!(HomePage, ViewPage, CreatePage, SignupPage, LoginPage);
