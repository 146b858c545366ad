pub mod auth;
pub mod csrf;
pub mod http;
pub mod security_headers;
pub mod session;
