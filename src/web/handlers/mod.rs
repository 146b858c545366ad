pub mod ping;
pub mod snippets;
pub mod users;
