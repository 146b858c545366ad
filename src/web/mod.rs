/*
 * Responsibility
 * - HTML フロント: routes, handlers, forms, extractors
 */
pub mod extractors;
pub mod forms;
pub mod handlers;
mod routes;

pub use routes::routes;
