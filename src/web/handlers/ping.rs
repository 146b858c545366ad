/*
 * Responsibility
 * - GET /ping (疎通用、middleware chain をすべて通る)
 */
pub async fn ping() -> &'static str {
    "OK"
}
