use axum_extra::extract::cookie::SignedCookieJar;
use cookie::{Cookie, Key, SameSite};
use tracing::warn;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const CSRF_COOKIE: &str = "top_movies_csrf";
pub const CSRF_FIELD: &str = "csrf_token";

pub fn signing_key(secret: &str) -> Key {
    if secret.len() >= 32 {
        Key::derive_from(secret.as_bytes())
    } else {
        warn!("SECRET_KEY is unset or shorter than 32 bytes, using an ephemeral signing key");
        Key::generate()
    }
}

pub fn ensure_token(jar: SignedCookieJar) -> (SignedCookieJar, String) {
    if let Some(token) = jar.get(CSRF_COOKIE).map(|c| c.value().to_owned()) {
        return (jar, token);
    }

    let token = Uuid::new_v4().simple().to_string();
    let cookie = Cookie::build((CSRF_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::hours(12));

    (jar.add(cookie), token)
}

pub fn verify(jar: &SignedCookieJar, submitted: &str) -> AppResult<()> {
    match jar.get(CSRF_COOKIE) {
        Some(cookie) if !submitted.is_empty() && tokens_match(cookie.value(), submitted) => Ok(()),
        _ => {
            warn!("rejected form post with a missing or mismatched token");
            Err(AppError::Forbidden(
                "This form has expired or did not come from this site. Reload the page and try again."
                    .to_string(),
            ))
        },
    }
}

// Constant-time for equal lengths; tokens are fixed-length so the length leaks nothing.
fn tokens_match(expected: &str, submitted: &str) -> bool {
    expected.len() == submitted.len()
        && expected.bytes().zip(submitted.bytes()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}
