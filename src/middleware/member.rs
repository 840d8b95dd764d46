// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Remembered member name.
//!
//! Members are not authenticated; a client just tells the server who it is.
//! The name comes from the `km_member` cookie, falling back to the
//! `X-Member-Name` header. The jar decodes the cookie; the header may be
//! percent-encoded.

use axum::{extract::Request, middleware::Next, response::Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

pub const MEMBER_COOKIE: &str = "km_member";
/// Lowercase so it can also be used as a `HeaderName`.
pub const MEMBER_HEADER: &str = "x-member-name";

/// The member name remembered by the client, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveMember(pub Option<String>);

impl ActiveMember {
    pub fn name(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// Middleware that resolves the remembered member name.
///
/// Never rejects a request: a missing name only matters to operations that
/// need one, and they report it themselves.
pub async fn resolve_member(jar: CookieJar, mut request: Request, next: Next) -> Response {
    // Try cookie first, then header
    let from_cookie = jar.get(MEMBER_COOKIE).map(|c| c.value().to_string());
    let from_header = || {
        request
            .headers()
            .get(MEMBER_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|raw| urlencoding::decode(raw).ok())
            .map(|s| s.into_owned())
    };

    let name = from_cookie
        .or_else(from_header)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    request.extensions_mut().insert(ActiveMember(name));
    next.run(request).await
}

/// Long-lived cookie remembering `name`. The jar percent-encodes it.
pub fn member_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((MEMBER_COOKIE, name.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .permanent()
        .build()
}
