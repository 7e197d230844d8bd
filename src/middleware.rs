use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBasic;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::error::ApiError;

/// Credentials accepted by the protected `/url` routes
#[derive(Clone, Debug)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    /// Compares both fields in constant time; a missing password never matches
    fn matches(&self, user: &str, password: Option<&str>) -> bool {
        let Some(password) = password else {
            return false;
        };
        let user_ok = self.user.as_bytes().ct_eq(user.as_bytes());
        let password_ok = self.password.as_bytes().ct_eq(password.as_bytes());
        (user_ok & password_ok).into()
    }
}

/// Middleware enforcing HTTP basic authentication
///
/// Requests without an `Authorization: Basic ...` header, or with
/// credentials that don't match, are answered with `401 Unauthorized` and a
/// `WWW-Authenticate` challenge for the `url-shortener` realm.
pub async fn basic_auth(
    State(credentials): State<Credentials>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = request.into_parts();

    let AuthBasic((user, password)) = AuthBasic::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            warn!("missing or malformed basic auth header");
            ApiError::Unauthorized
        })?;

    if !credentials.matches(&user, password.as_deref()) {
        warn!(user = %user, uri = %parts.uri, "invalid basic auth credentials");
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_require_user_and_password() {
        let credentials = Credentials {
            user: "admin".to_string(),
            password: "secret".to_string(),
        };

        assert!(credentials.matches("admin", Some("secret")));
        assert!(!credentials.matches("admin", Some("wrong")));
        assert!(!credentials.matches("admin", None));
        assert!(!credentials.matches("other", Some("secret")));
    }

    #[test]
    fn credentials_reject_prefixes_and_extensions() {
        let credentials = Credentials {
            user: "admin".to_string(),
            password: "secret".to_string(),
        };

        assert!(!credentials.matches("admin", Some("secre")));
        assert!(!credentials.matches("admin", Some("secret!")));
        assert!(!credentials.matches("admi", Some("secret")));
        assert!(!credentials.matches("admin", Some("")));
    }
}
