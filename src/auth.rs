//! Bearer token authentication against a single shared API key.

use std::fmt::Debug;

use axum::{
    extract::{FromRef, Request, State},
    http::{HeaderValue, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::{AppState, Error};

const BEARER_PREFIX: &str = "Bearer ";

/// The shared secret clients present as a bearer token.
///
/// The key is never printed, `Debug` shows a placeholder instead.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Create an API key.
    ///
    /// # Errors
    /// Returns an error message if `key` is empty, since an empty key would
    /// match a header of just `"Bearer "`.
    pub fn new(key: &str) -> Result<Self, String> {
        if key.is_empty() {
            return Err("the API key must not be empty".to_owned());
        }

        Ok(Self(key.to_owned()))
    }

    /// Check `token` against the key in constant time.
    pub fn matches(&self, token: &str) -> bool {
        self.0.as_bytes().ct_eq(token.as_bytes()).into()
    }
}

impl Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(********)")
    }
}

/// What an `Authorization` header contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationHeader<'a> {
    /// The request had no `Authorization` header.
    Absent,
    /// The header was not valid text or did not use the bearer scheme.
    Malformed,
    /// The token following `"Bearer "`.
    Token(&'a str),
}

/// Extract the bearer token from an `Authorization` header value.
pub fn parse_authorization_header(header: Option<&HeaderValue>) -> AuthorizationHeader<'_> {
    let Some(header) = header else {
        return AuthorizationHeader::Absent;
    };

    match header.to_str() {
        Ok("") => AuthorizationHeader::Absent,
        Ok(value) => value
            .strip_prefix(BEARER_PREFIX)
            .map_or(AuthorizationHeader::Malformed, AuthorizationHeader::Token),
        Err(_) => AuthorizationHeader::Malformed,
    }
}

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The key that bearer tokens are checked against.
    pub api_key: ApiKey,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            api_key: state.api_key.clone(),
        }
    }
}

/// Check the request's `Authorization` header against `api_key`.
///
/// # Errors
/// Returns [Error::MissingAuthorization] if there is no bearer token and
/// [Error::InvalidApiKey] if the token does not match.
pub fn verify_api_key(header: Option<&HeaderValue>, api_key: &ApiKey) -> Result<(), Error> {
    match parse_authorization_header(header) {
        AuthorizationHeader::Absent | AuthorizationHeader::Malformed => {
            Err(Error::MissingAuthorization)
        }
        AuthorizationHeader::Token(token) if api_key.matches(token) => Ok(()),
        AuthorizationHeader::Token(_) => Err(Error::InvalidApiKey),
    }
}

/// Middleware function that rejects requests without the configured bearer
/// token. The request is passed on unchanged if the token matches.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let verified = verify_api_key(request.headers().get(AUTHORIZATION), &state.api_key);

    match verified {
        Ok(()) => next.run(request).await,
        Err(error) => {
            tracing::warn!("Rejected request to {}: {error}", request.uri().path());
            error.into_response()
        }
    }
}

#[cfg(test)]
mod parse_authorization_header_tests {
    use axum::http::HeaderValue;

    use super::{AuthorizationHeader, parse_authorization_header};

    #[test]
    fn missing_header_is_absent() {
        assert_eq!(parse_authorization_header(None), AuthorizationHeader::Absent);
    }

    #[test]
    fn empty_header_is_absent() {
        let header = HeaderValue::from_static("");

        assert_eq!(
            parse_authorization_header(Some(&header)),
            AuthorizationHeader::Absent
        );
    }

    #[test]
    fn other_scheme_is_malformed() {
        let header = HeaderValue::from_static("Basic dXNlcjpwYXNz");

        assert_eq!(
            parse_authorization_header(Some(&header)),
            AuthorizationHeader::Malformed
        );
    }

    #[test]
    fn scheme_is_case_sensitive() {
        let header = HeaderValue::from_static("bearer foo");

        assert_eq!(
            parse_authorization_header(Some(&header)),
            AuthorizationHeader::Malformed
        );
    }

    #[test]
    fn non_text_header_is_malformed() {
        let header = HeaderValue::from_bytes(b"Bearer \xff").unwrap();

        assert_eq!(
            parse_authorization_header(Some(&header)),
            AuthorizationHeader::Malformed
        );
    }

    #[test]
    fn bearer_token_is_extracted() {
        let header = HeaderValue::from_static("Bearer hunter2");

        assert_eq!(
            parse_authorization_header(Some(&header)),
            AuthorizationHeader::Token("hunter2")
        );
    }

    #[test]
    fn token_keeps_surrounding_text() {
        let header = HeaderValue::from_static("Bearer  hunter2");

        assert_eq!(
            parse_authorization_header(Some(&header)),
            AuthorizationHeader::Token(" hunter2")
        );
    }
}

#[cfg(test)]
mod verify_api_key_tests {
    use axum::http::HeaderValue;

    use crate::Error;

    use super::{ApiKey, verify_api_key};

    fn key() -> ApiKey {
        ApiKey::new("hunter2").unwrap()
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(ApiKey::new("").is_err());
    }

    #[test]
    fn debug_does_not_print_key() {
        assert!(!format!("{:?}", key()).contains("hunter2"));
    }

    #[test]
    fn matching_token_is_accepted() {
        let header = HeaderValue::from_static("Bearer hunter2");

        assert_eq!(verify_api_key(Some(&header), &key()), Ok(()));
    }

    #[test]
    fn mismatched_token_is_invalid() {
        let header = HeaderValue::from_static("Bearer hunter3");

        assert_eq!(
            verify_api_key(Some(&header), &key()),
            Err(Error::InvalidApiKey)
        );
    }

    #[test]
    fn token_prefix_is_invalid() {
        let header = HeaderValue::from_static("Bearer hunter");

        assert_eq!(
            verify_api_key(Some(&header), &key()),
            Err(Error::InvalidApiKey)
        );
    }

    #[test]
    fn missing_header_is_missing_authorization() {
        assert_eq!(
            verify_api_key(None, &key()),
            Err(Error::MissingAuthorization)
        );
    }
}
