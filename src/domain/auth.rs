use std::future::{Ready, ready};

use actix_web::dev::Payload;
use actix_web::error::{ErrorInternalServerError, ErrorUnauthorized};
use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, web};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;

/// Claims carried by the bearer token of an authenticated caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Subject (user identifier).
    pub sub: String,
    pub email: String,
    pub name: String,
    /// Expiration as a unix timestamp.
    pub exp: i64,
}

impl AuthenticatedUser {
    /// Claims for a token that expires `ttl` from now.
    pub fn new(
        sub: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: sub.into(),
            email: email.into(),
            name: name.into(),
            exp: (Utc::now() + ttl).timestamp(),
        }
    }

    /// Sign the claims with the shared HS256 secret.
    pub fn issue_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        encode(
            &Header::new(Algorithm::HS256),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Verify signature and expiry of `token` and return its claims.
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, actix_web::Error> {
    let Some(config) = req.app_data::<web::Data<ServerConfig>>() else {
        log::error!("ServerConfig is not registered as app data");
        return Err(ErrorInternalServerError("server misconfigured"));
    };

    let token = bearer_token(req).ok_or_else(|| ErrorUnauthorized("missing bearer token"))?;

    AuthenticatedUser::from_token(token, &config.secret).map_err(|err| {
        log::debug!("Rejected bearer token: {err}");
        ErrorUnauthorized("invalid bearer token")
    })
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    const SECRET: &str = "test-secret";

    fn config() -> ServerConfig {
        ServerConfig {
            database_url: ":memory:".to_string(),
            address: "127.0.0.1".to_string(),
            port: 0,
            secret: SECRET.to_string(),
            static_dir: "./wwwroot".into(),
            uploads_dir: "./wwwroot/uploads".into(),
        }
    }

    fn user(ttl: Duration) -> AuthenticatedUser {
        AuthenticatedUser::new("user-1", "user@example.com", "User", ttl)
    }

    #[test]
    fn issued_token_decodes_to_same_claims() {
        let claims = user(Duration::hours(1));
        let token = claims.issue_token(SECRET).expect("issue");

        let decoded = AuthenticatedUser::from_token(&token, SECRET).expect("decode");

        assert_eq!(decoded, claims);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = user(Duration::hours(1)).issue_token("other").expect("issue");

        assert!(AuthenticatedUser::from_token(&token, SECRET).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = user(Duration::minutes(-10)).issue_token(SECRET).expect("issue");

        assert!(AuthenticatedUser::from_token(&token, SECRET).is_err());
    }

    #[actix_web::test]
    async fn extractor_accepts_valid_bearer_header() {
        let token = user(Duration::hours(1)).issue_token(SECRET).expect("issue");
        let req = TestRequest::default()
            .app_data(web::Data::new(config()))
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .to_http_request();

        let extracted = AuthenticatedUser::extract(&req).await.expect("authenticated");

        assert_eq!(extracted.email, "user@example.com");
    }

    #[actix_web::test]
    async fn extractor_rejects_missing_or_malformed_header() {
        for header_value in [None, Some("Basic abc"), Some("Bearer "), Some("garbage")] {
            let mut builder = TestRequest::default().app_data(web::Data::new(config()));
            if let Some(value) = header_value {
                builder = builder.insert_header((header::AUTHORIZATION, value));
            }
            let req = builder.to_http_request();

            assert!(
                AuthenticatedUser::extract(&req).await.is_err(),
                "expected {header_value:?} to be rejected"
            );
        }
    }
}
