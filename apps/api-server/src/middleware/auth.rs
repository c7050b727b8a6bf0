//! Identity extractors.
//!
//! The access gate: session tokens ride in the `Authorization: Bearer`
//! header and resolve to a user id through the session store before any
//! handler logic runs. Handlers receive the resolved identity as a plain
//! parameter; nothing downstream reads ambient request state.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures::future::LocalBoxFuture;

use updraft_core::ports::AuthError;
use updraft_shared::ErrorResponse;

use crate::state::AppState;

/// Authenticated viewer identity.
///
/// Use this in handlers to require authentication:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, user {}!", identity.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: i64,
    /// The raw session token, kept so logout can destroy the session.
    pub session_token: String,
}

/// Error type for authentication failures.
#[derive(Debug)]
pub struct AuthenticationError(pub AuthError);

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match &self.0 {
            AuthError::MissingAuth | AuthError::InvalidCredentials => {
                actix_web::http::StatusCode::UNAUTHORIZED
            }
            _ => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        let error = match &self.0 {
            AuthError::MissingAuth => ErrorResponse::new(401, "Authentication Required")
                .with_detail("Provide a valid Bearer session token in the Authorization header."),
            AuthError::InvalidCredentials => ErrorResponse::unauthorized(),
            _ => {
                tracing::error!("Session resolution failed: {}", self.0);
                ErrorResponse::internal_error()
            }
        };

        actix_web::HttpResponse::build(self.status_code()).json(error)
    }
}

fn bearer_token(req: &HttpRequest) -> Result<String, AuthenticationError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthenticationError(AuthError::MissingAuth))?;

    let value = header
        .to_str()
        .map_err(|_| AuthenticationError(AuthError::InvalidCredentials))?;

    value
        .strip_prefix("Bearer ")
        .map(str::to_owned)
        .ok_or(AuthenticationError(AuthError::InvalidCredentials))
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let state = state.ok_or_else(|| {
                tracing::error!("AppState not found in app data");
                AuthenticationError(AuthError::SessionBackend(
                    "server configuration error".to_string(),
                ))
            })?;
            let token = token?;

            match state.sessions.resolve(&token).await {
                Ok(Some(user_id)) => Ok(Identity {
                    user_id,
                    session_token: token,
                }),
                Ok(None) => Err(AuthenticationError(AuthError::InvalidCredentials)),
                Err(e) => Err(AuthenticationError(e)),
            }
        })
    }
}

/// Optional identity extractor - yields `None` instead of failing.
///
/// The feed uses this: anonymous viewers get the page without vote status.
/// Only the absence of valid credentials is anonymous; a session backend
/// failure still surfaces as an error so an authenticated client never
/// silently loses its vote status.
#[derive(Debug)]
pub struct MaybeIdentity(pub Option<Identity>);

impl FromRequest for MaybeIdentity {
    type Error = AuthenticationError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let inner = Identity::from_request(req, payload);
        Box::pin(async move {
            match inner.await {
                Ok(identity) => Ok(MaybeIdentity(Some(identity))),
                Err(AuthenticationError(
                    AuthError::MissingAuth | AuthError::InvalidCredentials,
                )) => Ok(MaybeIdentity(None)),
                Err(e) => Err(e),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::ResponseError;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use async_trait::async_trait;

    use updraft_core::domain::{
        NewPost, NewUser, Post, User, VoteDirection, VoteOutcome,
    };
    use updraft_core::error::{RepoError, VoteError};
    use updraft_core::feed::{FeedPage, FeedQuery};
    use updraft_core::ports::{
        PasswordService, PostRepository, SessionStore, UserRepository, VotingEngine,
    };

    use super::*;

    struct Unreachable;

    #[async_trait]
    impl UserRepository for Unreachable {
        async fn create(&self, _: NewUser) -> Result<User, RepoError> {
            unreachable!()
        }
        async fn find_by_id(&self, _: i64) -> Result<Option<User>, RepoError> {
            unreachable!()
        }
        async fn find_by_login(&self, _: &str) -> Result<Option<User>, RepoError> {
            unreachable!()
        }
    }

    #[async_trait]
    impl PostRepository for Unreachable {
        async fn create(&self, _: NewPost) -> Result<Post, RepoError> {
            unreachable!()
        }
        async fn find_by_id(&self, _: i64) -> Result<Option<Post>, RepoError> {
            unreachable!()
        }
        async fn update_content(
            &self,
            _: i64,
            _: Option<String>,
            _: Option<String>,
        ) -> Result<Option<Post>, RepoError> {
            unreachable!()
        }
        async fn delete(&self, _: i64) -> Result<(), RepoError> {
            unreachable!()
        }
        async fn feed(&self, _: FeedQuery) -> Result<FeedPage, RepoError> {
            unreachable!()
        }
    }

    #[async_trait]
    impl VotingEngine for Unreachable {
        async fn apply_vote(
            &self,
            _: i64,
            _: i64,
            _: VoteDirection,
        ) -> Result<VoteOutcome, VoteError> {
            unreachable!()
        }
    }

    impl PasswordService for Unreachable {
        fn hash(&self, _: &str) -> Result<String, AuthError> {
            unreachable!()
        }
        fn verify(&self, _: &str, _: &str) -> Result<bool, AuthError> {
            unreachable!()
        }
    }

    /// Session store scripted per token: "good" resolves, "down" fails.
    struct ScriptedSessions;

    #[async_trait]
    impl SessionStore for ScriptedSessions {
        async fn create(&self, _: i64) -> Result<String, AuthError> {
            unreachable!()
        }
        async fn resolve(&self, token: &str) -> Result<Option<i64>, AuthError> {
            match token {
                "good" => Ok(Some(42)),
                "down" => Err(AuthError::SessionBackend("redis unreachable".to_owned())),
                _ => Ok(None),
            }
        }
        async fn destroy(&self, _: &str) -> Result<(), AuthError> {
            unreachable!()
        }
    }

    fn stub_state() -> web::Data<AppState> {
        web::Data::new(AppState {
            users: Arc::new(Unreachable),
            posts: Arc::new(Unreachable),
            votes: Arc::new(Unreachable),
            sessions: Arc::new(ScriptedSessions),
            passwords: Arc::new(Unreachable),
        })
    }

    async fn extract(req: TestRequest) -> Result<MaybeIdentity, AuthenticationError> {
        let req = req.app_data(stub_state()).to_http_request();
        MaybeIdentity::from_request(&req, &mut Payload::None).await
    }

    #[actix_web::test]
    async fn test_no_header_is_anonymous() {
        let result = extract(TestRequest::default()).await.unwrap();
        assert!(result.0.is_none());
    }

    #[actix_web::test]
    async fn test_unknown_token_is_anonymous() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer expired"));
        let result = extract(req).await.unwrap();
        assert!(result.0.is_none());
    }

    #[actix_web::test]
    async fn test_valid_token_resolves() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer good"));
        let identity = extract(req).await.unwrap().0.unwrap();
        assert_eq!(identity.user_id, 42);
        assert_eq!(identity.session_token, "good");
    }

    #[actix_web::test]
    async fn test_session_backend_failure_is_not_anonymous() {
        // An authenticated client must see the outage, not a silently
        // vote-status-free page.
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer down"));
        let err = extract(req).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
