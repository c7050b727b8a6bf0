//! Authentication handlers.

use actix_web::{HttpResponse, web};

use updraft_core::domain::{NewUser, User};
use updraft_shared::dto::{LoginRequest, RegisterRequest, SessionResponse, UserResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const MIN_USERNAME_LEN: usize = 6;
const MIN_PASSWORD_LEN: usize = 6;

fn validate_register(req: &RegisterRequest) -> Vec<String> {
    let mut errors = Vec::new();

    if !req.email.contains('@') {
        errors.push("email: invalid email".to_string());
    }
    if req.username.chars().count() < MIN_USERNAME_LEN {
        errors.push(format!(
            "username: must be at least {MIN_USERNAME_LEN} characters"
        ));
    }
    if req.username.contains('@') {
        errors.push("username: cannot include an @".to_string());
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(format!(
            "password: must be at least {MIN_PASSWORD_LEN} characters"
        ));
    }

    errors
}

fn user_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        created_at: user.created_at.to_rfc3339(),
    }
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let errors = validate_register(&req);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let password_hash = state.passwords.hash(&req.password)?;

    // The unique constraints on username/email surface as a conflict.
    let user = state
        .users
        .create(NewUser {
            username: req.username.to_lowercase(),
            email: req.email.to_lowercase(),
            password_hash,
        })
        .await
        .map_err(|e| match e {
            updraft_core::error::RepoError::Constraint(_) => {
                AppError::Conflict("username or email already taken".to_string())
            }
            other => other.into(),
        })?;

    let token = state.sessions.create(user.id).await?;

    Ok(HttpResponse::Created().json(SessionResponse {
        token,
        token_type: "Bearer".to_string(),
        user: user_response(&user),
    }))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_login(&req.login)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let valid = state.passwords.verify(&req.password, &user.password_hash)?;
    if !valid {
        return Err(AppError::Unauthorized);
    }

    let token = state.sessions.create(user.id).await?;

    Ok(HttpResponse::Ok().json(SessionResponse {
        token,
        token_type: "Bearer".to_string(),
        user: user_response(&user),
    }))
}

/// POST /api/auth/logout - destroys the current session.
pub async fn logout(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    state.sessions.destroy(&identity.session_token).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/auth/me - the currently authenticated user.
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(HttpResponse::Ok().json(user_response(&user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn accepts_a_valid_registration() {
        let errors = validate_register(&request("alice_b", "alice@example.com", "secret1"));
        assert!(errors.is_empty());
    }

    #[test]
    fn rejects_email_without_at_sign() {
        let errors = validate_register(&request("alice_b", "not-an-email", "secret1"));
        assert!(errors.iter().any(|e| e.starts_with("email")));
    }

    #[test]
    fn rejects_short_username() {
        let errors = validate_register(&request("ab", "alice@example.com", "secret1"));
        assert!(errors.iter().any(|e| e.starts_with("username")));
    }

    #[test]
    fn rejects_username_with_at_sign() {
        let errors = validate_register(&request("alice@b", "alice@example.com", "secret1"));
        assert!(errors.iter().any(|e| e.contains("cannot include an @")));
    }

    #[test]
    fn rejects_short_password() {
        let errors = validate_register(&request("alice_b", "alice@example.com", "abc"));
        assert!(errors.iter().any(|e| e.starts_with("password")));
    }

    #[test]
    fn collects_every_violation() {
        let errors = validate_register(&request("a@", "nope", "x"));
        assert_eq!(errors.len(), 4);
    }
}
