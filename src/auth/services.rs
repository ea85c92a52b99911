use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;

use super::dto::{LoginRequest, RegisterInput, RegisterRequest};
use super::extractors::AuthUser;
use super::repo_types::User;
use crate::error::{AppError, AppResult, FieldErrors};

pub const SESSION_COOKIE: &str = "access_token";
pub const MIN_PASSWORD_LEN: usize = 8;

lazy_static! {
    static ref PHONE_RE: Regex = Regex::new(r"^\+9989[0-9]{8}$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// Accepts `+9989` followed by exactly eight digits.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub const PHONE_FORMAT_MESSAGE: &str =
    "Phone number must be entered in the format: '+9989XXXXXXXX'.";

impl RegisterRequest {
    pub fn validate(self) -> AppResult<RegisterInput> {
        let mut errors = FieldErrors::new();

        let phone_number = self.phone_number.trim().to_string();
        if !is_valid_phone(&phone_number) {
            errors.add("phone_number", PHONE_FORMAT_MESSAGE);
        }

        let email = self
            .email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());
        if let Some(email) = &email {
            if !is_valid_email(email) {
                errors.add("email", "Enter a valid email address.");
            }
        }

        if self.password1.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "password1",
                format!("Password must be at least {MIN_PASSWORD_LEN} characters."),
            );
        }
        if self.password1 != self.password2 {
            errors.add("password2", "Passwords do not match");
        }

        errors.into_result()?;
        Ok(RegisterInput {
            phone_number,
            email,
            password: self.password1,
        })
    }
}

impl LoginRequest {
    /// Trims the phone number; the format itself is checked at registration only.
    pub fn validate(mut self) -> AppResult<Self> {
        self.phone_number = self.phone_number.trim().to_string();
        let mut errors = FieldErrors::new();
        if self.phone_number.is_empty() {
            errors.add("phone_number", "This field is required.");
        }
        if self.password.is_empty() {
            errors.add("password", "This field is required.");
        }
        errors.into_result()?;
        Ok(self)
    }
}

/// Admin claims in the token are confirmed against the stored account, so a
/// demoted admin loses access before their token expires. Customer claims are
/// rejected without a query.
pub async fn is_admin_now(db: &PgPool, user: &AuthUser) -> AppResult<bool> {
    if !user.role.is_admin() {
        return Ok(false);
    }
    let stored = User::find_by_id(db, user.id).await?;
    Ok(stored.is_some_and(|u| u.role.is_admin()))
}

/// Every catalog-mutating endpoint goes through this check.
pub async fn require_admin(db: &PgPool, user: &AuthUser, action: &str) -> AppResult<()> {
    if is_admin_now(db, user).await? {
        Ok(())
    } else {
        tracing::warn!(
            user_id = %user.id,
            token_role = ?user.role,
            action,
            "non-admin attempted privileged action"
        );
        Err(AppError::Forbidden(format!(
            "Only administrators can {action}."
        )))
    }
}

pub fn session_cookie(token: &str, max_age_secs: u64, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

/// Pulls the session token out of a raw `Cookie` header.
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}
