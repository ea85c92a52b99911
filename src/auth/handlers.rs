use axum::{
    extract::{FromRef, State},
    http::header,
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, FormDescription, LoginRequest, PublicUser, RefreshRequest, RegisterRequest},
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::{NewUser, User},
        services::{clear_session_cookie, session_cookie},
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", post(logout))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

async fn register_form() -> Json<FormDescription> {
    Json(FormDescription {
        action: "/register",
        fields: &["phone_number", "email", "password1", "password2"],
    })
}

async fn login_form() -> Json<FormDescription> {
    Json(FormDescription {
        action: "/login",
        fields: &["phone_number", "password"],
    })
}

/// Issues a token pair and sets the access token as the session cookie.
fn signed_in(state: &AppState, user: User) -> AppResult<impl IntoResponse> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(user.id, user.role)?;
    let refresh_token = keys.sign_refresh(user.id, user.role)?;
    let cookie = session_cookie(
        &access_token,
        keys.access_ttl.as_secs(),
        state.config.cookie_secure,
    );
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            access_token,
            refresh_token,
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let input = payload.validate()?;

    if User::find_by_phone(&state.db, &input.phone_number).await?.is_some() {
        warn!(phone = %input.phone_number, "phone already registered");
        return Err(AppError::Conflict("Phone number already registered".into()));
    }

    let password_hash = hash_password(&input.password)?;
    let user = User::create(
        &state.db,
        &NewUser {
            phone_number: input.phone_number,
            email: input.email,
            password_hash,
        },
    )
    .await?;

    info!(user_id = %user.id, phone = %user.phone_number, "user registered");
    signed_in(&state, user)
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let payload = payload.validate()?;
    let invalid = || AppError::Validation(crate::error::FieldErrors::single(
        "password",
        "Invalid phone number or password",
    ));

    let Some(user) = User::find_by_phone(&state.db, &payload.phone_number).await? else {
        warn!(phone = %payload.phone_number, "login unknown phone");
        return Err(invalid());
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(invalid());
    }

    info!(user_id = %user.id, "user logged in");
    signed_in(&state, user)
}

#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, clear_session_cookie(state.config.cookie_secure))],
        Redirect::to("/"),
    )
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<impl IntoResponse> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        AppError::Unauthorized
    })?;

    // Role may have changed since the refresh token was signed.
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(AppError::Unauthorized)?;
    signed_in(&state, user)
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = User::find_by_id(&state.db, auth.id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(user.into()))
}
