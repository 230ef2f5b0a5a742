use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthUser};
use crate::models::{AuthResponse, LoginRequest, RefreshTokenRequest, TokenResponse, UserPublic};
use crate::services::AuthService;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh_token))
        .route("/me", get(get_me))
}

/// Вход по логину и паролю
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Успешный вход", body = AuthResponse),
        (status = 401, description = "Неверное имя пользователя или пароль")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = AuthService::get_user_by_username(&state.pool, &payload.username)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !AuthService::verify_password(&payload.password, &user.password_hash) {
        return Err(AppError::Unauthorized);
    }

    let auth_service = AuthService::new(state.config.clone());
    let access_token = auth_service.generate_access_token(&user)?;
    let refresh_token = auth_service.generate_refresh_token(&user)?;

    AuthService::update_last_login(&state.pool, user.id).await?;

    tracing::info!("User {} logged in", user.username);

    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: UserPublic::from(user),
    }))
}

/// Обновление пары токенов по refresh-токену
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Новая пара токенов", body = TokenResponse),
        (status = 401, description = "Неверный или истёкший токен")
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> AppResult<Json<TokenResponse>> {
    let auth_service = AuthService::new(state.config.clone());
    let claims = auth_service.verify_token(&payload.refresh_token)?;

    if claims.token_type != "refresh" {
        return Err(AppError::Unauthorized);
    }

    let user_id = claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthorized)?;
    let user = AuthService::get_user_by_id(&state.pool, user_id).await?;

    let access_token = auth_service.generate_access_token(&user)?;
    let refresh_token = auth_service.generate_refresh_token(&user)?;

    Ok(Json(TokenResponse {
        access_token,
        refresh_token,
    }))
}

/// Текущий пользователь
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Профиль пользователя", body = UserPublic),
        (status = 401, description = "Не авторизован")
    )
)]
pub async fn get_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<UserPublic>> {
    let user = AuthService::get_user_by_id(&state.pool, auth_user.user_id).await?;
    Ok(Json(UserPublic::from(user)))
}
