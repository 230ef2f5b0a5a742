use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{require, AppState, AuthUser, Permission};
use crate::models::{CreateUserRequest, UpdateUserRequest, User, UserPublic};
use crate::services::AuthService;
use crate::utils::validators::{validate_email, validate_username};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/users", get(list_users))
        .route("/users", post(create_user))
        .route("/users/:id", put(update_user))
        .route("/users/:id", delete(delete_user))
}

/// Сводная статистика: справочники, начисления, платежи
#[utoipa::path(
    get,
    path = "/api/v1/admin/dashboard",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Статистика"),
        (status = 403, description = "Доступ запрещён")
    )
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Value>> {
    require(&auth_user.role, Permission::ManageUsers)?;

    let buildings: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM buildings")
        .fetch_one(&state.pool)
        .await?;

    let apartments: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM apartments")
        .fetch_one(&state.pool)
        .await?;

    let residents: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM residents")
        .fetch_one(&state.pool)
        .await?;

    let active_services: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM services WHERE is_active = true")
            .fetch_one(&state.pool)
            .await?;

    let charged: (Option<Decimal>, Option<Decimal>) =
        sqlx::query_as("SELECT SUM(total), SUM(paid_amount) FROM charges")
            .fetch_one(&state.pool)
            .await?;

    let total_charged = charged.0.unwrap_or(Decimal::ZERO);
    let total_paid = charged.1.unwrap_or(Decimal::ZERO);

    let pending_payments: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM payments WHERE status = 'pending'")
            .fetch_one(&state.pool)
            .await?;

    let overdue_charges: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM charges WHERE due_date < CURRENT_DATE AND NOT is_paid",
    )
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(json!({
        "catalogs": {
            "buildings": buildings.0,
            "apartments": apartments.0,
            "residents": residents.0,
            "active_services": active_services.0
        },
        "billing": {
            "total_charged": total_charged,
            "total_paid": total_paid,
            "outstanding": total_charged - total_paid,
            "overdue_charges": overdue_charges.0
        },
        "payments": {
            "pending": pending_payments.0
        }
    })))
}

/// Список пользователей
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Пользователи", body = Vec<UserPublic>),
        (status = 403, description = "Доступ запрещён")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Vec<UserPublic>>> {
    require(&auth_user.role, Permission::ManageUsers)?;

    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(users.into_iter().map(UserPublic::from).collect()))
}

/// Создание пользователя
#[utoipa::path(
    post,
    path = "/api/v1/admin/users",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "Пользователь создан", body = UserPublic),
        (status = 403, description = "Доступ запрещён"),
        (status = 409, description = "Имя пользователя занято"),
        (status = 422, description = "Ошибка валидации")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<Json<UserPublic>> {
    require(&auth_user.role, Permission::ManageUsers)?;

    if !validate_username(&payload.username) {
        return Err(AppError::Validation(
            "Некорректное имя пользователя".to_string(),
        ));
    }

    if let Some(email) = &payload.email {
        if !validate_email(email) {
            return Err(AppError::Validation("Некорректный email".to_string()));
        }
    }

    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE username = $1")
        .bind(&payload.username)
        .fetch_optional(&state.pool)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(
            "Имя пользователя уже занято".to_string(),
        ));
    }

    let password_hash = AuthService::hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, password_hash, role, full_name, phone, apartment_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(&payload.username)
    .bind(&payload.email)
    .bind(&password_hash)
    .bind(payload.role)
    .bind(&payload.full_name)
    .bind(&payload.phone)
    .bind(payload.apartment_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(UserPublic::from(user)))
}

/// Обновление пользователя
#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID пользователя")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Пользователь обновлён", body = UserPublic),
        (status = 403, description = "Доступ запрещён"),
        (status = 404, description = "Пользователь не найден")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserPublic>> {
    require(&auth_user.role, Permission::ManageUsers)?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Пользователь не найден".to_string()))?;

    if let Some(email) = &payload.email {
        if !validate_email(email) {
            return Err(AppError::Validation("Некорректный email".to_string()));
        }
    }

    let password_hash = match &payload.password {
        Some(password) => AuthService::hash_password(password)?,
        None => user.password_hash.clone(),
    };

    let updated = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET email = COALESCE($2, email),
            role = COALESCE($3, role),
            full_name = COALESCE($4, full_name),
            phone = COALESCE($5, phone),
            apartment_id = COALESCE($6, apartment_id),
            password_hash = $7
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&payload.email)
    .bind(payload.role)
    .bind(&payload.full_name)
    .bind(&payload.phone)
    .bind(payload.apartment_id)
    .bind(&password_hash)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(UserPublic::from(updated)))
}

/// Удаление пользователя
#[utoipa::path(
    delete,
    path = "/api/v1/admin/users/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID пользователя")),
    responses(
        (status = 200, description = "Пользователь удалён"),
        (status = 403, description = "Доступ запрещён"),
        (status = 404, description = "Пользователь не найден")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    require(&auth_user.role, Permission::ManageUsers)?;

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Пользователь не найден".to_string()));
    }

    Ok(Json(json!({ "success": true })))
}
