use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{require, AppState, AuthUser, Permission};
use crate::models::{CreateServiceRequest, Service, UpdateServiceRequest};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_services))
        .route("/", post(create_service))
        .route("/:id", put(update_service))
}

/// Список услуг; жильцам видны только активные
#[utoipa::path(
    get,
    path = "/api/v1/services",
    tag = "catalogs",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Услуги", body = Vec<Service>),
        (status = 401, description = "Не авторизован")
    )
)]
pub async fn list_services(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Vec<Service>>> {
    let services = match crate::middleware::is_operator_or_higher(&auth_user.role) {
        true => {
            sqlx::query_as::<_, Service>("SELECT * FROM services ORDER BY name")
                .fetch_all(&state.pool)
                .await?
        }
        false => {
            sqlx::query_as::<_, Service>(
                "SELECT * FROM services WHERE is_active = true ORDER BY name",
            )
            .fetch_all(&state.pool)
            .await?
        }
    };

    Ok(Json(services))
}

/// Создание услуги
#[utoipa::path(
    post,
    path = "/api/v1/services",
    tag = "catalogs",
    security(("bearer_auth" = [])),
    request_body = CreateServiceRequest,
    responses(
        (status = 200, description = "Услуга создана", body = Service),
        (status = 403, description = "Доступ запрещён"),
        (status = 422, description = "Ошибка валидации")
    )
)]
pub async fn create_service(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateServiceRequest>,
) -> AppResult<Json<Service>> {
    require(&auth_user.role, Permission::ManageCatalogs)?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Название обязательно".to_string()));
    }

    if payload.rate < Decimal::ZERO {
        return Err(AppError::Validation(
            "Тариф не может быть отрицательным".to_string(),
        ));
    }

    let service = sqlx::query_as::<_, Service>(
        r#"
        INSERT INTO services (name, description, unit, rate, is_counter)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(&payload.description)
    .bind(&payload.unit)
    .bind(payload.rate)
    .bind(payload.is_counter.unwrap_or(false))
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(service))
}

/// Обновление услуги: тариф, описание, активность.
/// Признак расчёта по счётчику не меняется, чтобы не ломать
/// уже созданные начисления
#[utoipa::path(
    put,
    path = "/api/v1/services/{id}",
    tag = "catalogs",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID услуги")),
    request_body = UpdateServiceRequest,
    responses(
        (status = 200, description = "Услуга обновлена", body = Service),
        (status = 403, description = "Доступ запрещён"),
        (status = 404, description = "Услуга не найдена")
    )
)]
pub async fn update_service(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateServiceRequest>,
) -> AppResult<Json<Service>> {
    require(&auth_user.role, Permission::ManageCatalogs)?;

    if let Some(rate) = payload.rate {
        if rate < Decimal::ZERO {
            return Err(AppError::Validation(
                "Тариф не может быть отрицательным".to_string(),
            ));
        }
    }

    let service = sqlx::query_as::<_, Service>(
        r#"
        UPDATE services
        SET name = COALESCE($2, name),
            description = COALESCE($3, description),
            unit = COALESCE($4, unit),
            rate = COALESCE($5, rate),
            is_active = COALESCE($6, is_active)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(&payload.unit)
    .bind(payload.rate)
    .bind(payload.is_active)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Услуга не найдена".to_string()))?;

    Ok(Json(service))
}
