use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_operator_or_higher, require, AppState, AuthUser, Permission};
use crate::models::{Apartment, Building, CreateBuildingRequest};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_buildings))
        .route("/", post(create_building))
        .route("/:id", delete(delete_building))
        .route("/:id/apartments", get(list_building_apartments))
}

/// Список домов
#[utoipa::path(
    get,
    path = "/api/v1/buildings",
    tag = "catalogs",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Дома", body = Vec<Building>),
        (status = 403, description = "Доступ запрещён")
    )
)]
pub async fn list_buildings(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Vec<Building>>> {
    if !is_operator_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let buildings = sqlx::query_as::<_, Building>("SELECT * FROM buildings ORDER BY address")
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(buildings))
}

/// Добавление дома
#[utoipa::path(
    post,
    path = "/api/v1/buildings",
    tag = "catalogs",
    security(("bearer_auth" = [])),
    request_body = CreateBuildingRequest,
    responses(
        (status = 200, description = "Дом добавлен", body = Building),
        (status = 403, description = "Доступ запрещён"),
        (status = 422, description = "Ошибка валидации")
    )
)]
pub async fn create_building(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateBuildingRequest>,
) -> AppResult<Json<Building>> {
    require(&auth_user.role, Permission::ManageCatalogs)?;

    let address = payload.address.trim();
    if address.is_empty() {
        return Err(AppError::Validation("Адрес обязателен".to_string()));
    }

    let building = sqlx::query_as::<_, Building>(
        r#"
        INSERT INTO buildings (address, floors, apartments_count)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(address)
    .bind(payload.floors)
    .bind(payload.apartments_count)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(building))
}

/// Удаление дома вместе с квартирами, жильцами и их начислениями
#[utoipa::path(
    delete,
    path = "/api/v1/buildings/{id}",
    tag = "catalogs",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID дома")),
    responses(
        (status = 200, description = "Дом удалён"),
        (status = 403, description = "Доступ запрещён"),
        (status = 404, description = "Дом не найден")
    )
)]
pub async fn delete_building(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    require(&auth_user.role, Permission::ManageCatalogs)?;

    let result = sqlx::query("DELETE FROM buildings WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Дом не найден".to_string()));
    }

    Ok(Json(json!({ "success": true })))
}

/// Квартиры дома
#[utoipa::path(
    get,
    path = "/api/v1/buildings/{id}/apartments",
    tag = "catalogs",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID дома")),
    responses(
        (status = 200, description = "Квартиры", body = Vec<Apartment>),
        (status = 403, description = "Доступ запрещён"),
        (status = 404, description = "Дом не найден")
    )
)]
pub async fn list_building_apartments(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Apartment>>> {
    if !is_operator_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let building: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM buildings WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;

    if building.is_none() {
        return Err(AppError::NotFound("Дом не найден".to_string()));
    }

    let apartments =
        sqlx::query_as::<_, Apartment>("SELECT * FROM apartments WHERE building_id = $1 ORDER BY number")
            .bind(id)
            .fetch_all(&state.pool)
            .await?;

    Ok(Json(apartments))
}
