use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_operator_or_higher, require, AppState, AuthUser, Permission};
use crate::models::{
    Apartment, ApartmentResponse, CreateApartmentRequest, CreateResidentRequest, Resident,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_apartments))
        .route("/", post(create_apartment))
        .route("/my", get(get_my_apartment))
        .route("/:id", delete(delete_apartment))
        .route("/:id/residents", get(list_residents))
        .route("/:id/residents", post(create_resident))
}

/// Список квартир
#[utoipa::path(
    get,
    path = "/api/v1/apartments",
    tag = "catalogs",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Квартиры", body = Vec<Apartment>),
        (status = 403, description = "Доступ запрещён")
    )
)]
pub async fn list_apartments(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Vec<Apartment>>> {
    if !is_operator_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let apartments =
        sqlx::query_as::<_, Apartment>("SELECT * FROM apartments ORDER BY building_id, number")
            .fetch_all(&state.pool)
            .await?;

    Ok(Json(apartments))
}

/// Добавление квартиры
#[utoipa::path(
    post,
    path = "/api/v1/apartments",
    tag = "catalogs",
    security(("bearer_auth" = [])),
    request_body = CreateApartmentRequest,
    responses(
        (status = 200, description = "Квартира добавлена", body = Apartment),
        (status = 403, description = "Доступ запрещён"),
        (status = 404, description = "Дом не найден"),
        (status = 409, description = "Квартира с таким номером уже есть"),
        (status = 422, description = "Ошибка валидации")
    )
)]
pub async fn create_apartment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateApartmentRequest>,
) -> AppResult<Json<Apartment>> {
    require(&auth_user.role, Permission::ManageCatalogs)?;

    if payload.area <= Decimal::ZERO {
        return Err(AppError::Validation(
            "Площадь должна быть больше нуля".to_string(),
        ));
    }

    let building: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM buildings WHERE id = $1")
        .bind(payload.building_id)
        .fetch_optional(&state.pool)
        .await?;

    if building.is_none() {
        return Err(AppError::NotFound("Дом не найден".to_string()));
    }

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM apartments WHERE building_id = $1 AND number = $2")
            .bind(payload.building_id)
            .bind(&payload.number)
            .fetch_optional(&state.pool)
            .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(
            "Квартира с таким номером уже есть в этом доме".to_string(),
        ));
    }

    let apartment = sqlx::query_as::<_, Apartment>(
        r#"
        INSERT INTO apartments (building_id, number, floor, area, rooms)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(payload.building_id)
    .bind(&payload.number)
    .bind(payload.floor)
    .bind(payload.area)
    .bind(payload.rooms)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(apartment))
}

/// Квартира текущего жильца
#[utoipa::path(
    get,
    path = "/api/v1/apartments/my",
    tag = "catalogs",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Квартира", body = ApartmentResponse),
        (status = 403, description = "Пользователь не привязан к квартире"),
        (status = 404, description = "Квартира не найдена")
    )
)]
pub async fn get_my_apartment(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<ApartmentResponse>> {
    require(&auth_user.role, Permission::PersonalAccount)?;

    let apartment_id = auth_user.apartment_id.ok_or(AppError::Forbidden)?;

    let apartment = sqlx::query_as::<_, Apartment>("SELECT * FROM apartments WHERE id = $1")
        .bind(apartment_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Квартира не найдена".to_string()))?;

    let building_address: Option<(String,)> =
        sqlx::query_as("SELECT address FROM buildings WHERE id = $1")
            .bind(apartment.building_id)
            .fetch_optional(&state.pool)
            .await?;

    Ok(Json(ApartmentResponse {
        id: apartment.id,
        building_id: apartment.building_id,
        building_address: building_address.map(|(a,)| a),
        number: apartment.number,
        floor: apartment.floor,
        area: apartment.area,
        rooms: apartment.rooms,
    }))
}

/// Удаление квартиры вместе с жильцами, начислениями и платежами
#[utoipa::path(
    delete,
    path = "/api/v1/apartments/{id}",
    tag = "catalogs",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID квартиры")),
    responses(
        (status = 200, description = "Квартира удалена"),
        (status = 403, description = "Доступ запрещён"),
        (status = 404, description = "Квартира не найдена")
    )
)]
pub async fn delete_apartment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    require(&auth_user.role, Permission::ManageCatalogs)?;

    let result = sqlx::query("DELETE FROM apartments WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Квартира не найдена".to_string()));
    }

    Ok(Json(json!({ "success": true })))
}

/// Жильцы квартиры
#[utoipa::path(
    get,
    path = "/api/v1/apartments/{id}/residents",
    tag = "catalogs",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID квартиры")),
    responses(
        (status = 200, description = "Жильцы", body = Vec<Resident>),
        (status = 403, description = "Доступ запрещён")
    )
)]
pub async fn list_residents(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Resident>>> {
    if !is_operator_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let residents = sqlx::query_as::<_, Resident>(
        "SELECT * FROM residents WHERE apartment_id = $1 ORDER BY full_name",
    )
    .bind(id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(residents))
}

/// Добавление жильца
#[utoipa::path(
    post,
    path = "/api/v1/apartments/{id}/residents",
    tag = "catalogs",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID квартиры")),
    request_body = CreateResidentRequest,
    responses(
        (status = 200, description = "Жилец добавлен", body = Resident),
        (status = 403, description = "Доступ запрещён"),
        (status = 404, description = "Квартира не найдена"),
        (status = 422, description = "Ошибка валидации")
    )
)]
pub async fn create_resident(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateResidentRequest>,
) -> AppResult<Json<Resident>> {
    require(&auth_user.role, Permission::ManageCatalogs)?;

    let full_name = payload.full_name.trim();
    if full_name.is_empty() {
        return Err(AppError::Validation("ФИО обязательно".to_string()));
    }

    let apartment: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM apartments WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;

    if apartment.is_none() {
        return Err(AppError::NotFound("Квартира не найдена".to_string()));
    }

    let resident = sqlx::query_as::<_, Resident>(
        r#"
        INSERT INTO residents (apartment_id, full_name, phone, email, is_owner)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(full_name)
    .bind(&payload.phone)
    .bind(&payload.email)
    .bind(payload.is_owner.unwrap_or(false))
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(resident))
}
