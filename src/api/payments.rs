use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_operator_or_higher, require, AppState, AuthUser, Permission};
use crate::models::{
    ApplyPaymentRequest, Charge, CreatePaymentRequest, Payment, PaymentResponse,
    UpdatePaymentRequest,
};
use crate::services::payment_service;

/// Результат проведения платежа по начислению
#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct AppliedPaymentResponse {
    pub payment: PaymentResponse,
    pub charge: Charge,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_payments))
        .route("/", post(create_payment))
        .route("/charge/:id", post(apply_payment))
        .route("/my/:charge_id", post(pay_own_charge))
        .route("/:id", get(get_payment))
        .route("/:id", put(update_payment))
        .route("/:id", delete(delete_payment))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct PaymentsQuery {
    pub apartment_id: Option<Uuid>,
    pub status: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Список платежей. Жилец видит только платежи своей квартиры
#[utoipa::path(
    get,
    path = "/api/v1/payments",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(PaymentsQuery),
    responses(
        (status = 200, description = "Платежи", body = Vec<PaymentResponse>),
        (status = 401, description = "Не авторизован"),
        (status = 403, description = "Жилец не привязан к квартире")
    )
)]
pub async fn list_payments(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<PaymentsQuery>,
) -> AppResult<Json<Vec<PaymentResponse>>> {
    let apartment_filter = if is_operator_or_higher(&auth_user.role) {
        query.apartment_id
    } else {
        Some(auth_user.apartment_id.ok_or(AppError::Forbidden)?)
    };

    let limit = query.limit.unwrap_or(50).min(200);
    let offset = query.page.unwrap_or(0) * limit;

    let payments = sqlx::query_as::<_, Payment>(
        r#"
        SELECT * FROM payments
        WHERE ($1::uuid IS NULL OR apartment_id = $1)
          AND ($2::varchar IS NULL OR status::text = $2)
          AND ($3::date IS NULL OR created_at::date >= $3)
          AND ($4::date IS NULL OR created_at::date <= $4)
        ORDER BY created_at DESC
        LIMIT $5 OFFSET $6
        "#,
    )
    .bind(apartment_filter)
    .bind(&query.status)
    .bind(query.date_from)
    .bind(query.date_to)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(
        payments.into_iter().map(PaymentResponse::from).collect(),
    ))
}

/// Прямое создание платежа без привязки к начислению
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    tag = "payments",
    security(("bearer_auth" = [])),
    request_body = CreatePaymentRequest,
    responses(
        (status = 200, description = "Платёж создан", body = PaymentResponse),
        (status = 403, description = "Доступ запрещён"),
        (status = 404, description = "Квартира не найдена"),
        (status = 422, description = "Ошибка валидации")
    )
)]
pub async fn create_payment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreatePaymentRequest>,
) -> AppResult<Json<PaymentResponse>> {
    let payment = payment_service::create_payment(&state.pool, &auth_user, &payload).await?;
    Ok(Json(PaymentResponse::from(payment)))
}

/// Проведение платежа по начислению: частичная или полная оплата
#[utoipa::path(
    post,
    path = "/api/v1/payments/charge/{id}",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID начисления")),
    request_body = ApplyPaymentRequest,
    responses(
        (status = 200, description = "Платёж проведён", body = AppliedPaymentResponse),
        (status = 400, description = "Начисление уже оплачено"),
        (status = 403, description = "Доступ запрещён"),
        (status = 404, description = "Начисление не найдено"),
        (status = 422, description = "Ошибка валидации")
    )
)]
pub async fn apply_payment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApplyPaymentRequest>,
) -> AppResult<Json<AppliedPaymentResponse>> {
    let (charge, payment) =
        payment_service::apply_to_charge(&state.pool, &auth_user, id, &payload).await?;

    Ok(Json(AppliedPaymentResponse {
        payment: PaymentResponse::from(payment),
        charge,
    }))
}

/// Оплата жильцом собственного начисления целиком
#[utoipa::path(
    post,
    path = "/api/v1/payments/my/{charge_id}",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(("charge_id" = Uuid, Path, description = "ID начисления")),
    responses(
        (status = 200, description = "Начисление оплачено", body = AppliedPaymentResponse),
        (status = 400, description = "Начисление уже оплачено"),
        (status = 403, description = "Доступ запрещён"),
        (status = 404, description = "Начисление не найдено")
    )
)]
pub async fn pay_own_charge(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(charge_id): Path<Uuid>,
) -> AppResult<Json<AppliedPaymentResponse>> {
    let (charge, payment) =
        payment_service::pay_own_charge(&state.pool, &auth_user, charge_id).await?;

    Ok(Json(AppliedPaymentResponse {
        payment: PaymentResponse::from(payment),
        charge,
    }))
}

/// Платёж по ID. Жильцу чужой платёж не раскрывается
#[utoipa::path(
    get,
    path = "/api/v1/payments/{id}",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID платежа")),
    responses(
        (status = 200, description = "Платёж", body = PaymentResponse),
        (status = 404, description = "Платёж не найден")
    )
)]
pub async fn get_payment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PaymentResponse>> {
    let apartment_filter = if is_operator_or_higher(&auth_user.role) {
        None
    } else {
        Some(auth_user.apartment_id.ok_or(AppError::Forbidden)?)
    };

    let payment = sqlx::query_as::<_, Payment>(
        r#"
        SELECT * FROM payments
        WHERE id = $1 AND ($2::uuid IS NULL OR apartment_id = $2)
        "#,
    )
    .bind(id)
    .bind(apartment_filter)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Платёж не найден".to_string()))?;

    Ok(Json(PaymentResponse::from(payment)))
}

/// Обновление статуса, способа оплаты или описания платежа
#[utoipa::path(
    put,
    path = "/api/v1/payments/{id}",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID платежа")),
    request_body = UpdatePaymentRequest,
    responses(
        (status = 200, description = "Платёж обновлён", body = PaymentResponse),
        (status = 403, description = "Доступ запрещён"),
        (status = 404, description = "Платёж не найден")
    )
)]
pub async fn update_payment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentRequest>,
) -> AppResult<Json<PaymentResponse>> {
    require(&auth_user.role, Permission::ManagePayments)?;

    let payment = sqlx::query_as::<_, Payment>(
        r#"
        UPDATE payments
        SET status = COALESCE($2, status),
            method = COALESCE($3, method),
            description = COALESCE($4, description)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.status)
    .bind(payload.method)
    .bind(&payload.description)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Платёж не найден".to_string()))?;

    Ok(Json(PaymentResponse::from(payment)))
}

/// Удаление платежа.
///
/// Оплаченная сумма и статус начисления, по которому платёж был
/// проведён, при удалении не пересчитываются
#[utoipa::path(
    delete,
    path = "/api/v1/payments/{id}",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID платежа")),
    responses(
        (status = 200, description = "Платёж удалён"),
        (status = 403, description = "Доступ запрещён"),
        (status = 404, description = "Платёж не найден")
    )
)]
pub async fn delete_payment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    require(&auth_user.role, Permission::ManagePayments)?;

    let result = sqlx::query("DELETE FROM payments WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Платёж не найден".to_string()));
    }

    Ok(Json(json!({ "success": true })))
}
