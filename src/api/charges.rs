use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_operator_or_higher, AppState, AuthUser};
use crate::models::{
    Charge, ChargeResponse, DebtorRow, EnterReadingRequest, GenerateChargesRequest,
    GenerateChargesResponse, ServiceSummaryRow,
};
use crate::services::{charge_service, payment_service};
use crate::utils::validators::validate_period;

/// Максимум записей в списке должников
const DEBTORS_PAGE_SIZE: i64 = 20;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_charges))
        .route("/generate", post(generate_charges))
        .route("/debtors", get(list_debtors))
        .route("/overdue", get(list_overdue))
        .route("/summary", get(get_summary))
        .route("/:id", get(get_charge))
        .route("/:id/reading", put(enter_reading))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ChargesQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub apartment_id: Option<Uuid>,
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct PeriodQuery {
    pub month: u32,
    pub year: i32,
}

async fn service_names(state: &AppState) -> AppResult<HashMap<Uuid, String>> {
    let rows: Vec<(Uuid, String)> = sqlx::query_as("SELECT id, name FROM services")
        .fetch_all(&state.pool)
        .await?;
    Ok(rows.into_iter().collect())
}

fn to_response(charge: Charge, names: &HashMap<Uuid, String>, today: NaiveDate) -> ChargeResponse {
    let days_overdue = payment_service::days_overdue(charge.due_date, charge.is_paid, today);
    ChargeResponse {
        id: charge.id,
        apartment_id: charge.apartment_id,
        service_id: charge.service_id,
        service_name: names.get(&charge.service_id).cloned(),
        period: charge.period,
        amount: charge.amount,
        total: charge.total,
        paid_amount: charge.paid_amount,
        status: charge.status,
        is_paid: charge.is_paid,
        due_date: charge.due_date,
        days_overdue,
    }
}

/// Список начислений. Жилец видит только начисления своей квартиры
#[utoipa::path(
    get,
    path = "/api/v1/charges",
    tag = "charges",
    security(("bearer_auth" = [])),
    params(ChargesQuery),
    responses(
        (status = 200, description = "Начисления", body = Vec<ChargeResponse>),
        (status = 401, description = "Не авторизован"),
        (status = 403, description = "Жилец не привязан к квартире")
    )
)]
pub async fn list_charges(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<ChargesQuery>,
) -> AppResult<Json<Vec<ChargeResponse>>> {
    // Скоупинг по роли: жильцу подставляется его квартира
    let apartment_filter = if is_operator_or_higher(&auth_user.role) {
        query.apartment_id
    } else {
        Some(auth_user.apartment_id.ok_or(AppError::Forbidden)?)
    };

    let period = match (query.month, query.year) {
        (Some(month), Some(year)) => {
            if !validate_period(month, year) {
                return Err(AppError::Validation(format!(
                    "Некорректный период: {:02}.{}",
                    month, year
                )));
            }
            NaiveDate::from_ymd_opt(year, month, 1)
        }
        _ => None,
    };

    let limit = query.limit.unwrap_or(50).min(200);
    let offset = query.page.unwrap_or(0) * limit;

    let charges = sqlx::query_as::<_, Charge>(
        r#"
        SELECT * FROM charges
        WHERE ($1::uuid IS NULL OR apartment_id = $1)
          AND ($2::date IS NULL OR period = $2)
          AND ($3::varchar IS NULL OR status::text = $3)
        ORDER BY period DESC, created_at DESC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(apartment_filter)
    .bind(period)
    .bind(&query.status)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let names = service_names(&state).await?;
    let today = Utc::now().date_naive();

    Ok(Json(
        charges
            .into_iter()
            .map(|c| to_response(c, &names, today))
            .collect(),
    ))
}

/// Генерация начислений за период по выбранным услугам.
/// Повторный запуск за тот же период не создаёт дублей
#[utoipa::path(
    post,
    path = "/api/v1/charges/generate",
    tag = "charges",
    security(("bearer_auth" = [])),
    request_body = GenerateChargesRequest,
    responses(
        (status = 200, description = "Количество созданных начислений", body = GenerateChargesResponse),
        (status = 403, description = "Доступ запрещён"),
        (status = 422, description = "Ошибка валидации")
    )
)]
pub async fn generate_charges(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<GenerateChargesRequest>,
) -> AppResult<Json<GenerateChargesResponse>> {
    let created_count = charge_service::generate_charges(&state.pool, &auth_user, &payload).await?;

    // Период уже проверен генератором
    let period = NaiveDate::from_ymd_opt(payload.year, payload.month, 1)
        .ok_or_else(|| AppError::Internal("Некорректная дата периода".to_string()))?;

    Ok(Json(GenerateChargesResponse {
        created_count,
        period,
    }))
}

/// Должники: квартиры с недоплатой, по убыванию долга
#[utoipa::path(
    get,
    path = "/api/v1/charges/debtors",
    tag = "charges",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Список должников", body = Vec<DebtorRow>),
        (status = 403, description = "Доступ запрещён")
    )
)]
pub async fn list_debtors(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Vec<DebtorRow>>> {
    if !is_operator_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let debtors = sqlx::query_as::<_, DebtorRow>(
        r#"
        SELECT a.id AS apartment_id,
               a.number AS apartment_number,
               b.address AS building_address,
               SUM(c.total - c.paid_amount) AS debt
        FROM charges c
        JOIN apartments a ON a.id = c.apartment_id
        JOIN buildings b ON b.id = a.building_id
        WHERE c.paid_amount < c.total
        GROUP BY a.id, a.number, b.address
        ORDER BY debt DESC
        LIMIT $1
        "#,
    )
    .bind(DEBTORS_PAGE_SIZE)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(debtors))
}

/// Просроченные начисления с количеством дней просрочки
#[utoipa::path(
    get,
    path = "/api/v1/charges/overdue",
    tag = "charges",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Просроченные начисления", body = Vec<ChargeResponse>),
        (status = 403, description = "Доступ запрещён")
    )
)]
pub async fn list_overdue(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Vec<ChargeResponse>>> {
    if !is_operator_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let charges = sqlx::query_as::<_, Charge>(
        r#"
        SELECT * FROM charges
        WHERE due_date < CURRENT_DATE AND NOT is_paid
        ORDER BY due_date
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    let names = service_names(&state).await?;
    let today = Utc::now().date_naive();

    Ok(Json(
        charges
            .into_iter()
            .map(|c| to_response(c, &names, today))
            .collect(),
    ))
}

/// Сводка за период: начислено, оплачено и долг по каждой услуге
#[utoipa::path(
    get,
    path = "/api/v1/charges/summary",
    tag = "charges",
    security(("bearer_auth" = [])),
    params(PeriodQuery),
    responses(
        (status = 200, description = "Сводка по услугам", body = Vec<ServiceSummaryRow>),
        (status = 403, description = "Доступ запрещён"),
        (status = 422, description = "Некорректный период")
    )
)]
pub async fn get_summary(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<Vec<ServiceSummaryRow>>> {
    if !is_operator_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    if !validate_period(query.month, query.year) {
        return Err(AppError::Validation(format!(
            "Некорректный период: {:02}.{}",
            query.month, query.year
        )));
    }

    let period = NaiveDate::from_ymd_opt(query.year, query.month, 1)
        .ok_or_else(|| AppError::Validation("Некорректная дата периода".to_string()))?;

    let summary = sqlx::query_as::<_, ServiceSummaryRow>(
        r#"
        SELECT s.id AS service_id,
               s.name AS service_name,
               COALESCE(SUM(c.total), 0) AS total_charged,
               COALESCE(SUM(c.paid_amount), 0) AS total_paid,
               COALESCE(SUM(c.total - c.paid_amount), 0) AS outstanding
        FROM charges c
        JOIN services s ON s.id = c.service_id
        WHERE c.period = $1
        GROUP BY s.id, s.name
        ORDER BY s.name
        "#,
    )
    .bind(period)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(summary))
}

/// Начисление по ID. Жильцу чужое начисление не раскрывается
#[utoipa::path(
    get,
    path = "/api/v1/charges/{id}",
    tag = "charges",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID начисления")),
    responses(
        (status = 200, description = "Начисление", body = ChargeResponse),
        (status = 404, description = "Начисление не найдено")
    )
)]
pub async fn get_charge(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ChargeResponse>> {
    let apartment_filter = if is_operator_or_higher(&auth_user.role) {
        None
    } else {
        Some(auth_user.apartment_id.ok_or(AppError::Forbidden)?)
    };

    let charge = sqlx::query_as::<_, Charge>(
        r#"
        SELECT * FROM charges
        WHERE id = $1 AND ($2::uuid IS NULL OR apartment_id = $2)
        "#,
    )
    .bind(id)
    .bind(apartment_filter)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Начисление не найдено".to_string()))?;

    let names = service_names(&state).await?;

    Ok(Json(to_response(charge, &names, Utc::now().date_naive())))
}

/// Внесение показаний счётчика в начисление
#[utoipa::path(
    put,
    path = "/api/v1/charges/{id}/reading",
    tag = "charges",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID начисления")),
    request_body = EnterReadingRequest,
    responses(
        (status = 200, description = "Начисление пересчитано", body = ChargeResponse),
        (status = 400, description = "Услуга без счётчика или уже есть оплата"),
        (status = 403, description = "Доступ запрещён"),
        (status = 404, description = "Начисление не найдено")
    )
)]
pub async fn enter_reading(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<EnterReadingRequest>,
) -> AppResult<Json<ChargeResponse>> {
    let charge = charge_service::enter_reading(&state.pool, &auth_user, id, &payload).await?;

    let names = service_names(&state).await?;

    Ok(Json(to_response(charge, &names, Utc::now().date_naive())))
}
