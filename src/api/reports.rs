use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_admin, is_operator_or_higher, require, AppState, AuthUser, Permission};
use crate::models::{CreateReportRequest, Report, ReportType};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reports))
        .route("/", post(create_report))
        .route("/:id", delete(delete_report))
}

/// Список отчётов. Жильцу видны общие и финансовые отчёты
/// и отчёты, созданные им самим
#[utoipa::path(
    get,
    path = "/api/v1/reports",
    tag = "reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Отчёты", body = Vec<Report>),
        (status = 401, description = "Не авторизован")
    )
)]
pub async fn list_reports(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Vec<Report>>> {
    let reports = if is_operator_or_higher(&auth_user.role) {
        sqlx::query_as::<_, Report>("SELECT * FROM reports ORDER BY created_at DESC")
            .fetch_all(&state.pool)
            .await?
    } else {
        sqlx::query_as::<_, Report>(
            r#"
            SELECT * FROM reports
            WHERE report_type IN ('general', 'financial') OR created_by = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(auth_user.user_id)
        .fetch_all(&state.pool)
        .await?
    };

    Ok(Json(reports))
}

/// Создание отчёта
#[utoipa::path(
    post,
    path = "/api/v1/reports",
    tag = "reports",
    security(("bearer_auth" = [])),
    request_body = CreateReportRequest,
    responses(
        (status = 200, description = "Отчёт создан", body = Report),
        (status = 403, description = "Доступ запрещён"),
        (status = 422, description = "Ошибка валидации")
    )
)]
pub async fn create_report(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateReportRequest>,
) -> AppResult<Json<Report>> {
    require(&auth_user.role, Permission::CreateReports)?;

    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Заголовок обязателен".to_string()));
    }

    let period = match &payload.period {
        Some(raw) => Some(parse_period(raw)?),
        None => None,
    };

    let report = sqlx::query_as::<_, Report>(
        r#"
        INSERT INTO reports (title, content, report_type, period, created_by)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(title)
    .bind(&payload.content)
    .bind(payload.report_type.unwrap_or(ReportType::General))
    .bind(period)
    .bind(auth_user.user_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(report))
}

/// Удаление отчёта
#[utoipa::path(
    delete,
    path = "/api/v1/reports/{id}",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID отчёта")),
    responses(
        (status = 200, description = "Отчёт удалён"),
        (status = 403, description = "Доступ запрещён"),
        (status = 404, description = "Отчёт не найден")
    )
)]
pub async fn delete_report(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    if !is_admin(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let result = sqlx::query("DELETE FROM reports WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Отчёт не найден".to_string()));
    }

    Ok(Json(json!({ "success": true })))
}

/// Период отчёта в формате YYYY-MM → первое число месяца
fn parse_period(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Период должен быть в формате YYYY-MM".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_period() {
        assert_eq!(
            parse_period("2024-03").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(parse_period("март 2024").is_err());
        assert!(parse_period("2024-13").is_err());
    }
}
