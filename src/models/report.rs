use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "report_type", rename_all = "snake_case")]
pub enum ReportType {
    General,
    Financial,
    Technical,
    Analysis,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Report {
    pub id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub report_type: ReportType,
    pub period: Option<NaiveDate>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReportRequest {
    pub title: String,
    pub content: Option<String>,
    pub report_type: Option<ReportType>,
    /// Период отчёта в формате YYYY-MM
    pub period: Option<String>,
}
