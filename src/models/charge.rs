use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "charge_status", rename_all = "snake_case")]
pub enum ChargeStatus {
    Pending,
    PartiallyPaid,
    Paid,
    Overdue,
}

impl Default for ChargeStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Начисление: одна услуга, одна квартира, один период (первое число месяца).
/// Создаётся только генератором, из дублей по (квартира, услуга, период)
/// выживает ровно одно.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Charge {
    pub id: Uuid,
    pub apartment_id: Uuid,
    pub service_id: Uuid,
    pub period: NaiveDate,
    pub amount: Decimal,
    pub total: Decimal,
    pub paid_amount: Decimal,
    pub status: ChargeStatus,
    pub is_paid: bool,
    pub due_date: NaiveDate,
    pub paid_at: Option<DateTime<Utc>>,
    pub last_payment_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// DTOs
#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateChargesRequest {
    pub month: u32,
    pub year: i32,
    pub service_ids: Vec<Uuid>,
    /// Если задан — начисления только по квартирам этого дома
    pub building_id: Option<Uuid>,
    /// Срок оплаты; по умолчанию 10-е число следующего месяца
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GenerateChargesResponse {
    pub created_count: u64,
    pub period: NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EnterReadingRequest {
    pub value: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChargeResponse {
    pub id: Uuid,
    pub apartment_id: Uuid,
    pub service_id: Uuid,
    pub service_name: Option<String>,
    pub period: NaiveDate,
    pub amount: Decimal,
    pub total: Decimal,
    pub paid_amount: Decimal,
    pub status: ChargeStatus,
    pub is_paid: bool,
    pub due_date: NaiveDate,
    pub days_overdue: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct DebtorRow {
    pub apartment_id: Uuid,
    pub apartment_number: String,
    pub building_address: String,
    pub debt: Decimal,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct ServiceSummaryRow {
    pub service_id: Uuid,
    pub service_name: String,
    pub total_charged: Decimal,
    pub total_paid: Decimal,
    pub outstanding: Decimal,
}
