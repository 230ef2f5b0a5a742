use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Building {
    pub id: Uuid,
    pub address: String,
    pub floors: Option<i32>,
    pub apartments_count: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Apartment {
    pub id: Uuid,
    pub building_id: Uuid,
    pub number: String,
    pub floor: Option<i32>,
    pub area: Decimal,
    pub rooms: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Resident {
    pub id: Uuid,
    pub apartment_id: Uuid,
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_owner: bool,
    pub created_at: DateTime<Utc>,
}

// DTOs
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBuildingRequest {
    pub address: String,
    pub floors: Option<i32>,
    pub apartments_count: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateApartmentRequest {
    pub building_id: Uuid,
    pub number: String,
    pub floor: Option<i32>,
    pub area: Decimal,
    pub rooms: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateResidentRequest {
    pub apartment_id: Uuid,
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_owner: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApartmentResponse {
    pub id: Uuid,
    pub building_id: Uuid,
    pub building_address: Option<String>,
    pub number: String,
    pub floor: Option<i32>,
    pub area: Decimal,
    pub rooms: Option<i32>,
}
