use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{require, AuthUser, Permission};
use crate::models::{Apartment, Charge, EnterReadingRequest, GenerateChargesRequest, Service};
use crate::utils::validators::validate_period;

/// День месяца, следующего за расчётным, до которого начисление должно
/// быть оплачено
const DUE_DAY: u32 = 10;

/// Количество и сумма начисления по одной услуге для одной квартиры.
/// Услуга по счётчику ждёт показаний, по нормативу — тариф умножается
/// на площадь
pub fn charge_quantity(is_counter: bool, area: Decimal, rate: Decimal) -> (Decimal, Decimal) {
    if is_counter {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        let total = (area * rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        (area, total)
    }
}

pub fn default_due_date(period: NaiveDate) -> NaiveDate {
    let (year, month) = if period.month() == 12 {
        (period.year() + 1, 1)
    } else {
        (period.year(), period.month() + 1)
    };
    // DUE_DAY всегда корректен для любого месяца
    NaiveDate::from_ymd_opt(year, month, DUE_DAY).unwrap_or(period)
}

/// Генерация начислений за период: по одному начислению на пару
/// (квартира, услуга), ещё не выставленную за этот период.
///
/// Весь пакет выполняется в одной транзакции: при ошибке не остаётся
/// частично созданных начислений. Уже существующие начисления молча
/// пропускаются и не входят в счётчик созданных, поэтому повторный
/// запуск за тот же период ничего не добавляет.
pub async fn generate_charges(
    pool: &PgPool,
    caller: &AuthUser,
    req: &GenerateChargesRequest,
) -> AppResult<u64> {
    require(&caller.role, Permission::CalculatePayments)?;

    if !validate_period(req.month, req.year) {
        return Err(AppError::Validation(format!(
            "Некорректный период: {:02}.{}",
            req.month, req.year
        )));
    }

    if req.service_ids.is_empty() {
        return Err(AppError::Validation(
            "Выберите хотя бы одну услугу".to_string(),
        ));
    }

    let period = NaiveDate::from_ymd_opt(req.year, req.month, 1)
        .ok_or_else(|| AppError::Validation("Некорректная дата периода".to_string()))?;
    let due_date = req.due_date.unwrap_or_else(|| default_due_date(period));

    let services = sqlx::query_as::<_, Service>(
        "SELECT * FROM services WHERE id = ANY($1) AND is_active = true",
    )
    .bind(&req.service_ids)
    .fetch_all(pool)
    .await?;

    if services.is_empty() {
        return Err(AppError::Validation(
            "Активные услуги по заданным идентификаторам не найдены".to_string(),
        ));
    }

    let apartments = match req.building_id {
        Some(building_id) => {
            sqlx::query_as::<_, Apartment>("SELECT * FROM apartments WHERE building_id = $1")
                .bind(building_id)
                .fetch_all(pool)
                .await?
        }
        None => {
            sqlx::query_as::<_, Apartment>("SELECT * FROM apartments")
                .fetch_all(pool)
                .await?
        }
    };

    let mut tx = pool.begin().await?;
    let mut created: u64 = 0;

    for apartment in &apartments {
        for service in &services {
            let (amount, total) = charge_quantity(service.is_counter, apartment.area, service.rate);

            // Уникальный индекс по (apartment_id, service_id, period) защищает
            // и от повторного запуска, и от гонки двух параллельных генераций
            let result = sqlx::query(
                r#"
                INSERT INTO charges (apartment_id, service_id, period, amount, total, due_date)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (apartment_id, service_id, period) DO NOTHING
                "#,
            )
            .bind(apartment.id)
            .bind(service.id)
            .bind(period)
            .bind(amount)
            .bind(total)
            .bind(due_date)
            .execute(&mut *tx)
            .await?;

            created += result.rows_affected();
        }
    }

    tx.commit().await?;

    tracing::info!(
        "Generated {} charges for period {:02}.{}",
        created,
        req.month,
        req.year
    );

    Ok(created)
}

/// Внесение показаний счётчика в начисление по услуге со счётчиком:
/// количество и сумма пересчитываются по тарифу услуги
pub async fn enter_reading(
    pool: &PgPool,
    caller: &AuthUser,
    charge_id: Uuid,
    req: &EnterReadingRequest,
) -> AppResult<Charge> {
    require(&caller.role, Permission::CalculatePayments)?;

    if req.value <= Decimal::ZERO {
        return Err(AppError::Validation(
            "Показание должно быть больше нуля".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let charge = sqlx::query_as::<_, Charge>("SELECT * FROM charges WHERE id = $1 FOR UPDATE")
        .bind(charge_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Начисление не найдено".to_string()))?;

    let service = sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = $1")
        .bind(charge.service_id)
        .fetch_one(&mut *tx)
        .await?;

    if !service.is_counter {
        return Err(AppError::BadRequest(
            "Услуга рассчитывается по площади, показания не требуются".to_string(),
        ));
    }

    if charge.is_paid || charge.paid_amount > Decimal::ZERO {
        return Err(AppError::BadRequest(
            "По начислению уже есть оплата, показания изменить нельзя".to_string(),
        ));
    }

    let total =
        (req.value * service.rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    let updated = sqlx::query_as::<_, Charge>(
        r#"
        UPDATE charges
        SET amount = $2, total = $3
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(charge_id)
    .bind(req.value)
    .bind(total)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_rate_quantity_is_area_times_rate() {
        // Квартира 60 м², тариф 25.30 → 1518.00
        let area = Decimal::from(60);
        let rate = Decimal::new(2530, 2);

        let (amount, total) = charge_quantity(false, area, rate);

        assert_eq!(amount, area);
        assert_eq!(total, Decimal::new(151800, 2));
    }

    #[test]
    fn test_counter_service_starts_at_zero() {
        let (amount, total) = charge_quantity(true, Decimal::from(60), Decimal::new(2530, 2));

        assert_eq!(amount, Decimal::ZERO);
        assert_eq!(total, Decimal::ZERO);
    }

    #[test]
    fn test_total_is_rounded_to_two_decimals() {
        // 33.33 * 10.101 = 336.66633 → 336.67
        let (_, total) = charge_quantity(false, Decimal::new(3333, 2), Decimal::new(10101, 3));

        assert_eq!(total, Decimal::new(33667, 2));
    }

    #[test]
    fn test_default_due_date_is_next_month() {
        let period = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            default_due_date(period),
            NaiveDate::from_ymd_opt(2024, 4, 10).unwrap()
        );
    }

    #[test]
    fn test_default_due_date_rolls_over_year() {
        let period = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        assert_eq!(
            default_due_date(period),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
        );
    }
}
