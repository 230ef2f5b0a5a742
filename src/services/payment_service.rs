use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{require, AuthUser, Permission};
use crate::models::{
    ApplyPaymentRequest, Charge, ChargeStatus, CreatePaymentRequest, Payment, PaymentMethod,
    PaymentStatus,
};

/// Статус начисления после изменения оплаченной суммы.
///
/// Проверка полной оплаты идёт первой: только что полностью оплаченное
/// начисление не может стать просроченным
pub fn resolve_status(
    paid: Decimal,
    total: Decimal,
    due_date: NaiveDate,
    today: NaiveDate,
) -> ChargeStatus {
    if paid >= total {
        ChargeStatus::Paid
    } else if due_date < today {
        ChargeStatus::Overdue
    } else if paid > Decimal::ZERO {
        ChargeStatus::PartiallyPaid
    } else {
        ChargeStatus::Pending
    }
}

/// Дней просрочки: расчётное значение для чтения, не хранимое состояние
pub fn days_overdue(due_date: NaiveDate, is_paid: bool, today: NaiveDate) -> i64 {
    if is_paid {
        return 0;
    }
    (today - due_date).num_days().max(0)
}

/// Прямое создание платежа: запись в журнал без изменения начислений
pub async fn create_payment(
    pool: &PgPool,
    caller: &AuthUser,
    req: &CreatePaymentRequest,
) -> AppResult<Payment> {
    require(&caller.role, Permission::ManagePayments)?;

    if req.amount <= Decimal::ZERO {
        return Err(AppError::Validation(
            "Сумма платежа должна быть больше нуля".to_string(),
        ));
    }

    let apartment_exists: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM apartments WHERE id = $1")
            .bind(req.apartment_id)
            .fetch_optional(pool)
            .await?;

    if apartment_exists.is_none() {
        return Err(AppError::NotFound("Квартира не найдена".to_string()));
    }

    let payment = sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments (apartment_id, amount, method, status, description, created_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(req.apartment_id)
    .bind(req.amount)
    .bind(req.method.unwrap_or(PaymentMethod::BankTransfer))
    .bind(req.status.unwrap_or(PaymentStatus::Completed))
    .bind(&req.description)
    .bind(caller.user_id)
    .fetch_one(pool)
    .await?;

    Ok(payment)
}

/// Проведение платежа по начислению: увеличивает оплаченную сумму,
/// ставит дату последнего платежа и пересчитывает статус. Платёж и
/// обновление начисления записываются в одной транзакции
pub async fn apply_to_charge(
    pool: &PgPool,
    caller: &AuthUser,
    charge_id: Uuid,
    req: &ApplyPaymentRequest,
) -> AppResult<(Charge, Payment)> {
    require(&caller.role, Permission::ManagePayments)?;

    if req.amount <= Decimal::ZERO {
        return Err(AppError::Validation(
            "Сумма платежа должна быть больше нуля".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let charge = sqlx::query_as::<_, Charge>("SELECT * FROM charges WHERE id = $1 FOR UPDATE")
        .bind(charge_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Начисление не найдено".to_string()))?;

    if charge.is_paid {
        return Err(AppError::BadRequest(
            "Начисление уже оплачено".to_string(),
        ));
    }

    let now = Utc::now();
    let new_paid = charge.paid_amount + req.amount;
    let status = resolve_status(new_paid, charge.total, charge.due_date, now.date_naive());
    let is_paid = status == ChargeStatus::Paid;

    let payment = sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments (apartment_id, charge_id, amount, method, status, description, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(charge.apartment_id)
    .bind(charge.id)
    .bind(req.amount)
    .bind(req.method.unwrap_or(PaymentMethod::BankTransfer))
    .bind(PaymentStatus::Completed)
    .bind(&req.description)
    .bind(caller.user_id)
    .fetch_one(&mut *tx)
    .await?;

    let updated = sqlx::query_as::<_, Charge>(
        r#"
        UPDATE charges
        SET paid_amount = $2,
            status = $3,
            is_paid = $4,
            paid_at = CASE WHEN $4 THEN $5 ELSE paid_at END,
            last_payment_at = $5
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(charge.id)
    .bind(new_paid)
    .bind(status)
    .bind(is_paid)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((updated, payment))
}

/// Оплата жильцом собственного начисления целиком. Чужое начисление
/// не раскрывается: запрос по нему завершается как "не найдено",
/// платёж при этом не создаётся
pub async fn pay_own_charge(
    pool: &PgPool,
    caller: &AuthUser,
    charge_id: Uuid,
) -> AppResult<(Charge, Payment)> {
    require(&caller.role, Permission::PersonalAccount)?;

    let apartment_id = caller.apartment_id.ok_or(AppError::Forbidden)?;

    let mut tx = pool.begin().await?;

    let charge = sqlx::query_as::<_, Charge>(
        "SELECT * FROM charges WHERE id = $1 AND apartment_id = $2 FOR UPDATE",
    )
    .bind(charge_id)
    .bind(apartment_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Начисление не найдено".to_string()))?;

    if charge.is_paid {
        return Err(AppError::BadRequest(
            "Начисление уже оплачено".to_string(),
        ));
    }

    let now = Utc::now();
    let remaining = charge.total - charge.paid_amount;

    let payment = sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments (apartment_id, charge_id, amount, method, status, description, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(charge.apartment_id)
    .bind(charge.id)
    .bind(remaining)
    .bind(PaymentMethod::Card)
    .bind(PaymentStatus::Completed)
    .bind(format!("Оплата начисления за {}", charge.period.format("%m.%Y")))
    .bind(caller.user_id)
    .fetch_one(&mut *tx)
    .await?;

    let updated = sqlx::query_as::<_, Charge>(
        r#"
        UPDATE charges
        SET paid_amount = total,
            status = 'paid',
            is_paid = TRUE,
            paid_at = $2,
            last_payment_at = $2
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(charge.id)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((updated, payment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_partial_payment_status() {
        // Платёж 500 по начислению 1518 → частично оплачено
        let status = resolve_status(
            Decimal::from(500),
            Decimal::new(151800, 2),
            date(2024, 4, 10),
            date(2024, 4, 1),
        );
        assert_eq!(status, ChargeStatus::PartiallyPaid);
    }

    #[test]
    fn test_full_payment_status() {
        // Второй платёж 1018 доводит оплату до 1518 → оплачено
        let status = resolve_status(
            Decimal::from(500) + Decimal::from(1018),
            Decimal::new(151800, 2),
            date(2024, 4, 10),
            date(2024, 4, 1),
        );
        assert_eq!(status, ChargeStatus::Paid);
    }

    #[test]
    fn test_overpayment_is_still_paid() {
        let status = resolve_status(
            Decimal::from(2000),
            Decimal::new(151800, 2),
            date(2024, 4, 10),
            date(2024, 4, 1),
        );
        assert_eq!(status, ChargeStatus::Paid);
    }

    #[test]
    fn test_full_payment_after_due_date_is_not_overdue() {
        // Полная оплата после срока: просрочка не ставится
        let status = resolve_status(
            Decimal::from(1518),
            Decimal::from(1518),
            date(2024, 4, 10),
            date(2024, 5, 20),
        );
        assert_eq!(status, ChargeStatus::Paid);
    }

    #[test]
    fn test_overdue_wins_over_partial_after_due_date() {
        let status = resolve_status(
            Decimal::from(500),
            Decimal::from(1518),
            date(2024, 4, 10),
            date(2024, 5, 20),
        );
        assert_eq!(status, ChargeStatus::Overdue);
    }

    #[test]
    fn test_untouched_charge_is_pending() {
        let status = resolve_status(
            Decimal::ZERO,
            Decimal::from(1518),
            date(2024, 4, 10),
            date(2024, 4, 1),
        );
        assert_eq!(status, ChargeStatus::Pending);
    }

    #[test]
    fn test_days_overdue_for_unpaid_past_due() {
        assert_eq!(days_overdue(date(2024, 4, 10), false, date(2024, 4, 25)), 15);
    }

    #[test]
    fn test_days_overdue_is_zero_when_paid() {
        assert_eq!(days_overdue(date(2024, 4, 10), true, date(2024, 4, 25)), 0);
    }

    #[test]
    fn test_days_overdue_is_zero_before_due_date() {
        assert_eq!(days_overdue(date(2024, 4, 10), false, date(2024, 4, 1)), 0);
    }
}
