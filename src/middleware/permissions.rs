use crate::error::{AppError, AppResult};
use crate::models::UserRole;

/// Права доступа: единая таблица роль → право вместо разрозненных проверок
/// в обработчиках
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ManageUsers,
    ManageCatalogs,
    CalculatePayments,
    ManagePayments,
    CreateReports,
    PersonalAccount,
}

pub fn role_allows(role: &UserRole, permission: Permission) -> bool {
    match role {
        UserRole::Admin => true,
        UserRole::Operator => !matches!(
            permission,
            Permission::ManageUsers | Permission::PersonalAccount
        ),
        UserRole::Resident => matches!(permission, Permission::PersonalAccount),
    }
}

/// Проверка выполняется один раз в начале операции: при отказе операция
/// не выполняется даже частично
pub fn require(role: &UserRole, permission: Permission) -> AppResult<()> {
    if !role_allows(role, permission) {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_has_all_permissions() {
        for permission in [
            Permission::ManageUsers,
            Permission::ManageCatalogs,
            Permission::CalculatePayments,
            Permission::ManagePayments,
            Permission::CreateReports,
            Permission::PersonalAccount,
        ] {
            assert!(role_allows(&UserRole::Admin, permission));
        }
    }

    #[test]
    fn test_operator_permissions() {
        assert!(role_allows(&UserRole::Operator, Permission::ManageCatalogs));
        assert!(role_allows(
            &UserRole::Operator,
            Permission::CalculatePayments
        ));
        assert!(role_allows(&UserRole::Operator, Permission::ManagePayments));
        assert!(role_allows(&UserRole::Operator, Permission::CreateReports));
        assert!(!role_allows(&UserRole::Operator, Permission::ManageUsers));
        assert!(!role_allows(
            &UserRole::Operator,
            Permission::PersonalAccount
        ));
    }

    #[test]
    fn test_resident_permissions() {
        assert!(role_allows(
            &UserRole::Resident,
            Permission::PersonalAccount
        ));
        assert!(!role_allows(&UserRole::Resident, Permission::ManageUsers));
        assert!(!role_allows(&UserRole::Resident, Permission::ManageCatalogs));
        assert!(!role_allows(
            &UserRole::Resident,
            Permission::CalculatePayments
        ));
        assert!(!role_allows(&UserRole::Resident, Permission::ManagePayments));
        assert!(!role_allows(&UserRole::Resident, Permission::CreateReports));
    }

    #[test]
    fn test_require_rejects_without_permission() {
        assert!(require(&UserRole::Resident, Permission::ManagePayments).is_err());
        assert!(require(&UserRole::Admin, Permission::ManagePayments).is_ok());
    }
}
