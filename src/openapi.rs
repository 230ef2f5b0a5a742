use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ZHKH API",
        version = "1.0.0",
        description = "Backend API для ЖКХ - платформы учёта коммунальных начислений и платежей",
        contact(
            name = "ZHKH Team"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    tags(
        (name = "auth", description = "Аутентификация и авторизация"),
        (name = "admin", description = "Администрирование: пользователи и статистика"),
        (name = "catalogs", description = "Справочники: дома, квартиры, жильцы, услуги"),
        (name = "charges", description = "Начисления: генерация, показания, должники"),
        (name = "payments", description = "Платежи и оплата начислений"),
        (name = "reports", description = "Отчёты"),
        (name = "tasks", description = "Задачи операторов")
    ),
    paths(
        // Auth
        crate::api::auth::login,
        crate::api::auth::refresh_token,
        crate::api::auth::get_me,
        // Admin
        crate::api::admin::get_dashboard,
        crate::api::admin::list_users,
        crate::api::admin::create_user,
        crate::api::admin::update_user,
        crate::api::admin::delete_user,
        // Buildings
        crate::api::buildings::list_buildings,
        crate::api::buildings::create_building,
        crate::api::buildings::delete_building,
        crate::api::buildings::list_building_apartments,
        // Apartments
        crate::api::apartments::list_apartments,
        crate::api::apartments::create_apartment,
        crate::api::apartments::get_my_apartment,
        crate::api::apartments::delete_apartment,
        crate::api::apartments::list_residents,
        crate::api::apartments::create_resident,
        // Services
        crate::api::services::list_services,
        crate::api::services::create_service,
        crate::api::services::update_service,
        // Charges
        crate::api::charges::list_charges,
        crate::api::charges::generate_charges,
        crate::api::charges::list_debtors,
        crate::api::charges::list_overdue,
        crate::api::charges::get_summary,
        crate::api::charges::get_charge,
        crate::api::charges::enter_reading,
        // Payments
        crate::api::payments::list_payments,
        crate::api::payments::create_payment,
        crate::api::payments::apply_payment,
        crate::api::payments::pay_own_charge,
        crate::api::payments::get_payment,
        crate::api::payments::update_payment,
        crate::api::payments::delete_payment,
        // Reports
        crate::api::reports::list_reports,
        crate::api::reports::create_report,
        crate::api::reports::delete_report,
        // Tasks
        crate::api::tasks::list_tasks,
        crate::api::tasks::create_task,
        crate::api::tasks::complete_task,
    ),
    components(
        schemas(
            // Auth
            crate::models::LoginRequest,
            crate::models::AuthResponse,
            crate::models::RefreshTokenRequest,
            crate::models::TokenResponse,
            crate::models::UserPublic,
            crate::models::UserRole,
            crate::models::CreateUserRequest,
            crate::models::UpdateUserRequest,
            // Catalogs
            crate::models::Building,
            crate::models::CreateBuildingRequest,
            crate::models::Apartment,
            crate::models::ApartmentResponse,
            crate::models::CreateApartmentRequest,
            crate::models::Resident,
            crate::models::CreateResidentRequest,
            crate::models::Service,
            crate::models::CreateServiceRequest,
            crate::models::UpdateServiceRequest,
            // Charges
            crate::models::ChargeStatus,
            crate::models::Charge,
            crate::models::ChargeResponse,
            crate::models::GenerateChargesRequest,
            crate::models::GenerateChargesResponse,
            crate::models::EnterReadingRequest,
            crate::models::DebtorRow,
            crate::models::ServiceSummaryRow,
            // Payments
            crate::models::PaymentStatus,
            crate::models::PaymentMethod,
            crate::models::Payment,
            crate::models::PaymentResponse,
            crate::models::CreatePaymentRequest,
            crate::models::ApplyPaymentRequest,
            crate::models::UpdatePaymentRequest,
            crate::api::payments::AppliedPaymentResponse,
            // Reports
            crate::models::ReportType,
            crate::models::Report,
            crate::models::CreateReportRequest,
            // Tasks
            crate::models::TaskPriority,
            crate::models::TaskStatus,
            crate::models::Task,
            crate::models::CreateTaskRequest,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}
