use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{is_operator_or_higher, AppState, AuthUser};
use crate::models::{CreateTaskRequest, Task, TaskPriority};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks))
        .route("/", post(create_task))
        .route("/:id/complete", put(complete_task))
}

/// Задачи операторов, сначала приоритетные
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    tag = "tasks",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Задачи", body = Vec<Task>),
        (status = 403, description = "Доступ запрещён")
    )
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<Vec<Task>>> {
    if !is_operator_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let tasks = sqlx::query_as::<_, Task>(
        "SELECT * FROM tasks ORDER BY priority DESC, created_at DESC",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(tasks))
}

/// Создание задачи: назначается на создавшего оператора
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    tag = "tasks",
    security(("bearer_auth" = [])),
    request_body = CreateTaskRequest,
    responses(
        (status = 200, description = "Задача создана", body = Task),
        (status = 403, description = "Доступ запрещён"),
        (status = 422, description = "Ошибка валидации")
    )
)]
pub async fn create_task(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateTaskRequest>,
) -> AppResult<Json<Task>> {
    if !is_operator_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Заголовок обязателен".to_string()));
    }

    let task = sqlx::query_as::<_, Task>(
        r#"
        INSERT INTO tasks (title, description, priority, assigned_to, due_date)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(title)
    .bind(&payload.description)
    .bind(payload.priority.unwrap_or(TaskPriority::Medium))
    .bind(auth_user.user_id)
    .bind(payload.due_date)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(task))
}

/// Отметка задачи выполненной
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{id}/complete",
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "ID задачи")),
    responses(
        (status = 200, description = "Задача выполнена", body = Task),
        (status = 403, description = "Доступ запрещён"),
        (status = 404, description = "Задача не найдена")
    )
)]
pub async fn complete_task(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Task>> {
    if !is_operator_or_higher(&auth_user.role) {
        return Err(AppError::Forbidden);
    }

    let task = sqlx::query_as::<_, Task>(
        r#"
        UPDATE tasks
        SET status = 'completed', completed_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Задача не найдена".to_string()))?;

    Ok(Json(task))
}
