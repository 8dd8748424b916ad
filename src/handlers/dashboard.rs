use crate::auth::current_user::CurrentUser;
use crate::schemas::{ApiResponse, AppState, CachedData, ErrorResponse};
use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use model::entities::enrollment::EnrollmentStatus;
use model::entities::prelude::{Account, Course, Enrollment, StudentProfile};
use model::entities::{enrollment, student_profile};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

/// Catalog-wide aggregates shown to administrators
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminDashboard {
    pub first_name: String,
    pub today: String,
    pub course_count: u64,
    pub student_count: u64,
    pub hod_count: u64,
    pub department_count: u64,
}

/// Per-student aggregates shown on the home page
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentDashboard {
    pub first_name: String,
    pub today: String,
    pub branch: String,
    pub year_of_study: i32,
    pub semester: i32,
    pub ongoing_count: u64,
    pub pass_count: u64,
    pub fail_count: u64,
}

/// Either dashboard, depending on who asks
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum DashboardResponse {
    Admin(AdminDashboard),
    Student(StudentDashboard),
}

fn internal_error() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error while loading dashboard".to_string(),
            code: "DATABASE_ERROR".to_string(),
            success: false,
        }),
    )
}

/// Home dashboard: catalog aggregates for admins, course standings for students
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "dashboard",
    responses(
        (status = 200, description = "Dashboard retrieved successfully", body = ApiResponse<DashboardResponse>),
        (status = 404, description = "Profile not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<DashboardResponse>>, (StatusCode, Json<ErrorResponse>)> {
    let cache_key = format!("dashboard_{}", user.account_id);

    // Check cache first
    match state.cache.get(&cache_key).await {
        Some(CachedData::AdminDashboard(cached)) if user.is_superuser => {
            debug!("Serving admin dashboard from cache");
            return Ok(Json(ApiResponse {
                data: DashboardResponse::Admin(cached),
                message: "Dashboard retrieved from cache".to_string(),
                success: true,
            }));
        }
        Some(CachedData::StudentDashboard(cached)) if !user.is_superuser => {
            debug!("Serving student dashboard from cache");
            return Ok(Json(ApiResponse {
                data: DashboardResponse::Student(cached),
                message: "Dashboard retrieved from cache".to_string(),
                success: true,
            }));
        }
        _ => {}
    }

    let account_model = Account::find_by_id(user.account_id)
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to load account {}: {}", user.account_id, e);
            internal_error()
        })?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Account not found".to_string(),
                    code: "ACCOUNT_NOT_FOUND".to_string(),
                    success: false,
                }),
            )
        })?;

    let today = Utc::now().date_naive().to_string();

    let data = if account_model.is_superuser {
        // One catalog scan covers course, HOD and department counts
        let courses = Course::find().all(&state.db).await.map_err(|e| {
            error!("Failed to load courses: {}", e);
            internal_error()
        })?;

        let hods: HashSet<&str> = courses.iter().map(|c| c.head_of_department.as_str()).collect();
        let departments: HashSet<&str> = courses.iter().map(|c| c.department.as_str()).collect();

        let student_count = StudentProfile::find().count(&state.db).await.map_err(|e| {
            error!("Failed to count students: {}", e);
            internal_error()
        })?;

        let board = AdminDashboard {
            first_name: account_model.first_name,
            today,
            course_count: courses.len() as u64,
            student_count,
            hod_count: hods.len() as u64,
            department_count: departments.len() as u64,
        };

        state
            .cache
            .insert(cache_key, CachedData::AdminDashboard(board.clone()))
            .await;

        DashboardResponse::Admin(board)
    } else {
        let profile = StudentProfile::find()
            .filter(student_profile::Column::AccountId.eq(user.account_id))
            .one(&state.db)
            .await
            .map_err(|e| {
                error!("Failed to load profile for account {}: {}", user.account_id, e);
                internal_error()
            })?
            .ok_or_else(|| {
                (
                    StatusCode::NOT_FOUND,
                    Json(ErrorResponse {
                        error: "Student profile not found; complete your profile first".to_string(),
                        code: "PROFILE_NOT_FOUND".to_string(),
                        success: false,
                    }),
                )
            })?;

        let mut counts = [0u64; 3];
        for (slot, status) in [
            EnrollmentStatus::Ongoing,
            EnrollmentStatus::Pass,
            EnrollmentStatus::Fail,
        ]
        .into_iter()
        .enumerate()
        {
            counts[slot] = Enrollment::find()
                .filter(enrollment::Column::StudentId.eq(profile.id))
                .filter(enrollment::Column::Status.eq(status))
                .count(&state.db)
                .await
                .map_err(|e| {
                    error!("Failed to count enrollments: {}", e);
                    internal_error()
                })?;
        }

        let board = StudentDashboard {
            first_name: account_model.first_name,
            today,
            branch: profile.branch,
            year_of_study: profile.year_of_study,
            semester: profile.semester,
            ongoing_count: counts[0],
            pass_count: counts[1],
            fail_count: counts[2],
        };

        state
            .cache
            .insert(cache_key, CachedData::StudentDashboard(board.clone()))
            .await;

        DashboardResponse::Student(board)
    };

    Ok(Json(ApiResponse {
        data,
        message: "Dashboard retrieved successfully".to_string(),
        success: true,
    }))
}
