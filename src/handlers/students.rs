use crate::auth::current_user::AdminUser;
use crate::handlers::profile::EnrolledCourseResponse;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use enroll::{apply_status_batch, EnrollError, StatusChange};
use model::entities::prelude::{Account, Course, Enrollment, StudentProfile};
use model::entities::{account, enrollment, student_profile};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// One row of the admin student listing: profile joined with its account
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StudentResponse {
    /// Student profile id
    pub id: i32,
    pub account_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_active: bool,
    pub branch: String,
    pub year_of_study: i32,
    pub semester: i32,
}

/// The full student listing plus its size
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StudentListResponse {
    pub students: Vec<StudentResponse>,
    pub count: usize,
}

/// Admin edit of a student. Every writable field is listed here explicitly;
/// unknown fields are rejected rather than silently applied.
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateStudentRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub is_active: Option<bool>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub contact: Option<String>,
    pub dob: Option<String>,
    pub branch: Option<String>,
    #[validate(range(min = 1))]
    pub year_of_study: Option<i32>,
    #[validate(range(min = 1))]
    pub semester: Option<i32>,
    pub address: Option<String>,
}

/// One requested status transition
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct StatusChangeRequest {
    pub course_id: i32,
    /// One of ongoing/pass/fail, case-insensitive
    pub status: String,
}

/// A batch of status transitions for one student; applied atomically
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateEnrollmentsRequest {
    pub changes: Vec<StatusChangeRequest>,
}

/// Result of a status batch: how many rows changed and the resulting ledger
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateEnrollmentsResponse {
    pub applied: usize,
    pub enrollments: Vec<EnrolledCourseResponse>,
}

fn internal_error(context: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("Internal server error while {context}"),
            code: "DATABASE_ERROR".to_string(),
            success: false,
        }),
    )
}

fn student_not_found(student_id: i32) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Student with ID {} not found", student_id),
            code: "STUDENT_NOT_FOUND".to_string(),
            success: false,
        }),
    )
}

fn student_row(profile: student_profile::Model, account: account::Model) -> StudentResponse {
    StudentResponse {
        id: profile.id,
        account_id: account.id,
        first_name: account.first_name,
        last_name: account.last_name,
        email: account.email,
        is_active: account.is_active,
        branch: profile.branch,
        year_of_study: profile.year_of_study,
        semester: profile.semester,
    }
}

async fn load_student_ledger(
    state: &AppState,
    student_id: i32,
) -> Result<Vec<EnrolledCourseResponse>, (StatusCode, Json<ErrorResponse>)> {
    let rows = Enrollment::find()
        .filter(enrollment::Column::StudentId.eq(student_id))
        .order_by_asc(enrollment::Column::CourseId)
        .find_also_related(Course)
        .all(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to load ledger for student {}: {}", student_id, e);
            internal_error("loading enrollments")
        })?;

    Ok(rows
        .into_iter()
        .filter_map(|(row, matched)| {
            matched.map(|matched| EnrolledCourseResponse {
                course_id: matched.id,
                name: matched.name,
                department: matched.department,
                head_of_department: matched.head_of_department,
                status: row.status.as_str().to_string(),
                enrollment_date: row.enrollment_date.to_string(),
            })
        })
        .collect())
}

/// List every student profile joined with its account
#[utoipa::path(
    get,
    path = "/api/v1/students",
    tag = "students",
    responses(
        (status = 200, description = "Students retrieved successfully", body = ApiResponse<StudentListResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_students(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<StudentListResponse>>, (StatusCode, Json<ErrorResponse>)> {
    let rows = StudentProfile::find()
        .order_by_asc(student_profile::Column::Id)
        .find_also_related(Account)
        .all(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to retrieve students: {}", e);
            internal_error("listing students")
        })?;

    let students: Vec<StudentResponse> = rows
        .into_iter()
        .filter_map(|(profile, account)| match account {
            Some(account) => Some(student_row(profile, account)),
            None => {
                warn!("Student profile {} has no account row", profile.id);
                None
            }
        })
        .collect();

    let count = students.len();
    debug!("Retrieved {} students", count);

    let response = ApiResponse {
        data: StudentListResponse { students, count },
        message: "Students retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Update a student's account and profile details
#[utoipa::path(
    put,
    path = "/api/v1/students/{student_id}",
    tag = "students",
    params(
        ("student_id" = i32, Path, description = "Student profile ID"),
    ),
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Student updated successfully", body = ApiResponse<StudentResponse>),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, request))]
pub async fn update_student(
    Path(student_id): Path<i32>,
    State(state): State<AppState>,
    _admin: AdminUser,
    Valid(Json(request)): Valid<Json<UpdateStudentRequest>>,
) -> Result<Json<ApiResponse<StudentResponse>>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Updating student with ID: {}", student_id);

    let profile = StudentProfile::find_by_id(student_id)
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to look up student {}: {}", student_id, e);
            internal_error("updating student")
        })?
        .ok_or_else(|| student_not_found(student_id))?;

    let account_model = Account::find_by_id(profile.account_id)
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to look up account {}: {}", profile.account_id, e);
            internal_error("updating student")
        })?
        .ok_or_else(|| student_not_found(student_id))?;

    let mut account_active: account::ActiveModel = account_model.into();
    if let Some(first_name) = request.first_name {
        account_active.first_name = Set(first_name);
    }
    if let Some(last_name) = request.last_name {
        account_active.last_name = Set(last_name);
    }
    if let Some(email) = request.email {
        account_active.email = Set(email);
    }
    if let Some(is_active) = request.is_active {
        account_active.is_active = Set(is_active);
    }

    let updated_account = account_active.update(&state.db).await.map_err(|db_error| {
        error!("Failed to update account for student {}: {}", student_id, db_error);
        if super::auth::is_unique_violation(&db_error) {
            (
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: "Email is already registered".to_string(),
                    code: "EMAIL_ALREADY_EXISTS".to_string(),
                    success: false,
                }),
            )
        } else {
            internal_error("updating student")
        }
    })?;

    let mut profile_active: student_profile::ActiveModel = profile.into();
    if let Some(father_name) = request.father_name {
        profile_active.father_name = Set(Some(father_name));
    }
    if let Some(mother_name) = request.mother_name {
        profile_active.mother_name = Set(Some(mother_name));
    }
    if let Some(contact) = request.contact {
        profile_active.contact = Set(contact);
    }
    if let Some(dob) = request.dob {
        profile_active.dob = Set(dob);
    }
    if let Some(branch) = request.branch {
        profile_active.branch = Set(branch);
    }
    if let Some(year_of_study) = request.year_of_study {
        profile_active.year_of_study = Set(year_of_study);
    }
    if let Some(semester) = request.semester {
        profile_active.semester = Set(semester);
    }
    if let Some(address) = request.address {
        profile_active.address = Set(address);
    }

    let updated_profile = profile_active.update(&state.db).await.map_err(|e| {
        error!("Failed to update profile for student {}: {}", student_id, e);
        internal_error("updating student")
    })?;

    info!("Student with ID {} updated successfully", student_id);

    let response = ApiResponse {
        data: student_row(updated_profile, updated_account),
        message: "Student updated successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Delete a student: the account goes, cascading the profile and the ledger
#[utoipa::path(
    delete,
    path = "/api/v1/students/{student_id}",
    tag = "students",
    params(
        ("student_id" = i32, Path, description = "Student profile ID"),
    ),
    responses(
        (status = 200, description = "Student deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_student(
    Path(student_id): Path<i32>,
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<String>>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Attempting to delete student with ID: {}", student_id);

    let profile = StudentProfile::find_by_id(student_id)
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to look up student {}: {}", student_id, e);
            internal_error("deleting student")
        })?
        .ok_or_else(|| student_not_found(student_id))?;

    // Deleting the account cascades to the profile and its ledger rows.
    Account::delete_by_id(profile.account_id)
        .exec(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to delete account {}: {}", profile.account_id, e);
            internal_error("deleting student")
        })?;

    info!("Student with ID {} deleted successfully", student_id);

    Ok(Json(ApiResponse {
        data: format!("Student {} deleted", student_id),
        message: "Student deleted successfully".to_string(),
        success: true,
    }))
}

/// List a student's enrollments with course detail
#[utoipa::path(
    get,
    path = "/api/v1/students/{student_id}/enrollments",
    tag = "students",
    params(
        ("student_id" = i32, Path, description = "Student profile ID"),
    ),
    responses(
        (status = 200, description = "Enrollments retrieved successfully", body = ApiResponse<Vec<EnrolledCourseResponse>>),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_student_enrollments(
    Path(student_id): Path<i32>,
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<Vec<EnrolledCourseResponse>>>, (StatusCode, Json<ErrorResponse>)> {
    let profile = StudentProfile::find_by_id(student_id)
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to look up student {}: {}", student_id, e);
            internal_error("loading enrollments")
        })?;
    if profile.is_none() {
        return Err(student_not_found(student_id));
    }

    let enrollments = load_student_ledger(&state, student_id).await?;

    Ok(Json(ApiResponse {
        data: enrollments,
        message: "Enrollments retrieved successfully".to_string(),
        success: true,
    }))
}

/// Apply a batch of enrollment status transitions for one student.
///
/// The batch is atomic: an invalid status or unknown course rejects the whole
/// submission and leaves every counter and status untouched.
#[utoipa::path(
    put,
    path = "/api/v1/students/{student_id}/enrollments",
    tag = "students",
    params(
        ("student_id" = i32, Path, description = "Student profile ID"),
    ),
    request_body = UpdateEnrollmentsRequest,
    responses(
        (status = 200, description = "Statuses updated successfully", body = ApiResponse<UpdateEnrollmentsResponse>),
        (status = 400, description = "Invalid status value", body = ErrorResponse),
        (status = 404, description = "Student or enrollment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, request))]
pub async fn update_student_enrollments(
    Path(student_id): Path<i32>,
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<UpdateEnrollmentsRequest>,
) -> Result<Json<ApiResponse<UpdateEnrollmentsResponse>>, (StatusCode, Json<ErrorResponse>)> {
    let profile = StudentProfile::find_by_id(student_id)
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to look up student {}: {}", student_id, e);
            internal_error("updating enrollments")
        })?;
    if profile.is_none() {
        return Err(student_not_found(student_id));
    }

    let changes: Vec<StatusChange> = request
        .changes
        .into_iter()
        .map(|change| StatusChange {
            course_id: change.course_id,
            status: change.status,
        })
        .collect();

    let applied = apply_status_batch(&state.db, student_id, &changes)
        .await
        .map_err(|e| match e {
            EnrollError::InvalidStatus(value) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("'{}' is not a valid status; use ongoing, pass or fail", value),
                    code: "INVALID_STATUS".to_string(),
                    success: false,
                }),
            ),
            EnrollError::EnrollmentNotFound {
                student_id,
                course_id,
            } => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!(
                        "Student {} has no enrollment for course {}",
                        student_id, course_id
                    ),
                    code: "ENROLLMENT_NOT_FOUND".to_string(),
                    success: false,
                }),
            ),
            EnrollError::CourseNotFound(course_id) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Course with ID {} not found", course_id),
                    code: "COURSE_NOT_FOUND".to_string(),
                    success: false,
                }),
            ),
            other => {
                error!("Status batch failed for student {}: {}", student_id, other);
                internal_error("updating enrollments")
            }
        })?;

    info!(
        "Applied {} status transitions for student {}",
        applied, student_id
    );

    let enrollments = load_student_ledger(&state, student_id).await?;

    Ok(Json(ApiResponse {
        data: UpdateEnrollmentsResponse {
            applied,
            enrollments,
        },
        message: "Successfully updated".to_string(),
        success: true,
    }))
}
