use crate::auth::current_user::CurrentUser;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use enroll::{admit_student, EnrollError, NewStudentProfile};
use model::entities::enrollment::EnrollmentStatus;
use model::entities::prelude::{Account, Course, Enrollment, StudentProfile};
use model::entities::{account, enrollment, student_profile};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Request body for completing the student profile
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CompleteProfileRequest {
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    #[validate(length(min = 1))]
    pub contact: String,
    /// Date of birth as submitted; stored verbatim
    #[validate(length(min = 1))]
    pub dob: String,
    #[validate(length(min = 1))]
    pub branch: String,
    #[validate(range(min = 1))]
    pub year_of_study: i32,
    #[validate(range(min = 1))]
    pub semester: i32,
    #[validate(length(min = 1))]
    pub address: String,
}

/// Self-service edit of account and profile details. Branch, year of study,
/// date of birth and semester stay admin-only.
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateMyProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
}

/// Student profile response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub id: i32,
    pub account_id: i32,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub contact: String,
    pub dob: String,
    pub branch: String,
    pub year_of_study: i32,
    pub semester: i32,
    pub address: String,
}

impl From<student_profile::Model> for ProfileResponse {
    fn from(model: student_profile::Model) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            father_name: model.father_name,
            mother_name: model.mother_name,
            contact: model.contact,
            dob: model.dob,
            branch: model.branch,
            year_of_study: model.year_of_study,
            semester: model.semester,
            address: model.address,
        }
    }
}

/// One course on a student's ledger
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EnrolledCourseResponse {
    pub course_id: i32,
    pub name: String,
    pub department: String,
    pub head_of_department: String,
    pub status: String,
    pub enrollment_date: String,
}

/// Result of completing a profile: the profile plus the automatic enrollments
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CompleteProfileResponse {
    pub profile: ProfileResponse,
    pub enrollments: Vec<EnrolledCourseResponse>,
}

/// Combined account + profile projection for the profile page
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MyProfileResponse {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_joined: String,
    pub student: Option<ProfileResponse>,
}

/// Query parameters for the my-courses listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct MyCoursesQuery {
    /// Filter by enrollment status (ongoing/pass/fail); omitted means all
    pub status: Option<String>,
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

fn profile_not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Student profile not found; complete your profile first".to_string(),
            code: "PROFILE_NOT_FOUND".to_string(),
            success: false,
        }),
    )
}

async fn load_profile(
    state: &AppState,
    account_id: i32,
) -> Result<Option<student_profile::Model>, (StatusCode, Json<ErrorResponse>)> {
    StudentProfile::find()
        .filter(student_profile::Column::AccountId.eq(account_id))
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to load profile for account {}: {}", account_id, e);
            internal_error("loading profile")
        })
}

/// Complete the student profile and auto-enroll into matching courses
#[utoipa::path(
    post,
    path = "/api/v1/me/profile",
    tag = "profile",
    request_body = CompleteProfileRequest,
    responses(
        (status = 201, description = "Profile created and student enrolled", body = ApiResponse<CompleteProfileResponse>),
        (status = 403, description = "Superusers do not have student profiles", body = ErrorResponse),
        (status = 409, description = "Profile already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, request))]
pub async fn complete_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Valid(Json(request)): Valid<Json<CompleteProfileRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<CompleteProfileResponse>>), (StatusCode, Json<ErrorResponse>)>
{
    if user.is_superuser {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "Administrators do not have student profiles".to_string(),
                code: "FORBIDDEN".to_string(),
                success: false,
            }),
        ));
    }

    let new_profile = NewStudentProfile {
        account_id: user.account_id,
        father_name: request.father_name,
        mother_name: request.mother_name,
        contact: request.contact,
        dob: request.dob,
        branch: request.branch,
        year_of_study: request.year_of_study,
        semester: request.semester,
        address: request.address,
    };

    let (profile, enrollments) = admit_student(&state.db, new_profile).await.map_err(|e| match e {
        EnrollError::ProfileAlreadyExists(account_id) => {
            warn!("Account {} already has a profile", account_id);
            (
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: "Profile has already been completed".to_string(),
                    code: "PROFILE_ALREADY_EXISTS".to_string(),
                    success: false,
                }),
            )
        }
        other => {
            error!("Admission failed for account {}: {}", user.account_id, other);
            internal_error("completing profile")
        }
    })?;

    // Resolve course details for the response
    let mut enrolled = Vec::with_capacity(enrollments.len());
    for row in enrollments {
        let matched = Course::find_by_id(row.course_id)
            .one(&state.db)
            .await
            .map_err(|e| {
                error!("Failed to load course {}: {}", row.course_id, e);
                internal_error("completing profile")
            })?;
        if let Some(matched) = matched {
            enrolled.push(EnrolledCourseResponse {
                course_id: matched.id,
                name: matched.name,
                department: matched.department,
                head_of_department: matched.head_of_department,
                status: row.status.as_str().to_string(),
                enrollment_date: row.enrollment_date.to_string(),
            });
        }
    }

    info!(
        "Profile completed for account {} with {} enrollments",
        user.account_id,
        enrolled.len()
    );

    let response = ApiResponse {
        data: CompleteProfileResponse {
            profile: ProfileResponse::from(profile),
            enrollments: enrolled,
        },
        message: "Profile completed successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get the profile of the logged-in account
#[utoipa::path(
    get,
    path = "/api/v1/me/profile",
    tag = "profile",
    responses(
        (status = 200, description = "Profile retrieved successfully", body = ApiResponse<MyProfileResponse>),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<MyProfileResponse>>, (StatusCode, Json<ErrorResponse>)> {
    let account_model = Account::find_by_id(user.account_id)
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to load account {}: {}", user.account_id, e);
            internal_error("loading profile")
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

    let profile = load_profile(&state, user.account_id).await?;

    let response = ApiResponse {
        data: MyProfileResponse {
            first_name: account_model.first_name,
            last_name: account_model.last_name,
            email: account_model.email,
            date_joined: account_model.date_joined.date_naive().to_string(),
            student: profile.map(ProfileResponse::from),
        },
        message: "Profile retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Update the logged-in student's own details
#[utoipa::path(
    put,
    path = "/api/v1/me/profile",
    tag = "profile",
    request_body = UpdateMyProfileRequest,
    responses(
        (status = 200, description = "Profile updated successfully", body = ApiResponse<MyProfileResponse>),
        (status = 404, description = "Profile not found", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, request))]
pub async fn update_my_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Valid(Json(request)): Valid<Json<UpdateMyProfileRequest>>,
) -> Result<Json<ApiResponse<MyProfileResponse>>, (StatusCode, Json<ErrorResponse>)> {
    let account_model = Account::find_by_id(user.account_id)
        .one(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to load account {}: {}", user.account_id, e);
            internal_error("updating profile")
        })?
        .ok_or_else(profile_not_found)?;

    let profile = load_profile(&state, user.account_id)
        .await?
        .ok_or_else(profile_not_found)?;

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

    let updated_account = account_active.update(&state.db).await.map_err(|db_error| {
        error!(
            "Failed to update account {}: {}",
            user.account_id, db_error
        );
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
            internal_error("updating profile")
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
    if let Some(address) = request.address {
        profile_active.address = Set(address);
    }

    let updated_profile = profile_active.update(&state.db).await.map_err(|e| {
        error!("Failed to update profile: {}", e);
        internal_error("updating profile")
    })?;

    info!("Account {} updated their profile", user.account_id);

    let response = ApiResponse {
        data: MyProfileResponse {
            first_name: updated_account.first_name,
            last_name: updated_account.last_name,
            email: updated_account.email,
            date_joined: updated_account.date_joined.date_naive().to_string(),
            student: Some(ProfileResponse::from(updated_profile)),
        },
        message: "Changes made successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// List the logged-in student's courses, optionally filtered by status
#[utoipa::path(
    get,
    path = "/api/v1/me/courses",
    tag = "profile",
    params(MyCoursesQuery),
    responses(
        (status = 200, description = "Courses retrieved successfully", body = ApiResponse<Vec<EnrolledCourseResponse>>),
        (status = 400, description = "Invalid status filter", body = ErrorResponse),
        (status = 404, description = "Profile not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn my_courses(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<MyCoursesQuery>,
) -> Result<Json<ApiResponse<Vec<EnrolledCourseResponse>>>, (StatusCode, Json<ErrorResponse>)> {
    let profile = load_profile(&state, user.account_id)
        .await?
        .ok_or_else(profile_not_found)?;

    // "all" (or no filter at all) lists everything
    let status_filter = match query.status.as_deref() {
        None => None,
        Some(value) if value.trim().eq_ignore_ascii_case("all") => None,
        Some(value) => match EnrollmentStatus::parse(value) {
            Some(status) => Some(status),
            None => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("'{}' is not a valid enrollment status", value),
                        code: "INVALID_STATUS".to_string(),
                        success: false,
                    }),
                ));
            }
        },
    };

    let mut ledger_query = Enrollment::find().filter(enrollment::Column::StudentId.eq(profile.id));
    if let Some(status) = status_filter {
        ledger_query = ledger_query.filter(enrollment::Column::Status.eq(status));
    }

    let rows = ledger_query
        .find_also_related(Course)
        .all(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to load courses for profile {}: {}", profile.id, e);
            internal_error("loading courses")
        })?;

    let courses: Vec<EnrolledCourseResponse> = rows
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
        .collect();

    let response = ApiResponse {
        data: courses,
        message: "Courses retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}
