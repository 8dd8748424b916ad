use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::handlers::dashboard::{AdminDashboard, StudentDashboard};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Cache for dashboard aggregates
    pub cache: Cache<String, CachedData>,
    /// Signing key for session tokens
    pub secret_key: String,
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    AdminDashboard(AdminDashboard),
    StudentDashboard(StudentDashboard),
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::auth::forgot_password,
        crate::handlers::auth::reset_password,
        crate::handlers::auth::change_password,
        crate::handlers::profile::complete_profile,
        crate::handlers::profile::get_my_profile,
        crate::handlers::profile::update_my_profile,
        crate::handlers::profile::my_courses,
        crate::handlers::dashboard::dashboard,
        crate::handlers::students::list_students,
        crate::handlers::students::update_student,
        crate::handlers::students::delete_student,
        crate::handlers::students::list_student_enrollments,
        crate::handlers::students::update_student_enrollments,
        crate::handlers::courses::list_courses,
        crate::handlers::courses::create_course,
        crate::handlers::courses::get_course,
        crate::handlers::courses::update_course,
        crate::handlers::courses::delete_course,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            crate::handlers::auth::RegisterRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::LoginResponse,
            crate::handlers::auth::ForgotPasswordRequest,
            crate::handlers::auth::ForgotPasswordResponse,
            crate::handlers::auth::ResetPasswordRequest,
            crate::handlers::auth::ChangePasswordRequest,
            crate::handlers::auth::AccountResponse,
            crate::handlers::profile::CompleteProfileRequest,
            crate::handlers::profile::UpdateMyProfileRequest,
            crate::handlers::profile::ProfileResponse,
            crate::handlers::profile::CompleteProfileResponse,
            crate::handlers::profile::MyProfileResponse,
            crate::handlers::profile::EnrolledCourseResponse,
            crate::handlers::dashboard::AdminDashboard,
            crate::handlers::dashboard::StudentDashboard,
            crate::handlers::students::StudentResponse,
            crate::handlers::students::StudentListResponse,
            crate::handlers::students::UpdateStudentRequest,
            crate::handlers::students::StatusChangeRequest,
            crate::handlers::students::UpdateEnrollmentsRequest,
            crate::handlers::students::UpdateEnrollmentsResponse,
            crate::handlers::courses::CreateCourseRequest,
            crate::handlers::courses::UpdateCourseRequest,
            crate::handlers::courses::CourseResponse,
            crate::handlers::courses::CourseListResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration, login and password management"),
        (name = "profile", description = "Student self-service profile and courses"),
        (name = "dashboard", description = "Home dashboard aggregates"),
        (name = "students", description = "Student administration"),
        (name = "courses", description = "Course catalog administration"),
    ),
    info(
        title = "Registra API",
        description = "Student Management API - registration, profiles, course catalog and enrollment tracking",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
