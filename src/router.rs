use crate::handlers::{
    auth::{change_password, forgot_password, login, logout, register, reset_password},
    courses::{create_course, delete_course, get_course, list_courses, update_course},
    dashboard::dashboard,
    health::health_check,
    profile::{complete_profile, get_my_profile, my_courses, update_my_profile},
    students::{
        delete_student, list_student_enrollments, list_students, update_student,
        update_student_enrollments,
    },
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Registration, login and password management
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/logout", post(logout))
        .route("/api/v1/auth/forgot-password", post(forgot_password))
        .route("/api/v1/auth/reset-password", post(reset_password))
        .route("/api/v1/auth/change-password", post(change_password))
        // Student self-service
        .route("/api/v1/me/profile", post(complete_profile))
        .route("/api/v1/me/profile", get(get_my_profile))
        .route("/api/v1/me/profile", put(update_my_profile))
        .route("/api/v1/me/courses", get(my_courses))
        .route("/api/v1/dashboard", get(dashboard))
        // Student administration
        .route("/api/v1/students", get(list_students))
        .route("/api/v1/students/:student_id", put(update_student))
        .route("/api/v1/students/:student_id", delete(delete_student))
        .route(
            "/api/v1/students/:student_id/enrollments",
            get(list_student_enrollments),
        )
        .route(
            "/api/v1/students/:student_id/enrollments",
            put(update_student_enrollments),
        )
        // Course catalog administration
        .route("/api/v1/courses", get(list_courses))
        .route("/api/v1/courses", post(create_course))
        .route("/api/v1/courses/:course_id", get(get_course))
        .route("/api/v1/courses/:course_id", put(update_course))
        .route("/api/v1/courses/:course_id", delete(delete_course))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
