use crate::auth::current_user::AdminUser;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use model::entities::course;
use model::entities::prelude::Course;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Fixed page size for course listings.
const PAGE_SIZE: u64 = 10;

/// Request structure for creating a new course
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub department: String,
    #[validate(length(min = 1))]
    pub head_of_department: String,
    /// Target year of study
    #[validate(range(min = 1))]
    pub year: i32,
    #[validate(range(min = 1))]
    pub semester: i32,
    /// Initial enrolled-student counter; defaults to 0
    #[validate(range(min = 0))]
    pub enrolled_students: Option<i32>,
}

/// Request structure for updating an existing course.
/// Only the listed fields can be written; anything else is rejected.
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateCourseRequest {
    pub name: Option<String>,
    pub department: Option<String>,
    pub head_of_department: Option<String>,
    #[validate(range(min = 1))]
    pub year: Option<i32>,
    #[validate(range(min = 1))]
    pub semester: Option<i32>,
    /// Writing this directly can desynchronize the counter from the ledger
    #[validate(range(min = 0))]
    pub enrolled_students: Option<i32>,
}

/// Course response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CourseResponse {
    pub id: i32,
    pub name: String,
    pub department: String,
    pub head_of_department: String,
    pub year: i32,
    pub semester: i32,
    pub enrolled_students: i32,
}

impl From<course::Model> for CourseResponse {
    fn from(model: course::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            department: model.department,
            head_of_department: model.head_of_department,
            year: model.year,
            semester: model.semester,
            enrolled_students: model.enrolled_students,
        }
    }
}

/// One page of the course catalog
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CourseListResponse {
    pub courses: Vec<CourseResponse>,
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

/// Query parameters for the course listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct CourseListQuery {
    /// Case-insensitive substring matched against name, head of department
    /// and department
    pub search: Option<String>,
    /// 1-based page number
    pub page: Option<u64>,
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

fn course_not_found(course_id: i32) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Course with ID {} not found", course_id),
            code: "COURSE_NOT_FOUND".to_string(),
            success: false,
        }),
    )
}

/// List courses, optionally filtered by a search term
#[utoipa::path(
    get,
    path = "/api/v1/courses",
    tag = "courses",
    params(CourseListQuery),
    responses(
        (status = 200, description = "Courses retrieved successfully", body = ApiResponse<CourseListResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_courses(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<CourseListQuery>,
) -> Result<Json<ApiResponse<CourseListResponse>>, (StatusCode, Json<ErrorResponse>)> {
    let mut catalog = Course::find().order_by_asc(course::Column::Id);

    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        debug!("Searching courses for {:?}", search);
        let pattern = format!("%{}%", search.trim().to_lowercase());
        catalog = catalog.filter(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(course::Column::Name))).like(pattern.clone()))
                .add(
                    Expr::expr(Func::lower(Expr::col(course::Column::HeadOfDepartment)))
                        .like(pattern.clone()),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col(course::Column::Department)))
                        .like(pattern),
                ),
        );
    }

    let paginator = catalog.paginate(&state.db, PAGE_SIZE);
    let total_items = paginator.num_items().await.map_err(|e| {
        error!("Failed to count courses: {}", e);
        internal_error("listing courses")
    })?;
    let total_pages = paginator.num_pages().await.map_err(|e| {
        error!("Failed to count course pages: {}", e);
        internal_error("listing courses")
    })?;

    let page = query.page.unwrap_or(1).max(1);
    let courses = paginator.fetch_page(page - 1).await.map_err(|e| {
        error!("Failed to fetch course page {}: {}", page, e);
        internal_error("listing courses")
    })?;

    let response = ApiResponse {
        data: CourseListResponse {
            courses: courses.into_iter().map(CourseResponse::from).collect(),
            page,
            page_size: PAGE_SIZE,
            total_items,
            total_pages,
        },
        message: "Courses retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Create a new course
#[utoipa::path(
    post,
    path = "/api/v1/courses",
    tag = "courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created successfully", body = ApiResponse<CourseResponse>),
        (status = 400, description = "Invalid request data", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, request))]
pub async fn create_course(
    State(state): State<AppState>,
    _admin: AdminUser,
    Valid(Json(request)): Valid<Json<CreateCourseRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<CourseResponse>>), (StatusCode, Json<ErrorResponse>)> {
    debug!("Creating course with name: {}", request.name);

    let new_course = course::ActiveModel {
        name: Set(request.name),
        department: Set(request.department),
        head_of_department: Set(request.head_of_department),
        year: Set(request.year),
        semester: Set(request.semester),
        enrolled_students: Set(request.enrolled_students.unwrap_or(0)),
        ..Default::default()
    };

    match new_course.insert(&state.db).await {
        Ok(course_model) => {
            info!(
                "Course created successfully with ID: {}, name: {}",
                course_model.id, course_model.name
            );
            let response = ApiResponse {
                data: CourseResponse::from(course_model),
                message: "Course created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!("Failed to create course: {}", db_error);
            Err(internal_error("creating course"))
        }
    }
}

/// Get a specific course by ID
#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}",
    tag = "courses",
    params(
        ("course_id" = i32, Path, description = "Course ID"),
    ),
    responses(
        (status = 200, description = "Course retrieved successfully", body = ApiResponse<CourseResponse>),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_course(
    Path(course_id): Path<i32>,
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<CourseResponse>>, (StatusCode, Json<ErrorResponse>)> {
    match Course::find_by_id(course_id).one(&state.db).await {
        Ok(Some(course_model)) => {
            let response = ApiResponse {
                data: CourseResponse::from(course_model),
                message: "Course retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Ok(None) => {
            warn!("Course with ID {} not found", course_id);
            Err(course_not_found(course_id))
        }
        Err(db_error) => {
            error!("Failed to retrieve course {}: {}", course_id, db_error);
            Err(internal_error("loading course"))
        }
    }
}

/// Update a course
#[utoipa::path(
    put,
    path = "/api/v1/courses/{course_id}",
    tag = "courses",
    params(
        ("course_id" = i32, Path, description = "Course ID"),
    ),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated successfully", body = ApiResponse<CourseResponse>),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, request))]
pub async fn update_course(
    Path(course_id): Path<i32>,
    State(state): State<AppState>,
    _admin: AdminUser,
    Valid(Json(request)): Valid<Json<UpdateCourseRequest>>,
) -> Result<Json<ApiResponse<CourseResponse>>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Updating course with ID: {}", course_id);

    let existing = match Course::find_by_id(course_id).one(&state.db).await {
        Ok(Some(course_model)) => course_model,
        Ok(None) => {
            warn!("Course with ID {} not found for update", course_id);
            return Err(course_not_found(course_id));
        }
        Err(db_error) => {
            error!("Failed to look up course {}: {}", course_id, db_error);
            return Err(internal_error("updating course"));
        }
    };

    let mut course_active: course::ActiveModel = existing.into();
    if let Some(name) = request.name {
        course_active.name = Set(name);
    }
    if let Some(department) = request.department {
        course_active.department = Set(department);
    }
    if let Some(head_of_department) = request.head_of_department {
        course_active.head_of_department = Set(head_of_department);
    }
    if let Some(year) = request.year {
        course_active.year = Set(year);
    }
    if let Some(semester) = request.semester {
        course_active.semester = Set(semester);
    }
    if let Some(enrolled_students) = request.enrolled_students {
        warn!(
            "Admin overwrote enrolled counter of course {} to {}",
            course_id, enrolled_students
        );
        course_active.enrolled_students = Set(enrolled_students);
    }

    match course_active.update(&state.db).await {
        Ok(updated) => {
            info!("Course with ID {} updated successfully", course_id);
            let response = ApiResponse {
                data: CourseResponse::from(updated),
                message: "Course updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to update course {}: {}", course_id, db_error);
            Err(internal_error("updating course"))
        }
    }
}

/// Delete a course
#[utoipa::path(
    delete,
    path = "/api/v1/courses/{course_id}",
    tag = "courses",
    params(
        ("course_id" = i32, Path, description = "Course ID"),
    ),
    responses(
        (status = 200, description = "Course deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_course(
    Path(course_id): Path<i32>,
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<String>>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Attempting to delete course with ID: {}", course_id);

    // Ledger rows for the course go with it via the cascade.
    match Course::delete_by_id(course_id).exec(&state.db).await {
        Ok(delete_result) => {
            if delete_result.rows_affected > 0 {
                info!("Course with ID {} deleted successfully", course_id);
                let response = ApiResponse {
                    data: format!("Course {} deleted", course_id),
                    message: "Course deleted successfully".to_string(),
                    success: true,
                };
                Ok(Json(response))
            } else {
                warn!("Course with ID {} not found for deletion", course_id);
                Err(course_not_found(course_id))
            }
        }
        Err(db_error) => {
            error!("Failed to delete course {}: {}", course_id, db_error);
            Err(internal_error("deleting course"))
        }
    }
}
