use thiserror::Error;

/// Error types for the enrollment module
#[derive(Error, Debug)]
pub enum EnrollError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// An admin-submitted status value outside {ongoing, pass, fail}
    #[error("'{0}' is not a valid enrollment status")]
    InvalidStatus(String),

    /// The (student, course) pair has no ledger row
    #[error("student {student_id} has no enrollment for course {course_id}")]
    EnrollmentNotFound { student_id: i32, course_id: i32 },

    /// Referenced course does not exist
    #[error("course {0} not found")]
    CourseNotFound(i32),

    /// The account already completed its profile
    #[error("account {0} already has a student profile")]
    ProfileAlreadyExists(i32),
}

/// Type alias for Result with EnrollError
pub type Result<T> = std::result::Result<T, EnrollError>;
