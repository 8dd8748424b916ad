use chrono::Utc;
use model::entities::enrollment::EnrollmentStatus;
use model::entities::prelude::{Course, StudentProfile};
use model::entities::{course, enrollment, student_profile};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::{debug, info, instrument};

use crate::error::{EnrollError, Result};

/// Profile fields collected by the complete-profile form.
#[derive(Debug, Clone)]
pub struct NewStudentProfile {
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

/// Creates the student profile and enrolls it in every course whose
/// (department, year, semester) matches the profile's (branch, year of study,
/// semester). This is the only pathway that creates enrollment rows.
///
/// Everything happens in one transaction: the profile insert, one `ongoing`
/// ledger row per matching course, and each matched course's counter bump.
/// Zero matching courses is not an error; the student simply starts with an
/// empty ledger.
#[instrument(skip(db, profile), fields(account_id = profile.account_id))]
pub async fn admit_student(
    db: &DatabaseConnection,
    profile: NewStudentProfile,
) -> Result<(student_profile::Model, Vec<enrollment::Model>)> {
    let txn = db.begin().await?;

    // A profile is created exactly once per account.
    let existing = StudentProfile::find()
        .filter(student_profile::Column::AccountId.eq(profile.account_id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(EnrollError::ProfileAlreadyExists(profile.account_id));
    }

    let created = student_profile::ActiveModel {
        account_id: Set(profile.account_id),
        father_name: Set(profile.father_name),
        mother_name: Set(profile.mother_name),
        contact: Set(profile.contact),
        dob: Set(profile.dob),
        branch: Set(profile.branch.clone()),
        year_of_study: Set(profile.year_of_study),
        semester: Set(profile.semester),
        address: Set(profile.address),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let matching_courses = Course::find()
        .filter(course::Column::Department.eq(profile.branch))
        .filter(course::Column::Year.eq(profile.year_of_study))
        .filter(course::Column::Semester.eq(profile.semester))
        .all(&txn)
        .await?;

    debug!(
        "Found {} matching courses for profile {}",
        matching_courses.len(),
        created.id
    );

    let today = Utc::now().date_naive();
    let mut enrollments = Vec::with_capacity(matching_courses.len());

    for matched in matching_courses {
        let row = enrollment::ActiveModel {
            student_id: Set(created.id),
            course_id: Set(matched.id),
            enrollment_date: Set(today),
            status: Set(EnrollmentStatus::Ongoing),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let enrolled = matched.enrolled_students + 1;
        let mut counter: course::ActiveModel = matched.into();
        counter.enrolled_students = Set(enrolled);
        counter.update(&txn).await?;

        enrollments.push(row);
    }

    txn.commit().await?;

    info!(
        "Admitted student profile {} with {} enrollments",
        created.id,
        enrollments.len()
    );

    Ok((created, enrollments))
}
