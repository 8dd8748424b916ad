use model::entities::enrollment::EnrollmentStatus;
use model::entities::prelude::{Course, Enrollment};
use model::entities::{course, enrollment};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::{debug, info, instrument, warn};

use crate::error::{EnrollError, Result};

/// One requested transition, as submitted by the admin form.
/// The status arrives as raw text and is validated here.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub course_id: i32,
    pub status: String,
}

/// Counter adjustment for a status transition.
///
/// The stored `enrolled_students` counter tracks ledger rows whose status is
/// `ongoing`, so only crossing the ongoing boundary moves it: leaving
/// `ongoing` decrements, entering it increments, and pass/fail moves between
/// themselves leave it alone.
pub fn counter_delta(from: EnrollmentStatus, to: EnrollmentStatus) -> i32 {
    match (
        from == EnrollmentStatus::Ongoing,
        to == EnrollmentStatus::Ongoing,
    ) {
        (true, false) => -1,
        (false, true) => 1,
        _ => 0,
    }
}

/// Applies a batch of status transitions for one student.
///
/// The batch is atomic: every submitted value is validated before anything is
/// written, all transitions then apply inside a single transaction, and any
/// failure (unknown status, missing ledger row) rolls the whole batch back.
/// A value equal to the current status is a no-op and does not touch the
/// course counter. Returns the number of rows actually changed.
#[instrument(skip(db, changes), fields(num_changes = changes.len()))]
pub async fn apply_status_batch(
    db: &DatabaseConnection,
    student_id: i32,
    changes: &[StatusChange],
) -> Result<usize> {
    // Reject the whole batch before touching the database.
    let mut parsed = Vec::with_capacity(changes.len());
    for change in changes {
        match EnrollmentStatus::parse(&change.status) {
            Some(status) => parsed.push((change.course_id, status)),
            None => {
                warn!(
                    "Rejecting status batch for student {}: invalid value {:?}",
                    student_id, change.status
                );
                return Err(EnrollError::InvalidStatus(change.status.clone()));
            }
        }
    }

    let txn = db.begin().await?;
    let mut applied = 0;

    for (course_id, new_status) in parsed {
        let row = Enrollment::find()
            .filter(enrollment::Column::StudentId.eq(student_id))
            .filter(enrollment::Column::CourseId.eq(course_id))
            .one(&txn)
            .await?
            .ok_or(EnrollError::EnrollmentNotFound {
                student_id,
                course_id,
            })?;

        if row.status == new_status {
            debug!(
                "Enrollment {} already has status {}; skipping",
                row.id,
                new_status.as_str()
            );
            continue;
        }

        let delta = counter_delta(row.status, new_status);

        let mut ledger: enrollment::ActiveModel = row.into();
        ledger.status = Set(new_status);
        ledger.update(&txn).await?;

        if delta != 0 {
            let matched = Course::find_by_id(course_id)
                .one(&txn)
                .await?
                .ok_or(EnrollError::CourseNotFound(course_id))?;
            let enrolled = matched.enrolled_students + delta;
            let mut counter: course::ActiveModel = matched.into();
            counter.enrolled_students = Set(enrolled);
            counter.update(&txn).await?;
        }

        applied += 1;
    }

    txn.commit().await?;

    info!(
        "Applied {} status transitions for student {}",
        applied, student_id
    );

    Ok(applied)
}
