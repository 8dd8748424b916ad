use super::{course, student_profile};
use sea_orm::entity::prelude::*;

/// Participation state of one student in one course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(7))")]
pub enum EnrollmentStatus {
    #[sea_orm(string_value = "ongoing")]
    Ongoing,
    #[sea_orm(string_value = "pass")]
    Pass,
    #[sea_orm(string_value = "fail")]
    Fail,
}

impl EnrollmentStatus {
    /// Parses an admin-submitted status value. Surrounding whitespace is
    /// ignored and matching is case-insensitive; anything outside
    /// {ongoing, pass, fail} is rejected.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("ongoing") {
            Some(Self::Ongoing)
        } else if value.eq_ignore_ascii_case("pass") {
            Some(Self::Pass)
        } else if value.eq_ignore_ascii_case("fail") {
            Some(Self::Fail)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ongoing => "ongoing",
            Self::Pass => "pass",
            Self::Fail => "fail",
        }
    }
}

/// Join row between a student profile and a course.
/// Created only by the admission flow; never deleted except by cascade.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "enrollments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub student_id: i32,
    pub course_id: i32,
    /// Set at creation and immutable afterwards.
    pub enrollment_date: Date,
    pub status: EnrollmentStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student_profile::Entity",
        from = "Column::StudentId",
        to = "super::student_profile::Column::Id"
    )]
    StudentProfile,
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,
}

impl Related<student_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentProfile.def()
    }
}

impl Related<course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
