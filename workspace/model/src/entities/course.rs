use super::student_profile;
use sea_orm::entity::prelude::*;

/// A catalog offering tied to a (department, year, semester) triple.
///
/// `enrolled_students` is denormalized: it must equal the number of enrollment
/// rows for this course with status `ongoing`. Every status write updates it in
/// the same transaction (see the `enroll` crate).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub department: String,
    pub head_of_department: String,
    /// Target year of study.
    #[sea_orm(default_value = "1")]
    pub year: i32,
    #[sea_orm(default_value = "1")]
    pub semester: i32,
    pub enrolled_students: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::enrollment::Entity")]
    Enrollment,
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollment.def()
    }
}

/// Many-to-many with student profiles through the enrollment ledger.
impl Related<student_profile::Entity> for Entity {
    fn to() -> RelationDef {
        super::enrollment::Relation::StudentProfile.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::enrollment::Relation::Course.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
