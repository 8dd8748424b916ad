use super::{account, course};
use sea_orm::entity::prelude::*;

/// The academic record attached to an account, created exactly once when the
/// student completes their profile after first login.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "student_profiles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Owning account; one profile per account.
    #[sea_orm(unique)]
    pub account_id: i32,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub contact: String,
    /// Kept as free text, the way the enrollment forms submit it.
    pub dob: String,
    /// Matched against `courses.department` at admission time.
    pub branch: String,
    pub year_of_study: i32,
    pub semester: i32,
    pub address: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id"
    )]
    Account,
    #[sea_orm(has_many = "super::enrollment::Entity")]
    Enrollment,
}

impl Related<account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollment.def()
    }
}

/// Many-to-many with courses through the enrollment ledger.
impl Related<course::Entity> for Entity {
    fn to() -> RelationDef {
        super::enrollment::Relation::Course.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::enrollment::Relation::StudentProfile.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
