use sea_orm::entity::prelude::*;

/// A login identity: email plus credential hash.
/// Superuser accounts administer the catalog; everyone else is a student
/// and gets a [`super::student_profile`] row once they complete their profile.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    /// Doubles as the login handle.
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2 PHC string; never a plaintext password.
    pub password_hash: String,
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
    #[sea_orm(default_value = "false")]
    pub is_superuser: bool,
    pub date_joined: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// At most one profile per account.
    #[sea_orm(has_one = "super::student_profile::Entity")]
    StudentProfile,
    #[sea_orm(has_many = "super::reset_token::Entity")]
    ResetToken,
}

impl Related<super::student_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentProfile.def()
    }
}

impl Related<super::reset_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResetToken.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
