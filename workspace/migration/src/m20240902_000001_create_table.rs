use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create accounts table
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(pk_auto(Accounts::Id))
                    .col(string(Accounts::FirstName))
                    .col(string(Accounts::LastName))
                    .col(string(Accounts::Email).unique_key())
                    .col(string(Accounts::PasswordHash))
                    .col(boolean(Accounts::IsActive).default(true))
                    .col(boolean(Accounts::IsSuperuser).default(false))
                    .col(timestamp_with_time_zone(Accounts::DateJoined))
                    .to_owned(),
            )
            .await?;

        // Create student_profiles table (one row per account)
        manager
            .create_table(
                Table::create()
                    .table(StudentProfiles::Table)
                    .if_not_exists()
                    .col(pk_auto(StudentProfiles::Id))
                    .col(integer(StudentProfiles::AccountId).unique_key())
                    .col(string_null(StudentProfiles::FatherName))
                    .col(string_null(StudentProfiles::MotherName))
                    .col(string(StudentProfiles::Contact))
                    .col(string(StudentProfiles::Dob))
                    .col(string(StudentProfiles::Branch))
                    .col(integer(StudentProfiles::YearOfStudy))
                    .col(integer(StudentProfiles::Semester))
                    .col(string(StudentProfiles::Address))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_student_profile_account")
                            .from(StudentProfiles::Table, StudentProfiles::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create courses table
        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(pk_auto(Courses::Id))
                    .col(string(Courses::Name))
                    .col(string(Courses::Department))
                    .col(string(Courses::HeadOfDepartment))
                    .col(integer(Courses::Year).default(1))
                    .col(integer(Courses::Semester).default(1))
                    .col(integer(Courses::EnrolledStudents))
                    .to_owned(),
            )
            .await?;

        // Create enrollments table (ledger joining students and courses)
        manager
            .create_table(
                Table::create()
                    .table(Enrollments::Table)
                    .if_not_exists()
                    .col(pk_auto(Enrollments::Id))
                    .col(integer(Enrollments::StudentId))
                    .col(integer(Enrollments::CourseId))
                    .col(date(Enrollments::EnrollmentDate))
                    .col(string_len(Enrollments::Status, 7))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollment_student")
                            .from(Enrollments::Table, Enrollments::StudentId)
                            .to(StudentProfiles::Table, StudentProfiles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollment_course")
                            .from(Enrollments::Table, Enrollments::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One ledger row per (student, course) pair
        manager
            .create_index(
                Index::create()
                    .name("idx_enrollment_student_course")
                    .table(Enrollments::Table)
                    .col(Enrollments::StudentId)
                    .col(Enrollments::CourseId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create reset_tokens table
        manager
            .create_table(
                Table::create()
                    .table(ResetTokens::Table)
                    .if_not_exists()
                    .col(pk_auto(ResetTokens::Id))
                    .col(integer(ResetTokens::AccountId))
                    .col(string(ResetTokens::TokenHash))
                    .col(timestamp_with_time_zone(ResetTokens::CreatedAt))
                    .col(timestamp_with_time_zone(ResetTokens::ExpiresAt))
                    .col(timestamp_with_time_zone_null(ResetTokens::UsedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reset_token_account")
                            .from(ResetTokens::Table, ResetTokens::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ResetTokens::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Enrollments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StudentProfiles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
    FirstName,
    LastName,
    Email,
    PasswordHash,
    IsActive,
    IsSuperuser,
    DateJoined,
}

#[derive(DeriveIden)]
enum StudentProfiles {
    Table,
    Id,
    AccountId,
    FatherName,
    MotherName,
    Contact,
    Dob,
    Branch,
    YearOfStudy,
    Semester,
    Address,
}

#[derive(DeriveIden)]
enum Courses {
    Table,
    Id,
    Name,
    Department,
    HeadOfDepartment,
    Year,
    Semester,
    EnrolledStudents,
}

#[derive(DeriveIden)]
enum Enrollments {
    Table,
    Id,
    StudentId,
    CourseId,
    EnrollmentDate,
    Status,
}

#[derive(DeriveIden)]
enum ResetTokens {
    Table,
    Id,
    AccountId,
    TokenHash,
    CreatedAt,
    ExpiresAt,
    UsedAt,
}
