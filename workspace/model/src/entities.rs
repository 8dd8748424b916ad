//! This file serves as the root for all SeaORM entity modules.
//! We define the data models for the student management application here:
//! login accounts, student profiles, the course catalog and the enrollment
//! ledger joining the two, plus password reset tokens.

pub mod account;
pub mod course;
pub mod enrollment;
pub mod reset_token;
pub mod student_profile;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::account::Entity as Account;
    pub use super::course::Entity as Course;
    pub use super::enrollment::Entity as Enrollment;
    pub use super::reset_token::Entity as ResetToken;
    pub use super::student_profile::Entity as StudentProfile;
}
