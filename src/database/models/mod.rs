pub mod application;
pub mod company;
pub mod job;
pub mod user;

pub use application::{Application, UserJob};
pub use company::{Company, CompanySummary, NewCompany};
pub use job::{Job, JobSummary, JobWithCompany, NewJob};
pub use user::{NewUser, PublicUser, User, UserDetail, UserSummary};
