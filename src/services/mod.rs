pub mod company_service;
pub mod job_service;
pub mod query_params;
pub mod user_service;

pub use company_service::{CompanySearch, CompanyService};
pub use job_service::{JobSearch, JobService, DEFAULT_APPLICATION_STATE};
pub use user_service::UserService;
