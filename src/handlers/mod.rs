// Route handlers, one module per resource. Access control is attached per
// route in `app`, so handlers only see requests that already passed it.
pub mod companies;
pub mod health;
pub mod jobs;
pub mod login;
pub mod users;
pub mod validation;

pub use validation::{Validate, ValidatedJson};
