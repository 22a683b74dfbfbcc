pub mod auth;
pub mod response;

pub use auth::{
    extract_token, guard_middleware, path_param, Decision, Guard, GuardChain, GuardState,
    RequestContext, ResourceKeyExtractor, TOKEN_FIELD,
};
pub use response::{ApiResponse, ApiResult};
