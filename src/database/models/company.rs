use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub num_employees: Option<i32>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
}

/// Row shape of the company listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CompanySummary {
    pub handle: String,
    pub name: String,
}

/// Insert payload for `companies`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    pub num_employees: Option<i32>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
}
