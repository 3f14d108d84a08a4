use serde::Deserialize;

/// Body for the three tag-list update endpoints.
#[derive(Debug, Deserialize)]
pub struct UserDataRequest {
    pub user_data: Vec<String>,
}

/// Body for the user-type update endpoint.
#[derive(Debug, Deserialize)]
pub struct UserTypeRequest {
    pub user_type: String,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}
