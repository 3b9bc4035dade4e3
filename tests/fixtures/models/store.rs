use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Option<i64>,
    pub pet_id: i64,
    pub quantity: i32,
    pub ship_date: Option<String>,
    #[serde(default)]
    pub complete: bool,
    #[serde(skip)]
    pub audit_trail: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub code: i32,
    pub message: String,
}
