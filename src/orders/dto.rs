use serde::Deserialize;

/// Body of `POST /products/{id}/order`. A client-sent `price` is ignored.
#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    #[serde(default)]
    pub quantity: serde_json::Value,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderInput {
    pub quantity: i32,
    pub phone: Option<String>,
}
