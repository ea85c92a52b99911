use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub subject: String,
    pub message: String,
    pub sender_email: String,
}

#[derive(Debug, Serialize)]
pub struct ContactPage {
    pub email: String,
    pub fields: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct ContactSent {
    pub status: &'static str,
    pub message: &'static str,
}
