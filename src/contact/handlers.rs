use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::{error, info, instrument};

use super::dto::{ContactPage, ContactRequest, ContactSent};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/contact", get(contact_page))
        .route("/contact/send", get(contact_page).post(send_contact))
}

pub async fn contact_page(State(state): State<AppState>) -> Json<ContactPage> {
    Json(ContactPage {
        email: state.config.mail.contact_to.clone(),
        fields: &["subject", "message", "sender_email"],
    })
}

#[instrument(skip(state, payload))]
pub async fn send_contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> AppResult<Json<ContactSent>> {
    let mail = payload.into_mail(&state.config.mail.contact_to)?;

    if let Err(e) = state.mailer.send(&mail).await {
        error!(error = ?e, reply_to = %mail.reply_to, "contact mail failed");
        return Err(AppError::MailFailed);
    }

    info!(reply_to = %mail.reply_to, subject = %mail.subject, "contact message sent");
    Ok(Json(ContactSent {
        status: "sent",
        message: "Thank you! Your message has been sent.",
    }))
}
