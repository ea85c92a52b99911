use super::dto::ContactRequest;
use super::mailer::OutboundMail;
use crate::auth::services::is_valid_email;
use crate::error::{AppResult, FieldErrors};

pub const MAX_SUBJECT_LEN: usize = 60;

impl ContactRequest {
    /// Builds the message for the operator; the visitor becomes the Reply-To.
    pub fn into_mail(self, operator: &str) -> AppResult<OutboundMail> {
        let mut errors = FieldErrors::new();

        let subject = self.subject.trim().to_string();
        if subject.is_empty() {
            errors.add("subject", "This field is required.");
        } else if subject.chars().count() > MAX_SUBJECT_LEN {
            errors.add(
                "subject",
                format!("Ensure this value has at most {MAX_SUBJECT_LEN} characters."),
            );
        }

        let message = self.message.trim().to_string();
        if message.is_empty() {
            errors.add("message", "This field is required.");
        }

        let sender = self.sender_email.trim().to_lowercase();
        if !is_valid_email(&sender) {
            errors.add("sender_email", "Enter a valid email address.");
        }

        errors.into_result()?;
        Ok(OutboundMail {
            to: operator.to_string(),
            body: format!("From: {sender}\n\n{message}"),
            reply_to: sender,
            subject,
        })
    }
}
