//! Contact form pipeline: honeypot, validation, CAPTCHA, storage, delivery.
//!
//! Rate limiting happens in the HTTP layer because it is keyed by the client
//! address; everything after that lives here.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::repos::ContactRepo;
use crate::domain::{entities::ContactMessageRecord, locale::Locale};

const SUBMISSIONS_METRIC: &str = "meridian_contact_submissions_total";
const REJECTED_METRIC: &str = "meridian_contact_rejected_total";

const NAME_MAX: usize = 100;
const EMAIL_MAX: usize = 254;
const COMPANY_MAX: usize = 120;
const MESSAGE_MIN: usize = 10;
const MESSAGE_MAX: usize = 5000;

/// Raw form input as posted by the browser.
#[derive(Debug, Clone, Default)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub message: String,
    pub locale: Locale,
    pub honeypot: Option<String>,
    pub captcha_token: Option<String>,
    pub client_ip: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    Name,
    Email,
    Company,
    Message,
    Captcha,
}

impl ContactField {
    pub fn as_str(self) -> &'static str {
        match self {
            ContactField::Name => "name",
            ContactField::Email => "email",
            ContactField::Company => "company",
            ContactField::Message => "message",
            ContactField::Captcha => "captcha",
        }
    }
}

/// A rejected field together with the UI string key describing why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: ContactField,
    pub code: &'static str,
}

impl FieldError {
    fn new(field: ContactField, code: &'static str) -> Self {
        Self { field, code }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    Delivered,
    /// Stored for the admin inbox, email delivery failed or is not configured.
    Stored,
    /// Honeypot hit; reported as success to the sender.
    Discarded,
}

impl ContactOutcome {
    fn as_str(self) -> &'static str {
        match self {
            ContactOutcome::Delivered => "delivered",
            ContactOutcome::Stored => "stored",
            ContactOutcome::Discarded => "discarded",
        }
    }
}

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("contact submission has {} invalid field(s)", .0.len())]
    Invalid(Vec<FieldError>),
    #[error("captcha verification is unavailable")]
    CaptchaUnavailable,
    #[error("contact form has no storage or mail delivery configured")]
    NotConfigured,
    #[error("message could neither be stored nor delivered")]
    Undeliverable,
}

#[derive(Debug, Error)]
#[error("captcha verifier failed: {0}")]
pub struct CaptchaError(pub String);

#[derive(Debug, Error)]
#[error("mail delivery failed: {0}")]
pub struct MailError(pub String);

#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// `Ok(false)` means the provider rejected the token.
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<bool, CaptchaError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub subject: String,
    pub text: String,
    pub reply_to: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError>;
}

#[derive(Clone)]
pub struct ContactService {
    repo: Option<Arc<dyn ContactRepo>>,
    captcha: Option<Arc<dyn CaptchaVerifier>>,
    mailer: Option<Arc<dyn Mailer>>,
}

impl ContactService {
    pub fn new(
        repo: Option<Arc<dyn ContactRepo>>,
        captcha: Option<Arc<dyn CaptchaVerifier>>,
        mailer: Option<Arc<dyn Mailer>>,
    ) -> Self {
        Self {
            repo,
            captcha,
            mailer,
        }
    }

    /// True when at least one sink can receive messages.
    pub fn is_available(&self) -> bool {
        self.repo.is_some() || self.mailer.is_some()
    }

    pub fn captcha_enabled(&self) -> bool {
        self.captcha.is_some()
    }

    pub async fn submit(
        &self,
        submission: ContactSubmission,
    ) -> Result<ContactOutcome, ContactError> {
        if submission
            .honeypot
            .as_deref()
            .is_some_and(|value| !value.trim().is_empty())
        {
            counter!(REJECTED_METRIC, "reason" => "honeypot").increment(1);
            info!(target = "meridian::contact", "Discarded honeypot submission");
            return Ok(ContactOutcome::Discarded);
        }

        if !self.is_available() {
            return Err(ContactError::NotConfigured);
        }

        let errors = validate(&submission);
        if !errors.is_empty() {
            counter!(REJECTED_METRIC, "reason" => "validation").increment(1);
            return Err(ContactError::Invalid(errors));
        }

        self.check_captcha(&submission).await?;

        let record = ContactMessageRecord {
            id: Uuid::new_v4(),
            name: submission.name.trim().to_string(),
            email: submission.email.trim().to_string(),
            company: submission
                .company
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            message: submission.message.trim().to_string(),
            locale: submission.locale,
            client_ip: submission.client_ip.clone(),
            delivered: false,
            created_at: OffsetDateTime::now_utc(),
        };

        let stored = self.store(&record).await;
        let delivered = self.deliver(&record).await;

        if delivered
            && stored
            && let Some(repo) = self.repo.as_ref()
            && let Err(err) = repo.mark_delivered(record.id).await
        {
            warn!(
                target = "meridian::contact",
                message_id = %record.id,
                error = %err,
                "Failed to mark contact message as delivered"
            );
        }

        let outcome = match (stored, delivered) {
            (_, true) => ContactOutcome::Delivered,
            (true, false) => ContactOutcome::Stored,
            (false, false) => {
                counter!(REJECTED_METRIC, "reason" => "undeliverable").increment(1);
                return Err(ContactError::Undeliverable);
            }
        };

        counter!(SUBMISSIONS_METRIC, "outcome" => outcome.as_str()).increment(1);
        info!(
            target = "meridian::contact",
            message_id = %record.id,
            outcome = outcome.as_str(),
            "Contact message accepted"
        );
        Ok(outcome)
    }

    async fn check_captcha(&self, submission: &ContactSubmission) -> Result<(), ContactError> {
        let Some(verifier) = self.captcha.as_ref() else {
            return Ok(());
        };

        let token = submission
            .captcha_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty());
        let Some(token) = token else {
            counter!(REJECTED_METRIC, "reason" => "captcha").increment(1);
            return Err(ContactError::Invalid(vec![FieldError::new(
                ContactField::Captcha,
                "contact.error.captcha_missing",
            )]));
        };

        match verifier.verify(token, submission.client_ip.as_deref()).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                counter!(REJECTED_METRIC, "reason" => "captcha").increment(1);
                Err(ContactError::Invalid(vec![FieldError::new(
                    ContactField::Captcha,
                    "contact.error.captcha_failed",
                )]))
            }
            Err(err) => {
                warn!(target = "meridian::contact", error = %err, "Captcha verification failed");
                Err(ContactError::CaptchaUnavailable)
            }
        }
    }

    async fn store(&self, record: &ContactMessageRecord) -> bool {
        let Some(repo) = self.repo.as_ref() else {
            return false;
        };
        match repo.append_message(record.clone()).await {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    target = "meridian::contact",
                    message_id = %record.id,
                    error = %err,
                    "Failed to store contact message"
                );
                false
            }
        }
    }

    async fn deliver(&self, record: &ContactMessageRecord) -> bool {
        let Some(mailer) = self.mailer.as_ref() else {
            return false;
        };
        match mailer.send(&compose_email(record)).await {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    target = "meridian::contact",
                    message_id = %record.id,
                    error = %err,
                    "Failed to deliver contact message"
                );
                false
            }
        }
    }
}

fn compose_email(record: &ContactMessageRecord) -> OutboundEmail {
    let company = record.company.as_deref().unwrap_or("-");
    OutboundEmail {
        subject: format!("Contact form: {}", record.name),
        text: format!(
            "Name: {}\nEmail: {}\nCompany: {company}\nLanguage: {}\n\n{}\n",
            record.name, record.email, record.locale, record.message
        ),
        reply_to: record.email.clone(),
    }
}

/// Field checks on trimmed input. Returns every failure, in form order.
pub fn validate(submission: &ContactSubmission) -> Vec<FieldError> {
    let mut errors = Vec::new();

    let name = submission.name.trim();
    let name_len = name.chars().count();
    if name_len == 0 {
        errors.push(FieldError::new(ContactField::Name, "contact.error.name_required"));
    } else if name_len > NAME_MAX || name.chars().any(char::is_control) {
        errors.push(FieldError::new(ContactField::Name, "contact.error.name_invalid"));
    }

    let email = submission.email.trim();
    if email.is_empty() {
        errors.push(FieldError::new(ContactField::Email, "contact.error.email_required"));
    } else if !is_plausible_email(email) {
        errors.push(FieldError::new(ContactField::Email, "contact.error.email_invalid"));
    }

    if let Some(company) = submission.company.as_deref()
        && company.trim().chars().count() > COMPANY_MAX
    {
        errors.push(FieldError::new(ContactField::Company, "contact.error.company_too_long"));
    }

    let message_len = submission.message.trim().chars().count();
    if message_len < MESSAGE_MIN {
        errors.push(FieldError::new(ContactField::Message, "contact.error.message_too_short"));
    } else if message_len > MESSAGE_MAX {
        errors.push(FieldError::new(ContactField::Message, "contact.error.message_too_long"));
    }

    errors
}

fn is_plausible_email(email: &str) -> bool {
    if email.len() > EMAIL_MAX || email.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
        return false;
    }
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::application::repos::RepoError;

    #[derive(Default)]
    struct MemoryInbox {
        messages: Mutex<Vec<ContactMessageRecord>>,
        fail: bool,
    }

    #[async_trait]
    impl ContactRepo for MemoryInbox {
        async fn append_message(&self, record: ContactMessageRecord) -> Result<(), RepoError> {
            if self.fail {
                return Err(RepoError::Timeout);
            }
            self.messages.lock().expect("lock").push(record);
            Ok(())
        }

        async fn mark_delivered(&self, id: Uuid) -> Result<(), RepoError> {
            let mut messages = self.messages.lock().expect("lock");
            for message in messages.iter_mut().filter(|m| m.id == id) {
                message.delivered = true;
            }
            Ok(())
        }

        async fn list_recent(&self, _limit: u32) -> Result<Vec<ContactMessageRecord>, RepoError> {
            Ok(self.messages.lock().expect("lock").clone())
        }
    }

    #[derive(Default)]
    struct Outbox {
        sent: Mutex<Vec<OutboundEmail>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for Outbox {
        async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
            if self.fail {
                return Err(MailError("502".to_string()));
            }
            self.sent.lock().expect("lock").push(email.clone());
            Ok(())
        }
    }

    enum Captcha {
        Pass,
        Reject,
        Down,
    }

    #[async_trait]
    impl CaptchaVerifier for Captcha {
        async fn verify(&self, _token: &str, _ip: Option<&str>) -> Result<bool, CaptchaError> {
            match self {
                Captcha::Pass => Ok(true),
                Captcha::Reject => Ok(false),
                Captcha::Down => Err(CaptchaError("timeout".to_string())),
            }
        }
    }

    fn submission() -> ContactSubmission {
        ContactSubmission {
            name: "Aiko Tanaka".to_string(),
            email: "aiko@example.jp".to_string(),
            company: Some("  ".to_string()),
            message: "We would like a quote for a migration.".to_string(),
            locale: Locale::Ja,
            honeypot: None,
            captcha_token: Some("token".to_string()),
            client_ip: Some("203.0.113.7".to_string()),
        }
    }

    fn codes(err: ContactError) -> Vec<&'static str> {
        match err {
            ContactError::Invalid(errors) => errors.into_iter().map(|e| e.code).collect(),
            other => panic!("expected invalid, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stored_and_mailed_message_is_delivered() {
        let inbox = Arc::new(MemoryInbox::default());
        let outbox = Arc::new(Outbox::default());
        let service = ContactService::new(Some(inbox.clone()), None, Some(outbox.clone()));

        let outcome = service.submit(submission()).await.expect("submit");

        assert_eq!(outcome, ContactOutcome::Delivered);
        let stored = inbox.messages.lock().expect("lock").clone();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].delivered);
        assert_eq!(stored[0].company, None);
        let sent = outbox.sent.lock().expect("lock").clone();
        assert_eq!(sent[0].reply_to, "aiko@example.jp");
        assert!(sent[0].text.contains("Language: ja"));
    }

    #[tokio::test]
    async fn mail_failure_still_succeeds_when_stored() {
        let inbox = Arc::new(MemoryInbox::default());
        let outbox = Arc::new(Outbox {
            fail: true,
            ..Outbox::default()
        });
        let service = ContactService::new(Some(inbox.clone()), None, Some(outbox));

        let outcome = service.submit(submission()).await.expect("submit");

        assert_eq!(outcome, ContactOutcome::Stored);
        assert!(!inbox.messages.lock().expect("lock")[0].delivered);
    }

    #[tokio::test]
    async fn nothing_stored_or_sent_is_an_error() {
        let inbox = Arc::new(MemoryInbox {
            fail: true,
            ..MemoryInbox::default()
        });
        let service = ContactService::new(Some(inbox), None, None);

        let err = service.submit(submission()).await.expect_err("undeliverable");
        assert!(matches!(err, ContactError::Undeliverable));
    }

    #[tokio::test]
    async fn unconfigured_service_reports_not_configured() {
        let service = ContactService::new(None, None, None);
        assert!(!service.is_available());

        let err = service.submit(submission()).await.expect_err("unavailable");
        assert!(matches!(err, ContactError::NotConfigured));
    }

    #[tokio::test]
    async fn honeypot_is_discarded_without_storing() {
        let inbox = Arc::new(MemoryInbox::default());
        let service = ContactService::new(Some(inbox.clone()), None, None);
        let mut input = submission();
        input.honeypot = Some("http://spam.example".to_string());

        let outcome = service.submit(input).await.expect("submit");

        assert_eq!(outcome, ContactOutcome::Discarded);
        assert!(inbox.messages.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn captcha_rejection_and_outage_differ() {
        let inbox: Arc<dyn ContactRepo> = Arc::new(MemoryInbox::default());

        let missing = ContactService::new(Some(inbox.clone()), Some(Arc::new(Captcha::Pass)), None);
        let mut input = submission();
        input.captcha_token = Some(" ".to_string());
        assert_eq!(
            codes(missing.submit(input).await.expect_err("missing")),
            vec!["contact.error.captcha_missing"]
        );

        let rejected = ContactService::new(Some(inbox.clone()), Some(Arc::new(Captcha::Reject)), None);
        assert_eq!(
            codes(rejected.submit(submission()).await.expect_err("rejected")),
            vec!["contact.error.captcha_failed"]
        );

        let down = ContactService::new(Some(inbox), Some(Arc::new(Captcha::Down)), None);
        assert!(matches!(
            down.submit(submission()).await,
            Err(ContactError::CaptchaUnavailable)
        ));
    }

    #[test]
    fn validation_reports_each_field() {
        let input = ContactSubmission {
            name: "   ".to_string(),
            email: "no-at-sign".to_string(),
            company: Some("x".repeat(121)),
            message: "short".to_string(),
            ..ContactSubmission::default()
        };

        let fields: Vec<&str> = validate(&input).iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "email", "company", "message"]);
    }

    #[test]
    fn email_needs_local_part_and_dotted_domain() {
        assert!(is_plausible_email("a@b.co"));
        assert!(is_plausible_email("first.last+tag@mail.example.org"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("user@localhost"));
        assert!(!is_plausible_email("user@.com"));
        assert!(!is_plausible_email("user @example.com"));
        assert!(!is_plausible_email(&format!("{}@example.com", "a".repeat(250))));
    }

    #[test]
    fn length_limits_count_characters() {
        let mut input = submission();
        input.name = "名".repeat(100);
        input.message = "あ".repeat(10);
        assert!(validate(&input).is_empty());

        input.name = "名".repeat(101);
        input.message = "あ".repeat(5001);
        let codes: Vec<&str> = validate(&input).iter().map(|e| e.code).collect();
        assert_eq!(
            codes,
            vec!["contact.error.name_invalid", "contact.error.message_too_long"]
        );
    }
}
