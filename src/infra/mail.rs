//! Contact delivery through a Resend-compatible HTTP email API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;

use crate::application::contact::{MailError, Mailer, OutboundEmail};
use crate::infra::error::InfraError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
    reply_to: &'a str,
}

#[derive(Clone)]
pub struct HttpMailer {
    client: Client,
    endpoint: Url,
    api_key: String,
    sender: String,
    recipient: String,
}

impl HttpMailer {
    pub fn new(
        endpoint: Url,
        api_key: String,
        sender: String,
        recipient: String,
    ) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(concat!("meridian/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            api_key,
            sender,
            recipient,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        let body = SendEmailRequest {
            from: &self.sender,
            to: [&self.recipient],
            subject: &email.subject,
            text: &email.text,
            reply_to: &email.reply_to,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| MailError(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(MailError(format!("status {status} body {text}")));
        }
        Ok(())
    }
}
