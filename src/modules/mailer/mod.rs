//! Templated SMTP notifications.
//!
//! Sending is strictly best-effort: callers log a failed send and carry on,
//! it never rolls back or fails the mutation that triggered it.

mod templates;

use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use minijinja::{context, Environment};
use thiserror::Error;

use crate::core::config::SmtpConfig;
use crate::modules::metrics;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Invalid SMTP configuration: {0}")]
    Config(String),

    #[error("Invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("Failed to render template '{0}': {1}")]
    Template(&'static str, minijinja::Error),

    #[error("SMTP send failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Clone, Copy)]
pub enum MailTemplate {
    Welcome,
    FileUploaded,
}

impl MailTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            MailTemplate::Welcome => "welcome",
            MailTemplate::FileUploaded => "file_uploaded",
        }
    }

    fn subject(&self) -> &'static str {
        match self {
            MailTemplate::Welcome => "Welcome to Filedock!",
            MailTemplate::FileUploaded => "File Upload Confirmation",
        }
    }
}

pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    env: Environment<'static>,
}

impl Mailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailerError> {
        let transport = match (&config.username, &config.password) {
            (Some(user), Some(pass)) => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                    .map_err(|e| MailerError::Config(e.to_string()))?
                    .port(config.port)
                    .credentials(Credentials::new(user.clone(), pass.clone()))
                    .build()
            }
            // No credentials: plain connection, e.g. a local relay
            _ => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .port(config.port)
                .build(),
        };

        let mut env = Environment::new();
        env.add_template("welcome", templates::WELCOME)
            .map_err(|e| MailerError::Template("welcome", e))?;
        env.add_template("file_uploaded", templates::FILE_UPLOADED)
            .map_err(|e| MailerError::Template("file_uploaded", e))?;

        Ok(Self {
            transport,
            from: format!("Filedock <{}>", config.from_address),
            env,
        })
    }

    fn render(
        &self,
        template: MailTemplate,
        ctx: minijinja::Value,
    ) -> Result<String, MailerError> {
        let tmpl = self
            .env
            .get_template(template.name())
            .map_err(|e| MailerError::Template(template.name(), e))?;
        tmpl.render(ctx)
            .map_err(|e| MailerError::Template(template.name(), e))
    }

    async fn send(
        &self,
        template: MailTemplate,
        to: &str,
        ctx: minijinja::Value,
    ) -> Result<(), MailerError> {
        let html = self.render(template, ctx)?;

        let message = Message::builder()
            .from(self.from.parse()?)
            .to(to.parse()?)
            .subject(template.subject())
            .header(ContentType::TEXT_HTML)
            .body(html)?;

        match self.transport.send(message).await {
            Ok(_) => {
                metrics::record_email(template.name(), "success");
                tracing::info!(template = template.name(), to, "Email sent");
                Ok(())
            }
            Err(e) => {
                metrics::record_email(template.name(), "error");
                Err(e.into())
            }
        }
    }

    pub async fn send_welcome(&self, to: &str, user_name: &str) -> Result<(), MailerError> {
        self.send(
            MailTemplate::Welcome,
            to,
            context! { user_name => user_name },
        )
        .await
    }

    pub async fn send_file_uploaded(
        &self,
        to: &str,
        user_name: &str,
        file_name: &str,
    ) -> Result<(), MailerError> {
        self.send(
            MailTemplate::FileUploaded,
            to,
            context! { user_name => user_name, file_name => file_name },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mailer() -> Mailer {
        Mailer::new(&SmtpConfig {
            host: "localhost".to_string(),
            port: 587,
            username: None,
            password: None,
            from_address: "noreply@example.com".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_welcome_template_renders_user_name() {
        let html = mailer()
            .render(MailTemplate::Welcome, context! { user_name => "Ada" })
            .unwrap();
        assert!(html.contains("Hello Ada,"));
        assert!(html.contains("Welcome to Filedock!"));
    }

    #[test]
    fn test_file_uploaded_template_renders_file_name() {
        let html = mailer()
            .render(
                MailTemplate::FileUploaded,
                context! { user_name => "Ada", file_name => "report.pdf" },
            )
            .unwrap();
        assert!(html.contains("<strong>report.pdf</strong>"));
    }

    #[test]
    fn test_template_names() {
        assert_eq!(MailTemplate::Welcome.name(), "welcome");
        assert_eq!(MailTemplate::FileUploaded.name(), "file_uploaded");
    }
}
