use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::response::ApiResponse;

/// Outbound mail seam. Production uses SMTP; tests plug in a fake.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(smtp: &SmtpConfig) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)?
            .credentials(Credentials::new(smtp.user.clone(), smtp.pass.clone()))
            .build();
        Ok(Self {
            transport,
            from: smtp.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())?;
        self.transport.send(message).await?;
        tracing::info!(to, subject, "email sent");
        Ok(())
    }
}

/// The HTML templates shipped with the binary.
#[derive(Debug, Clone, Copy)]
pub enum EmailTemplate {
    Welcome,
    WelcomeOauth,
    OtpResend,
    RequestPassword,
}

impl EmailTemplate {
    fn html(self) -> &'static str {
        match self {
            EmailTemplate::Welcome => include_str!("../templates/welcome.html"),
            EmailTemplate::WelcomeOauth => include_str!("../templates/welcome-oauth.html"),
            EmailTemplate::OtpResend => include_str!("../templates/otp-resend.html"),
            EmailTemplate::RequestPassword => include_str!("../templates/request-password.html"),
        }
    }
}

/// Replaces every `{{key}}` token with its value. Unknown tokens are left in
/// place; substitution is exact-match only.
pub fn render_template(template: EmailTemplate, options: &[(&str, &str)]) -> String {
    let mut html = template.html().to_string();
    for (key, value) in options {
        html = html.replace(&format!("{{{{{}}}}}", key), value);
    }
    html
}

/// Renders a template and sends it, converting failures into the uniform
/// "Error sending email" response.
pub async fn send_email(
    mailer: &dyn Mailer,
    to: &str,
    subject: &str,
    template: EmailTemplate,
    options: &[(&str, &str)],
) -> Result<(), ApiResponse> {
    let html = render_template(template, options);
    mailer.send(to, subject, &html).await.map_err(|err| {
        tracing::error!(error = %err, to, "error sending email");
        ApiResponse::internal().with_error("Error sending email")
    })
}
