use async_trait::async_trait;
use std::sync::Arc;

/// Outbound mail seam. The reset flow only ever needs one message shape, so
/// the contract stays narrow.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, to: &str, reset_link: &str) -> Result<(), String>;
}

pub type MailerState = Arc<dyn Mailer>;

/// Writes the reset link to the log instead of sending real mail. Stands in
/// until an SMTP provider is wired up.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, to: &str, reset_link: &str) -> Result<(), String> {
        tracing::info!(%to, %reset_link, "password reset link issued");
        Ok(())
    }
}

/// Records sent mail for assertions in tests.
pub struct MockMailer {
    sent: std::sync::Mutex<Vec<(String, String)>>,
    should_fail: bool,
}

impl MockMailer {
    pub fn new() -> Self {
        Self {
            sent: std::sync::Mutex::new(Vec::new()),
            should_fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            sent: std::sync::Mutex::new(Vec::new()),
            should_fail: true,
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for MockMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send_password_reset(&self, to: &str, reset_link: &str) -> Result<(), String> {
        if self.should_fail {
            return Err("mock mailer failure".to_string());
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), reset_link.to_string()));
        Ok(())
    }
}
