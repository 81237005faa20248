use std::env;

/// Email-related settings shared with the reconciliation core.
///
/// Kept as its own struct so the payment code can build notification
/// messages without dragging the full server config along.
#[derive(Debug, Clone)]
pub struct NotifySettings {
    /// "From" address for all outbound mail
    pub from_email: String,
    /// Studio owner address (payment confirmations, gallery activity)
    pub studio_email: String,
    /// Support address (warnings, reconciliation problems)
    pub support_email: String,
    /// Prefix prepended to every subject line, e.g. "[darkroom]"
    pub subject_prefix: String,
    /// Whether payment confirmations are also sent to the studio address
    pub send_all_studio_emails: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub media_root: String,
    pub base_url: String,
    /// Default receiver email stamped on new orders
    pub default_paypal_email: String,
    pub resend_api_key: Option<String>,
    pub notify: NotifySettings,
    pub bootstrap_staff_email: Option<String>,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("DARKROOM_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let base_url = env::var("BASE_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", host, port));

        let studio_email =
            env::var("STUDIO_EMAIL").unwrap_or_else(|_| "studio@darkroom.local".to_string());

        let notify = NotifySettings {
            from_email: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "noreply@darkroom.local".to_string()),
            support_email: env::var("SUPPORT_EMAIL")
                .unwrap_or_else(|_| "support@darkroom.local".to_string()),
            subject_prefix: env::var("EMAIL_SUBJECT_PREFIX")
                .unwrap_or_else(|_| "[darkroom]".to_string()),
            send_all_studio_emails: env::var("SEND_ALL_STUDIO_EMAILS")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(true),
            studio_email: studio_email.clone(),
        };

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "darkroom.db".to_string()),
            media_root: env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string()),
            base_url,
            default_paypal_email: env::var("DEFAULT_PAYPAL_EMAIL")
                .unwrap_or_else(|_| studio_email),
            resend_api_key: env::var("RESEND_API_KEY").ok(),
            notify,
            bootstrap_staff_email: env::var("BOOTSTRAP_STAFF_EMAIL").ok(),
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
