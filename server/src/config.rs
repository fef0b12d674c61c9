use anyhow::{Context, Result, anyhow};
use platform_authn::AuthConfig;
use products_hr::ManagerVariant;

const DEV_AUTH_SECRET: &str = "insecure-dev-secret-change-me";
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub auth: AuthConfig,
    pub cors_allowed_origins: Vec<String>,
    pub manager_view: ManagerVariant,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let insecure_dev = lookup("AUTH_INSECURE_DEV")
            .map(|val| matches!(val.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let jwt_secret = match lookup("AUTH_SECRET").filter(|s| !s.trim().is_empty()) {
            Some(secret) => secret,
            None if insecure_dev => {
                tracing::warn!("AUTH_SECRET unset; using the insecure development secret");
                DEV_AUTH_SECRET.to_string()
            }
            None => {
                return Err(anyhow!(
                    "AUTH_SECRET missing (set AUTH_INSECURE_DEV=1 for local development)"
                ));
            }
        };
        let token_ttl_minutes = match lookup("TOKEN_TTL_MINUTES") {
            Some(raw) => raw
                .trim()
                .parse()
                .context("invalid TOKEN_TTL_MINUTES")?,
            None => DEFAULT_TOKEN_TTL_MINUTES,
        };

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        let manager_view = match lookup("MANAGER_VIEW") {
            Some(raw) => raw.parse().map_err(|err: String| anyhow!(err))?,
            None => ManagerVariant::default(),
        };

        Ok(Self {
            auth: AuthConfig {
                jwt_secret,
                token_ttl_minutes,
            },
            cors_allowed_origins,
            manager_view,
        })
    }
}
