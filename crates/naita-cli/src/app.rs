//! Application state for the command line front end.
//!
//! `App` owns the configuration, the stored session and the API client, and
//! decides which record source a command reads from.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use naita_core::api::{ApiClient, ApiError};
use naita_core::auth::Session;
use naita_core::config::{Config, ENV_PASSWORD};
use naita_core::models::Role;
use naita_core::provider::{AnyProvider, ApiProvider, FixtureProvider};

pub const SESSION_EXPIRED: &str = "Session expired. Run `naita login` to sign in again.";

const NOT_LOGGED_IN: &str = "Not logged in. Run `naita login` first.";

pub struct App {
    pub config: Config,
    session: Session,
    api: ApiClient,
    fixtures: Option<PathBuf>,
}

impl App {
    pub fn new(fixtures: Option<PathBuf>, api_url: Option<String>) -> Result<Self> {
        let mut config = Config::load().context("Failed to load config")?;
        if let Some(url) = api_url {
            config.api_base_url = Some(url);
        }

        let mut session = Session::new(config.cache_dir()?);
        if let Err(e) = session.load() {
            warn!(error = %e, "Ignoring unreadable session file");
        }

        let mut api = ApiClient::new(config.api_base_url())?;
        if let Some(token) = session.token() {
            api.set_token(token.to_string());
        }

        let fixtures = fixtures.or_else(|| config.fixtures_dir.clone());

        Ok(Self {
            config,
            session,
            api,
            fixtures,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_valid()
    }

    /// Role of the signed-in user. Fixture runs without a session act as admin.
    pub fn role(&self) -> Role {
        self.session.role().cloned().unwrap_or(Role::Admin)
    }

    /// District assigned to the user, falling back to the configured one
    pub fn district(&self) -> Option<String> {
        self.session
            .data
            .as_ref()
            .and_then(|d| d.district.clone())
            .or_else(|| self.config.district.clone())
    }

    /// District a data entry officer is restricted to
    pub fn assigned_district(&self) -> Option<String> {
        match self.role() {
            Role::DataEntry => self.session.data.as_ref().and_then(|d| d.district.clone()),
            _ => None,
        }
    }

    pub async fn login(&mut self, email: Option<String>) -> Result<()> {
        let email = match email.or_else(|| self.config.last_email.clone()) {
            Some(email) => email,
            None => prompt("Email: ")?,
        };
        if email.is_empty() {
            anyhow::bail!("Email is required");
        }

        let password = match std::env::var(ENV_PASSWORD) {
            Ok(password) if !password.is_empty() => password,
            _ => rpassword::prompt_password(format!("Password for {}: ", email))?,
        };

        let data = self.api.login(&email, &password).await?;
        let role = data.role.clone();
        self.api.set_token(data.access_token.clone());
        self.session.update(data);
        self.session.save().context("Failed to save session")?;

        self.config.last_email = Some(email);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        info!(role = %role, "Login successful");
        println!("Logged in as {}.", role);
        Ok(())
    }

    pub fn logout(&mut self) -> Result<()> {
        self.session.clear().context("Failed to remove session")?;
        info!("Logged out");
        println!("Logged out.");
        Ok(())
    }

    /// Fixtures when configured, otherwise the live API
    pub fn provider(&self) -> Result<AnyProvider> {
        if let Some(ref dir) = self.fixtures {
            return Ok(AnyProvider::Fixture(FixtureProvider::from_dir(dir.clone())));
        }
        Ok(AnyProvider::Api(ApiProvider::new(self.api()?.clone())))
    }

    /// The API client, once a session exists
    pub fn api(&self) -> Result<&ApiClient> {
        if !self.is_authenticated() {
            anyhow::bail!(NOT_LOGGED_IN);
        }
        Ok(&self.api)
    }

    /// Drop the stored session after the backend rejected its token
    pub fn expire_session(&mut self) {
        warn!("Backend rejected the stored token");
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to remove session");
        }
    }

    /// Clear the session when `err` came from a 401
    pub fn check_unauthorized(&mut self, err: &anyhow::Error) -> bool {
        let unauthorized = err
            .chain()
            .any(|c| matches!(c.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized)));
        if unauthorized {
            self.expire_session();
        }
        unauthorized
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
