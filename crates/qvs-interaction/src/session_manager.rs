//! Session lifecycle: load, validate, log in, bootstrap, persist.
//!
//! ```text
//!            open()                    ensure_logged_in()
//!   ──────────────▶ Loaded ───────────────────────────────▶ Active
//!         │                                                  ▲
//!         └───────▶ Empty ──── login() ──────────────────────┘
//! ```
//!
//! The manager owns the cookie jar and the single `reqwest::Client` bound to
//! it. Every request made on behalf of the user, including the ones issued by
//! [`crate::Gateway`], goes through that client.

use chrono::Utc;
use qvs_core::credential::CredentialStore;
use qvs_core::session::{
    ApiGeneration, LegacySession, LoginForm, LoginHandshake, LoginPhase, LoginResponse,
    ModernSession, SessionRecord, SessionState,
};
use qvs_core::{QvsError, Result};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, StatusCode, Url};
use std::sync::Arc;

use crate::prompter::Prompter;

pub(crate) const AUTH_LOGIN_PATH: &str = "/cgi-bin/authLogin.cgi";
pub(crate) const QVS_ROOT_PATH: &str = "/qvs/";

const LEGACY_USER_COOKIE: &str = "NAS_USER";
const LEGACY_SID_COOKIE: &str = "NAS_SID";
const CSRF_COOKIE: &str = "csrftoken";
const SESSION_COOKIE: &str = "sessionid";

/// Outcome of a successful login.
#[derive(Debug)]
pub struct LoginReport {
    pub record: SessionRecord,
    /// Set when the record could not be written. The session is still usable
    /// for the rest of this process.
    pub persist_error: Option<QvsError>,
}

pub struct SessionManager {
    base_url: String,
    url: Url,
    jar: Arc<Jar>,
    http: Client,
    store: Box<dyn CredentialStore>,
    record: SessionRecord,
    state: SessionState,
}

impl SessionManager {
    /// Builds the manager and loads the stored record, if any.
    ///
    /// A missing, empty or unreadable record leaves the manager `Empty`;
    /// nothing is written until a login succeeds.
    pub fn open(base_url: &str, store: Box<dyn CredentialStore>) -> Result<Self> {
        let base_url = qvs_core::config::normalize_base_url(base_url);
        let url = Url::parse(&base_url)
            .map_err(|e| QvsError::config(format!("invalid QTS URL '{}': {}", base_url, e)))?;
        let jar = Arc::new(Jar::default());
        let http = build_http(&jar)?;

        let mut manager = Self {
            base_url,
            url,
            jar,
            http,
            store,
            record: SessionRecord::default(),
            state: SessionState::Empty,
        };

        match manager.store.load() {
            Ok(record) if !record.qts_url.is_empty() && record.qts_url != manager.base_url => {
                tracing::debug!(
                    "Ignoring session for {}; target is {}",
                    record.qts_url,
                    manager.base_url
                );
            }
            Ok(record) => {
                manager.seed_jar(&record);
                manager.record = record;
                manager.state = SessionState::Loaded;
                tracing::debug!("Loaded session from {}", manager.store.location());
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!("No stored session: {}", e);
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable session record: {}", e);
            }
        }

        Ok(manager)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn record(&self) -> &SessionRecord {
        &self.record
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// The modern half, only while the session is active.
    pub(crate) fn active_modern(&self) -> Option<&ModernSession> {
        if self.state.is_active() {
            self.record.modern()
        } else {
            None
        }
    }

    /// The legacy session id used as `sid` by the legacy endpoints.
    pub(crate) fn legacy_sid(&self) -> Option<&str> {
        self.record.legacy().map(|l| l.session_id.as_str())
    }

    /// Current value of a cookie the jar would send to `path`.
    pub fn cookie_value(&self, path: &str, name: &str) -> Option<String> {
        let url = Url::parse(&self.endpoint(path)).ok()?;
        let header = self.jar.cookies(&url)?;
        let header = header.to_str().ok()?;
        header.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then(|| value.to_string())
        })
    }

    /// Asks the legacy login endpoint whether the stored session id is still
    /// valid. Any failure reads as "not authenticated".
    pub async fn check_login(&self) -> bool {
        let Some(sid) = self.legacy_sid() else {
            return false;
        };
        let dc = Utc::now().timestamp().to_string();

        let response = match self
            .http
            .post(self.endpoint(AUTH_LOGIN_PATH))
            .form(&[("sid", sid), ("_dc", dc.as_str())])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Session check failed: {}", e);
                return false;
            }
        };

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!("Session check body unreadable: {}", e);
                return false;
            }
        };

        match LoginResponse::from_xml(&body) {
            Ok(login) => login.is_authenticated(),
            Err(e) => {
                tracing::debug!("Session check body undecodable: {}", e);
                false
            }
        }
    }

    /// Non-interactive validation used before every domain command.
    pub async fn ensure_logged_in(&mut self) -> Result<()> {
        if self.state.is_active() {
            return Ok(());
        }
        if self.state == SessionState::Empty {
            return Err(QvsError::NotLoggedIn);
        }
        if self.check_login().await {
            self.state = SessionState::Active;
            Ok(())
        } else {
            Err(QvsError::NotLoggedIn)
        }
    }

    /// Interactive login with optional second-factor step-up.
    ///
    /// The security code is asked for every time the server demands one; the
    /// loop only ends on success or on a plain rejection.
    pub async fn login(
        &mut self,
        prompter: &dyn Prompter,
        generation: ApiGeneration,
    ) -> Result<LoginReport> {
        let credentials = prompter.credentials()?;
        let mut handshake = LoginHandshake::new();
        handshake.submit_credentials(&credentials.username, &credentials.password)?;

        // Fresh jar for the new session.
        self.jar = Arc::new(Jar::default());
        self.http = build_http(&self.jar)?;
        self.record = SessionRecord::default();
        self.state = SessionState::Empty;

        let legacy = loop {
            let form = handshake
                .next_form()
                .ok_or_else(|| QvsError::internal("login form requested without input"))?;
            let response = self.post_login_form(&form).await?;

            match handshake.advance(&response)?.clone() {
                LoginPhase::Authenticated(legacy) => break legacy,
                LoginPhase::AwaitingSecurityCode => {
                    tracing::debug!("Second factor required (attempt {})", handshake.attempts());
                    let code = prompter.security_code()?;
                    handshake.submit_security_code(&code)?;
                }
                LoginPhase::Failed => return Err(QvsError::InvalidCredentials),
                LoginPhase::AwaitingCredentials => {
                    return Err(QvsError::internal("login handshake did not advance"));
                }
            }
        };

        self.seed_legacy(&legacy);
        let mut record = SessionRecord::legacy_only(&self.base_url, legacy);

        if generation == ApiGeneration::Modern {
            record = record.with_modern(self.bootstrap_modern().await?);
        }

        self.record = record.clone();
        self.state = SessionState::Active;
        tracing::info!("Logged in to {} as {}", self.base_url, record.legacy.username);

        let persist_error = match self.store.save(&record) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!("{}", e);
                Some(e)
            }
        };

        Ok(LoginReport {
            record,
            persist_error,
        })
    }

    /// Forgets the session locally and removes the stored record.
    pub fn logout(&mut self) -> Result<()> {
        self.store.clear()?;
        self.jar = Arc::new(Jar::default());
        self.http = build_http(&self.jar)?;
        self.record = SessionRecord::default();
        self.state = SessionState::Empty;
        Ok(())
    }

    async fn post_login_form(&self, form: &LoginForm) -> Result<LoginResponse> {
        let response = self
            .http
            .post(self.endpoint(AUTH_LOGIN_PATH))
            .form(form)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("POST {} -> {}", AUTH_LOGIN_PATH, status);
        if status != StatusCode::OK {
            return Err(QvsError::RequestFailed {
                status_code: status.as_u16(),
            });
        }

        let body = response.text().await?;
        LoginResponse::from_xml(&body)
    }

    /// Visits the QVS root with the legacy cookies so the server issues the
    /// CSRF token and session id, then reads both back from the jar.
    async fn bootstrap_modern(&self) -> Result<ModernSession> {
        let response = self
            .http
            .get(self.endpoint(QVS_ROOT_PATH))
            .send()
            .await
            .map_err(|e| QvsError::SessionBootstrapFailed(e.to_string()))?;
        tracing::debug!("GET {} -> {}", QVS_ROOT_PATH, response.status());

        let csrf_token = self.cookie_value(QVS_ROOT_PATH, CSRF_COOKIE);
        let session_id = self.cookie_value(QVS_ROOT_PATH, SESSION_COOKIE);

        match (csrf_token, session_id) {
            (Some(token), Some(sid)) if !token.is_empty() && !sid.is_empty() => {
                Ok(ModernSession::new(token, sid))
            }
            (token, sid) => Err(QvsError::SessionBootstrapFailed(format!(
                "missing cookie(s):{}{}",
                if token.is_none_or(|t| t.is_empty()) { " csrftoken" } else { "" },
                if sid.is_none_or(|s| s.is_empty()) { " sessionid" } else { "" },
            ))),
        }
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn seed_jar(&self, record: &SessionRecord) {
        if let Some(legacy) = record.legacy() {
            self.seed_legacy(legacy);
        }
        if let Some(modern) = record.modern() {
            self.add_cookie(CSRF_COOKIE, &modern.csrf_token);
            self.add_cookie(SESSION_COOKIE, &modern.session_id);
        }
    }

    fn seed_legacy(&self, legacy: &LegacySession) {
        self.add_cookie(LEGACY_USER_COOKIE, &legacy.username);
        self.add_cookie(LEGACY_SID_COOKIE, &legacy.session_id);
    }

    fn add_cookie(&self, name: &str, value: &str) {
        self.jar
            .add_cookie_str(&format!("{}={}; Path=/", name, value), &self.url);
    }
}

fn build_http(jar: &Arc<Jar>) -> Result<Client> {
    Ok(Client::builder().cookie_provider(Arc::clone(jar)).build()?)
}
