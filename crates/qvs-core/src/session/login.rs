//! QTS login handshake.
//!
//! The handshake is a small state machine. The caller asks for the next form
//! to post, posts it, and feeds the parsed [`LoginResponse`] back through
//! [`LoginHandshake::advance`]. A second-factor challenge moves the machine to
//! `AwaitingSecurityCode`; the caller prompts and calls
//! [`LoginHandshake::submit_security_code`] before asking for the next form.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};

use super::record::LegacySession;
use crate::error::{QvsError, Result};

/// Parsed body of `authLogin.cgi`.
///
/// QTS wraps everything in `<QDocRoot>` and emits many more elements than
/// listed here; unknown elements are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "need_2sv", default)]
    pub need_2sv: i32,
    #[serde(rename = "pw_status", default)]
    pub pw_status: i32,
    #[serde(rename = "authPassed", default)]
    pub auth_passed: i32,
    #[serde(rename = "authSid", default)]
    pub auth_sid: String,
    #[serde(default)]
    pub username: String,
}

impl LoginResponse {
    pub fn from_xml(xml: &str) -> Result<Self> {
        Ok(quick_xml::de::from_str(xml)?)
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_passed == 1
    }

    pub fn needs_security_code(&self) -> bool {
        self.auth_passed == 0 && self.need_2sv == 1
    }
}

/// URL-encoded body posted to `authLogin.cgi`. Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginForm {
    pub user: String,
    pub pwd: String,
    #[serde(rename = "serviceKey")]
    pub service_key: String,
    pub security_code: String,
}

/// Ephemeral challenge carried across second-factor retries.
#[derive(Debug, Clone)]
struct LoginChallenge {
    username: String,
    password_b64: String,
    security_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginPhase {
    AwaitingCredentials,
    AwaitingSecurityCode,
    Authenticated(LegacySession),
    Failed,
}

impl LoginPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Authenticated(_) | Self::Failed)
    }
}

#[derive(Debug)]
pub struct LoginHandshake {
    phase: LoginPhase,
    challenge: Option<LoginChallenge>,
    attempts: u32,
}

impl Default for LoginHandshake {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginHandshake {
    pub fn new() -> Self {
        Self {
            phase: LoginPhase::AwaitingCredentials,
            challenge: None,
            attempts: 0,
        }
    }

    pub fn phase(&self) -> &LoginPhase {
        &self.phase
    }

    /// Number of forms handed out so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Stores the username and password. The password is base64-encoded
    /// immediately; the plain text is not kept.
    pub fn submit_credentials(&mut self, username: &str, password: &str) -> Result<()> {
        if self.phase != LoginPhase::AwaitingCredentials {
            return Err(QvsError::internal("credentials submitted out of order"));
        }

        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(QvsError::invalid_input(
                "no username and/or password provided",
            ));
        }

        self.challenge = Some(LoginChallenge {
            username: username.to_string(),
            password_b64: BASE64_STANDARD.encode(password.as_bytes()),
            security_code: None,
        });
        Ok(())
    }

    pub fn submit_security_code(&mut self, code: &str) -> Result<()> {
        if self.phase != LoginPhase::AwaitingSecurityCode {
            return Err(QvsError::internal("security code submitted out of order"));
        }
        let challenge = self
            .challenge
            .as_mut()
            .ok_or_else(|| QvsError::internal("security code without credentials"))?;
        challenge.security_code = Some(code.trim().to_string());
        Ok(())
    }

    /// The next form to post, or `None` when input is still missing or the
    /// handshake has finished.
    pub fn next_form(&mut self) -> Option<LoginForm> {
        let challenge = self.challenge.as_ref()?;
        let security_code = match self.phase {
            LoginPhase::AwaitingCredentials => String::new(),
            LoginPhase::AwaitingSecurityCode => challenge.security_code.clone()?,
            LoginPhase::Authenticated(_) | LoginPhase::Failed => return None,
        };

        self.attempts += 1;
        Some(LoginForm {
            user: challenge.username.clone(),
            pwd: challenge.password_b64.clone(),
            service_key: "1".to_string(),
            security_code,
        })
    }

    /// Applies the server's answer to the last posted form.
    pub fn advance(&mut self, response: &LoginResponse) -> Result<&LoginPhase> {
        if self.phase.is_terminal() {
            return Err(QvsError::internal("login handshake already finished"));
        }

        if response.is_authenticated() {
            if response.auth_sid.is_empty() {
                self.fail();
                return Err(QvsError::SessionBootstrapFailed(
                    "login response carried no session id".to_string(),
                ));
            }
            let username = if response.username.is_empty() {
                self.challenge
                    .as_ref()
                    .map(|c| c.username.clone())
                    .unwrap_or_default()
            } else {
                response.username.clone()
            };
            self.challenge = None;
            self.phase =
                LoginPhase::Authenticated(LegacySession::new(username, &response.auth_sid));
        } else if response.needs_security_code() {
            if let Some(challenge) = self.challenge.as_mut() {
                challenge.security_code = None;
            }
            self.phase = LoginPhase::AwaitingSecurityCode;
        } else {
            self.fail();
        }

        Ok(&self.phase)
    }

    fn fail(&mut self) {
        self.challenge = None;
        self.phase = LoginPhase::Failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSED: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<QDocRoot version="1.0">
<doQuick><![CDATA[]]></doQuick>
<is_booting><![CDATA[0]]></is_booting>
<authPassed><![CDATA[1]]></authPassed>
<authSid><![CDATA[ABC]]></authSid>
<pw_status><![CDATA[0]]></pw_status>
<username><![CDATA[bob]]></username>
<need_2sv><![CDATA[0]]></need_2sv>
</QDocRoot>"#;

    const NEED_2SV: &str = r#"<QDocRoot version="1.0">
<authPassed><![CDATA[0]]></authPassed>
<need_2sv><![CDATA[1]]></need_2sv>
</QDocRoot>"#;

    const REJECTED: &str = r#"<QDocRoot version="1.0">
<authPassed><![CDATA[0]]></authPassed>
<need_2sv><![CDATA[0]]></need_2sv>
</QDocRoot>"#;

    #[test]
    fn test_parse_login_response() {
        let resp = LoginResponse::from_xml(PASSED).unwrap();
        assert!(resp.is_authenticated());
        assert_eq!(resp.auth_sid, "ABC");
        assert_eq!(resp.username, "bob");
        assert_eq!(resp.need_2sv, 0);
    }

    #[test]
    fn test_parse_missing_fields_default_to_zero() {
        let resp = LoginResponse::from_xml("<QDocRoot></QDocRoot>").unwrap();
        assert_eq!(resp, LoginResponse::default());
        assert!(!resp.is_authenticated());
    }

    #[test]
    fn test_first_form_has_empty_security_code() {
        let mut hs = LoginHandshake::new();
        assert!(hs.next_form().is_none());

        hs.submit_credentials("bob", "secret").unwrap();
        let form = hs.next_form().unwrap();
        assert_eq!(form.user, "bob");
        assert_eq!(form.pwd, "c2VjcmV0");
        assert_eq!(form.service_key, "1");
        assert_eq!(form.security_code, "");
        assert_eq!(hs.attempts(), 1);
    }

    #[test]
    fn test_empty_credentials_rejected() {
        let mut hs = LoginHandshake::new();
        assert!(matches!(
            hs.submit_credentials("  ", "secret"),
            Err(QvsError::InvalidInput(_))
        ));
        assert!(matches!(
            hs.submit_credentials("bob", ""),
            Err(QvsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_success_yields_legacy_session() {
        let mut hs = LoginHandshake::new();
        hs.submit_credentials("bob", "secret").unwrap();
        hs.next_form().unwrap();

        let phase = hs.advance(&LoginResponse::from_xml(PASSED).unwrap()).unwrap();
        assert_eq!(
            phase,
            &LoginPhase::Authenticated(LegacySession::new("bob", "ABC"))
        );
        assert!(hs.next_form().is_none());
    }

    #[test]
    fn test_rejection_fails_without_retry() {
        let mut hs = LoginHandshake::new();
        hs.submit_credentials("bob", "wrong").unwrap();
        hs.next_form().unwrap();

        let phase = hs
            .advance(&LoginResponse::from_xml(REJECTED).unwrap())
            .unwrap();
        assert_eq!(phase, &LoginPhase::Failed);
        assert!(hs.next_form().is_none());
        assert_eq!(hs.attempts(), 1);
    }

    #[test]
    fn test_second_factor_requires_code_before_next_form() {
        let mut hs = LoginHandshake::new();
        hs.submit_credentials("bob", "secret").unwrap();
        hs.next_form().unwrap();

        hs.advance(&LoginResponse::from_xml(NEED_2SV).unwrap())
            .unwrap();
        assert_eq!(hs.phase(), &LoginPhase::AwaitingSecurityCode);
        assert!(hs.next_form().is_none());

        hs.submit_security_code(" 123456 ").unwrap();
        let form = hs.next_form().unwrap();
        assert_eq!(form.security_code, "123456");
        assert_eq!(form.user, "bob");
        assert_eq!(hs.attempts(), 2);
    }

    #[test]
    fn test_wrong_code_prompts_again() {
        let mut hs = LoginHandshake::new();
        hs.submit_credentials("bob", "secret").unwrap();
        hs.next_form().unwrap();
        hs.advance(&LoginResponse::from_xml(NEED_2SV).unwrap())
            .unwrap();

        hs.submit_security_code("000000").unwrap();
        hs.next_form().unwrap();
        hs.advance(&LoginResponse::from_xml(NEED_2SV).unwrap())
            .unwrap();

        // The previous code is discarded; a fresh one is needed.
        assert_eq!(hs.phase(), &LoginPhase::AwaitingSecurityCode);
        assert!(hs.next_form().is_none());
    }

    #[test]
    fn test_authenticated_without_sid_is_bootstrap_failure() {
        let mut hs = LoginHandshake::new();
        hs.submit_credentials("bob", "secret").unwrap();
        hs.next_form().unwrap();

        let resp = LoginResponse {
            auth_passed: 1,
            ..Default::default()
        };
        assert!(matches!(
            hs.advance(&resp),
            Err(QvsError::SessionBootstrapFailed(_))
        ));
        assert_eq!(hs.phase(), &LoginPhase::Failed);
    }

    #[test]
    fn test_form_encoding_order() {
        let form = LoginForm {
            user: "bob".into(),
            pwd: "c2VjcmV0".into(),
            service_key: "1".into(),
            security_code: "".into(),
        };
        let value = serde_json::to_value(&form).unwrap();
        assert_eq!(value["serviceKey"], "1");
    }
}
