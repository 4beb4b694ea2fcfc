#![allow(dead_code)]

use httpmock::prelude::*;
use qvs_core::credential::CredentialStore;
use qvs_core::session::{LegacySession, ModernSession, SessionRecord};
use qvs_core::{QvsError, Result};
use qvs_infrastructure::FileCredentialStore;
use qvs_interaction::{Credentials, Prompter, SessionManager};
use std::path::Path;
use std::sync::Mutex;

pub const AUTH_LOGIN: &str = "/cgi-bin/authLogin.cgi";
pub const FILE_MANAGER: &str = "/cgi-bin/filemanager/utilRequest.cgi";

pub fn login_xml(auth_passed: i32, need_2sv: i32, sid: &str, username: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" ?>
<QDocRoot version="1.0">
<doQuick><![CDATA[]]></doQuick>
<authPassed><![CDATA[{auth_passed}]]></authPassed>
<authSid><![CDATA[{sid}]]></authSid>
<username><![CDATA[{username}]]></username>
<need_2sv><![CDATA[{need_2sv}]]></need_2sv>
<pw_status><![CDATA[0]]></pw_status>
</QDocRoot>"#
    )
}

pub fn passed_xml() -> String {
    login_xml(1, 0, "ABC", "bob")
}

pub fn complete_record(url: &str) -> SessionRecord {
    SessionRecord::legacy_only(url, LegacySession::new("bob", "ABC"))
        .with_modern(ModernSession::new("tok123", "sess456"))
}

pub fn store_at(dir: &Path) -> FileCredentialStore {
    FileCredentialStore::new(dir.join(".qvs_login"))
}

/// Opens a manager whose stored record is complete and valid, and validates
/// it against `server`.
pub async fn active_session(server: &MockServer, dir: &Path) -> SessionManager {
    let store = store_at(dir);
    store.save(&complete_record(&server.base_url())).unwrap();

    server
        .mock_async(|when, then| {
            when.method(POST).path(AUTH_LOGIN).body_contains("sid=ABC");
            then.status(200).body(passed_xml());
        })
        .await;

    let mut session = SessionManager::open(&server.base_url(), Box::new(store)).unwrap();
    session.ensure_logged_in().await.unwrap();
    session
}

/// Answers prompts from a script and counts them.
pub struct ScriptedPrompter {
    username: String,
    password: String,
    codes: Mutex<Vec<String>>,
    code_prompts: Mutex<u32>,
}

impl ScriptedPrompter {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            codes: Mutex::new(Vec::new()),
            code_prompts: Mutex::new(0),
        }
    }

    /// Codes are handed out in order.
    pub fn with_codes(self, codes: &[&str]) -> Self {
        let mut reversed: Vec<String> = codes.iter().map(|c| c.to_string()).collect();
        reversed.reverse();
        *self.codes.lock().unwrap() = reversed;
        self
    }

    pub fn code_prompts(&self) -> u32 {
        *self.code_prompts.lock().unwrap()
    }
}

impl Prompter for ScriptedPrompter {
    fn credentials(&self) -> Result<Credentials> {
        Ok(Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        })
    }

    fn security_code(&self) -> Result<String> {
        *self.code_prompts.lock().unwrap() += 1;
        self.codes
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| QvsError::invalid_input("no security code scripted"))
    }
}
