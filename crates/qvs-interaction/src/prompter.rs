use qvs_core::Result;

/// Username and plain-text password entered by the user.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Source of interactive login input.
///
/// The terminal implementation lives in the CLI; tests script the answers.
pub trait Prompter {
    fn credentials(&self) -> Result<Credentials>;

    /// Asked once per second-factor challenge, including every retry.
    fn security_code(&self) -> Result<String>;
}
