//! Terminal prompts.

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Password};
use qvs_core::{QvsError, Result};
use qvs_interaction::{Credentials, Prompter};

pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Prompter for TerminalPrompter {
    fn credentials(&self) -> Result<Credentials> {
        let username = Input::<String>::with_theme(&self.theme)
            .with_prompt("Username")
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)?;
        let password = Password::with_theme(&self.theme)
            .with_prompt("Password")
            .allow_empty_password(true)
            .interact()
            .map_err(prompt_error)?;

        Ok(Credentials {
            username: username.trim().to_string(),
            password,
        })
    }

    fn security_code(&self) -> Result<String> {
        let code = Input::<String>::with_theme(&self.theme)
            .with_prompt("Security code")
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)?;
        Ok(code.trim().to_string())
    }
}

/// Yes/no question answered by typing `yes`.
pub fn confirm_yes(question: &str) -> Result<bool> {
    let answer = Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("{question} (yes/no)"))
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_error)?;
    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}

fn prompt_error(err: dialoguer::Error) -> QvsError {
    QvsError::io(format!("prompt failed: {err}"))
}
