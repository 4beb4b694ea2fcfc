use anyhow::Result;
use colored::Colorize;
use qvs_core::session::ApiGeneration;

use crate::context::AppContext;
use crate::prompt::TerminalPrompter;

pub async fn login(ctx: &AppContext) -> Result<()> {
    let mut session = ctx.open_session()?;
    let report = session
        .login(&TerminalPrompter::new(), ApiGeneration::Modern)
        .await?;

    match report.persist_error {
        None => println!(
            "{} session stored in {}",
            "Logged in,".green(),
            ctx.config.login_file.display()
        ),
        Some(_) => println!(
            "{} the session is only valid for this invocation",
            "Logged in,".yellow()
        ),
    }
    Ok(())
}

pub fn logout(ctx: &AppContext) -> Result<()> {
    let mut session = ctx.open_session()?;
    session.logout()?;
    println!("Removed {}", ctx.config.login_file.display());
    Ok(())
}
