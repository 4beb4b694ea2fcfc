use anyhow::Result;
use qvs_interaction::QvsClient;

use crate::context::AppContext;

pub async fn create(ctx: &AppContext) -> Result<()> {
    let session = ctx.connect().await?;
    let mac = QvsClient::new(&session).mac_create().await?;
    println!("{mac}");
    Ok(())
}
