use anyhow::Result;
use qvs_core::network::VirtualNetwork;
use qvs_interaction::QvsClient;

use crate::context::AppContext;
use crate::output::{OutputFormat, print_json, print_table};

pub async fn list(ctx: &AppContext, output: OutputFormat) -> Result<()> {
    let session = ctx.connect().await?;
    let mut networks = QvsClient::new(&session).list_networks().await?;

    match output {
        OutputFormat::Json => print_json(&networks)?,
        OutputFormat::Text => {
            networks.sort_by_key(|n| n.display_name.to_lowercase());
            print_table(&["NAME", "BRIDGE", "IP", "INTERFACES"], &rows(&networks));
        }
    }
    Ok(())
}

fn rows(networks: &[VirtualNetwork]) -> Vec<Vec<String>> {
    networks
        .iter()
        .map(|n| {
            vec![
                n.display_name.clone(),
                n.name.clone(),
                n.ip.clone(),
                n.nics.join(","),
            ]
        })
        .collect()
}
