use anyhow::Result;
use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod commands;
mod context;
mod output;
mod prompt;

use commands::vm_create::CreateArgs;
use context::AppContext;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "qvscli")]
#[command(version, about = "Interact with QNAP Virtualization Station", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every command. Unset values fall back to
/// `~/.config/qvs/config.toml`, then to built-in defaults.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// URL of QTS, typically the https DNS name of your QNAP NAS
    #[arg(long, env = "QVSCLI_QTS_URL", global = true)]
    pub qts_url: Option<String>,

    /// NAS path to folder where disk images are stored
    #[arg(long = "qvs-disks-dir", env = "QVSCLI_QVS_DISKS_DIR", global = true)]
    pub disks_dir: Option<String>,

    /// NAS path to base image directory containing folders or .img files
    #[arg(long = "qvs-images-dir", env = "QVSCLI_QVS_IMAGES_DIR", global = true)]
    pub images_dir: Option<String>,

    /// Override default login file
    #[arg(long = "loginfile", env = "QVSCLI_LOGIN_FILE", global = true)]
    pub login_file: Option<PathBuf>,

    /// Enable HTTP request/response debugging
    #[arg(
        long,
        env = "QVSCLI_HTTP_DEBUG",
        global = true,
        value_parser = BoolishValueParser::new()
    )]
    pub debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to QTS/QVS and store the session in the login file
    Login,
    /// Remove the stored session
    Logout,
    /// Options for MAC addresses
    Mac {
        #[command(subcommand)]
        action: MacAction,
    },
    /// Options for VM disk images
    #[command(visible_alias = "image")]
    Images {
        #[command(subcommand)]
        action: ImagesAction,
    },
    /// Options for virtual networks
    #[command(visible_alias = "net")]
    Networks {
        #[command(subcommand)]
        action: NetworksAction,
    },
    /// Options for virtual machines
    Vm {
        #[command(subcommand)]
        action: VmAction,
    },
}

#[derive(Subcommand)]
enum MacAction {
    /// Generate a new MAC address
    Create,
}

#[derive(Subcommand)]
enum ImagesAction {
    /// List images found in the qvs-images-dir
    #[command(visible_alias = "ls")]
    List {
        /// Sub-directory of the images dir
        path: Option<String>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
}

#[derive(Subcommand)]
enum NetworksAction {
    /// List virtual networks
    #[command(visible_alias = "ls")]
    List {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
}

#[derive(Subcommand)]
enum VmAction {
    /// List virtual machines
    #[command(visible_alias = "ls")]
    List {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
    /// Describe VM by ID or name
    #[command(visible_alias = "desc")]
    Describe { id_or_name: String },
    /// Start a stopped VM by ID or name
    Start { id_or_name: String },
    /// Reset a VM by ID or name
    Reset { id_or_name: String },
    /// Stop a VM by ID or name
    #[command(visible_alias = "shutdown")]
    Stop {
        id_or_name: String,
        /// Force shutdown the VM
        #[arg(long)]
        force: bool,
    },
    /// Delete a VM by ID or name
    #[command(visible_aliases = ["del", "rm"])]
    Delete {
        id_or_name: String,
        /// Do not prompt to delete, dangerous!
        #[arg(long, env = "QVSCLI_VM_NO_DEL_INPUT", value_parser = BoolishValueParser::new())]
        no_input: bool,
        /// Do not delete disks after deleting VM
        #[arg(long, env = "QVSCLI_VM_NO_DISK_DEL", value_parser = BoolishValueParser::new())]
        no_disk_del: bool,
    },
    /// Create a VM with provided or generated cloud-init data
    #[command(visible_alias = "c")]
    Create(Box<CreateArgs>),
    /// Options for VM disk snapshots
    #[command(visible_alias = "snap")]
    Snapshot {
        #[command(subcommand)]
        action: SnapshotAction,
    },
}

#[derive(Subcommand)]
enum SnapshotAction {
    /// List all VM snapshots
    #[command(visible_alias = "ls")]
    List,
    /// Create a snapshot by VM ID or name
    Create {
        /// The ID or name of the VM to snapshot
        #[arg(long)]
        vm: String,
        /// Snapshot name
        name: String,
    },
    /// Delete a snapshot
    #[command(visible_aliases = ["del", "rm"])]
    Delete {
        /// Snapshot file name
        file: String,
    },
}

/// Logs go to stderr; `--debug` raises the qvscli crates to `debug`.
fn install_tracing(debug: bool) {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let default_directive = if debug {
        "info,qvs_core=debug,qvs_infrastructure=debug,qvs_interaction=debug,qvs_cli=debug"
    } else {
        "info"
    };

    let format = fmt::format().without_time().with_target(false).compact();
    let fmt_layer = fmt::layer()
        .event_format(format)
        .with_writer(std::io::stderr);
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = AppContext::load(&cli.global)?;

    match cli.command {
        Commands::Login => commands::login::login(&ctx).await,
        Commands::Logout => commands::login::logout(&ctx),
        Commands::Mac { action } => match action {
            MacAction::Create => commands::mac::create(&ctx).await,
        },
        Commands::Images { action } => match action {
            ImagesAction::List { path, output } => {
                commands::images::list(&ctx, path.as_deref().unwrap_or(""), output).await
            }
        },
        Commands::Networks { action } => match action {
            NetworksAction::List { output } => commands::networks::list(&ctx, output).await,
        },
        Commands::Vm { action } => match action {
            VmAction::List { output } => commands::vm::list(&ctx, output).await,
            VmAction::Describe { id_or_name } => commands::vm::describe(&ctx, &id_or_name).await,
            VmAction::Start { id_or_name } => commands::vm::start(&ctx, &id_or_name).await,
            VmAction::Reset { id_or_name } => commands::vm::reset(&ctx, &id_or_name).await,
            VmAction::Stop { id_or_name, force } => {
                commands::vm::stop(&ctx, &id_or_name, force).await
            }
            VmAction::Delete {
                id_or_name,
                no_input,
                no_disk_del,
            } => commands::vm::delete(&ctx, &id_or_name, no_input, no_disk_del).await,
            VmAction::Create(args) => commands::vm_create::create(&ctx, &args).await,
            VmAction::Snapshot { action } => match action {
                SnapshotAction::List => commands::snapshot::list(&ctx).await,
                SnapshotAction::Create { vm, name } => {
                    commands::snapshot::create(&ctx, &vm, &name).await
                }
                SnapshotAction::Delete { file } => commands::snapshot::delete(&ctx, &file).await,
            },
        },
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    install_tracing(cli.global.debug);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
