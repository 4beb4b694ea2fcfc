//! `vm create`: cloud-init seed, disk staging on the NAS, VM creation.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::Args;
use clap::builder::BoolishValueParser;
use qvs_core::remote_file::{remote_basename, remote_join, remote_parent};
use qvs_core::vm::{OsType, VmSpec};
use qvs_infrastructure::QvsPaths;
use qvs_infrastructure::cloud_init::{
    CloudInitSeed, IsoBuilder, UserDataContext, generate_password, render_meta_data,
    render_user_data,
};
use qvs_interaction::QvsClient;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use crate::context::AppContext;

const NAME_PATTERN: &str = r"^([[:alnum:]][[:alnum:]-]{0,61}[[:alnum:]]|[[:alpha:]])$";
const VNC_PASSWORD_MAX: usize = 8;

#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    /// Instance name, also used as hostname
    pub name: String,

    /// Do not auto-start VM after creation
    #[arg(long, env = "QVSCLI_VM_NO_START", value_parser = BoolishValueParser::new())]
    pub no_start: bool,

    /// Path to startup script run once by cloud-init
    #[arg(long, env = "QVSCLI_STARTUP_SCRIPT")]
    pub startup_script: Option<PathBuf>,

    /// Path to meta-data file override for cloud-init, default is generated
    #[arg(long = "meta-data", env = "QVSCLI_META_DATA_FILE")]
    pub meta_data: Option<PathBuf>,

    /// Path to user-data file override for cloud-init, default is generated
    #[arg(long = "user-data", env = "QVSCLI_USER_DATA_FILE")]
    pub user_data: Option<PathBuf>,

    /// Public SSH key used when --user-data is not provided [default: ~/.ssh/id_rsa.pub]
    #[arg(long, env = "QVSCLI_AUTHORIZED_KEY")]
    pub authorized_key: Option<PathBuf>,

    /// Disable local login; no password is generated and only SSH works
    #[arg(long, env = "QVSCLI_NO_LOCAL_LOGIN", value_parser = BoolishValueParser::new())]
    pub no_local_login: bool,

    /// Disable cloud-init metadata ISO creation
    #[arg(long, env = "QVSCLI_NO_CLOUD_INIT", value_parser = BoolishValueParser::new())]
    pub no_cloud_init: bool,

    /// Path to VM base image relative to qvs-images-dir
    #[arg(long, env = "QVSCLI_VM_IMAGE", default_value = "ubuntu-cloud/xenial.img")]
    pub image: String,

    /// MAC address of the network interface; created when not set
    #[arg(long, env = "QVSCLI_VM_MAC")]
    pub mac: Option<String>,

    /// Network to attach, get names from 'qvscli net list'
    #[arg(long, visible_alias = "net", env = "QVSCLI_VM_NET", default_value = "br0")]
    pub network: String,

    /// VM description; defaults to one based on the creation time
    #[arg(long, visible_alias = "desc", env = "QVSCLI_VM_DESCRIPTION")]
    pub description: Option<String>,

    /// Number of cores
    #[arg(long, env = "QVSCLI_VM_CORES", default_value_t = 1)]
    pub cores: u32,

    /// Memory in whole gigabytes
    #[arg(long, visible_alias = "mem", env = "QVSCLI_VM_MEM_GB", default_value_t = 2)]
    pub memory: u64,

    /// VNC password up to 8 characters; generated when not set
    #[arg(long, env = "QVSCLI_VM_VNC_PASSWORD")]
    pub vnc_password: Option<String>,
}

/// Host names: letters, digits and inner hyphens, at most 63 characters.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("no instance name provided");
    }
    let pattern = Regex::new(NAME_PATTERN)?;
    if !pattern.is_match(name) {
        bail!("invalid instance name: {}", name);
    }
    Ok(())
}

fn validate_vnc_password(password: &str) -> Result<()> {
    if password.chars().count() > VNC_PASSWORD_MAX {
        bail!(
            "VNC password must be at most {} characters long",
            VNC_PASSWORD_MAX
        );
    }
    Ok(())
}

fn validate_memory(memory_gb: u64) -> Result<()> {
    let spec = VmSpec {
        memory_gb,
        ..Default::default()
    };
    if spec.memory_bytes().is_none() {
        bail!("memory of {} GB is too large", memory_gb);
    }
    Ok(())
}

pub async fn create(ctx: &AppContext, args: &CreateArgs) -> Result<()> {
    let name = args.name.as_str();
    validate_name(name)?;
    validate_memory(args.memory)?;
    if let Some(password) = &args.vnc_password {
        validate_vnc_password(password)?;
    }

    let session = ctx.connect().await?;
    let client = QvsClient::new(&session);
    let disks_dir = ctx.config.disks_dir.as_str();
    let vm_dir = remote_join(disks_dir, name);

    let mac = match args.mac.as_deref().filter(|m| !m.is_empty()) {
        Some(mac) => mac.to_string(),
        None => {
            let mac = client.mac_create().await?;
            tracing::info!("Generated new MAC address for instance: {}", mac);
            mac
        }
    };

    let image_src = remote_join(&ctx.config.images_dir, &args.image);
    let image_name = remote_basename(&args.image);
    let image_found = client
        .list_dir(&remote_parent(&image_src))
        .await?
        .iter()
        .any(|f| f.filename == image_name);
    if !image_found {
        bail!("VM image file not found: {}", args.image);
    }

    let now = Utc::now();
    let ts = now.timestamp();

    let staging = tempfile::Builder::new()
        .prefix("ci-metadata-iso")
        .tempdir()
        .context("Failed to create staging directory")?;

    let iso_dest = if args.no_cloud_init {
        tracing::warn!(
            "cloud-init disabled, skipping metadata ISO creation. You may not be able to log into the VM after booting."
        );
        None
    } else {
        let seed = build_seed(args, ts)?;
        let iso_name = format!("metadata_{}.iso", ts);
        let iso_local = staging.path().join(&iso_name);
        IsoBuilder::default().build(&seed, &iso_local)?;
        Some((iso_local, remote_join(&vm_dir, &iso_name)))
    };

    let dir_exists = client
        .list_dir(disks_dir)
        .await?
        .iter()
        .any(|f| f.filename == name);
    if !dir_exists {
        tracing::info!("Creating directory on NAS for VM: {}", vm_dir);
        client.create_dir(&vm_dir).await?;
    }

    if let Some((local, remote)) = &iso_dest {
        tracing::info!("Uploading metadata ISO image to NAS: {}", remote);
        client.upload_file(local, remote).await?;
    }

    let boot_disk = format!("boot_disk_{}.img", ts);
    let disk_image_path = remote_join(&vm_dir, &boot_disk);
    tracing::info!("Remote copy VM image {} -> {}", image_src, disk_image_path);
    client
        .copy_file(&image_src, &remote_join(&vm_dir, &image_name))
        .await?;
    client.rename_file(&vm_dir, &image_name, &boot_disk).await?;

    let vnc_password = match args.vnc_password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => password.to_string(),
        None => {
            let password = generate_password(VNC_PASSWORD_MAX, 2);
            println!("Your VNC password is: {}", password);
            password
        }
    };

    let spec = VmSpec {
        name: name.to_string(),
        description: args
            .description
            .clone()
            .unwrap_or_else(|| default_description(now)),
        os: OsType::Linux,
        cores: args.cores,
        memory_gb: args.memory,
        network: args.network.clone(),
        mac,
        boot_iso_path: iso_dest.map(|(_, remote)| remote).unwrap_or_default(),
        disk_image_path,
        vnc_password: Some(vnc_password),
    };
    client.vm_create(&spec).await?;

    if args.no_start {
        tracing::warn!(
            "Not starting newly created VM because --no-start was passed. To start it, run: 'qvscli vm start {}'",
            name
        );
        return Ok(());
    }

    let vm = client.vm_get(name).await?;
    client.vm_start(&vm.id_string()).await?;
    let vm = client.vm_get(name).await?;
    match vm.vnc_port() {
        Some(port) => tracing::info!("VM started. VNC port: {}", port),
        None => tracing::info!("VM started"),
    }
    Ok(())
}

/// Override files win; missing ones are generated.
fn build_seed(args: &CreateArgs, ts: i64) -> Result<CloudInitSeed> {
    let meta_data = match &args.meta_data {
        Some(path) => read_override(path, "meta-data")?,
        None => render_meta_data(&args.name, ts),
    };

    let user_data = match &args.user_data {
        Some(path) => read_override(path, "user-data")?,
        None => generated_user_data(args)?,
    };

    Ok(CloudInitSeed::new(meta_data, user_data))
}

fn generated_user_data(args: &CreateArgs) -> Result<String> {
    let key_path = match &args.authorized_key {
        Some(path) => path.clone(),
        None => QvsPaths::default_authorized_key()?,
    };
    let authorized_key = fs::read_to_string(&key_path).with_context(|| {
        format!(
            "could not generate user-data, error reading {} and --authorized-key not provided",
            key_path.display()
        )
    })?;

    let startup_script = args
        .startup_script
        .as_deref()
        .map(|path| {
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read startup script {}", path.display()))
        })
        .transpose()?;

    let local_login = !args.no_local_login;
    let login_password = if local_login {
        let password = generate_password(8, 2);
        println!("Your SSH password is: {}", password);
        password
    } else {
        String::new()
    };

    Ok(render_user_data(&UserDataContext {
        hostname: args.name.clone(),
        local_login,
        login_password,
        startup_script,
        authorized_key,
    })?)
}

fn read_override(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("{} file does not exist: {}", what, path.display()))
}

fn default_description(now: DateTime<Utc>) -> String {
    format!("Created with qvscli at {}", now.format("%Y%m%d%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn args(name: &str) -> CreateArgs {
        CreateArgs {
            name: name.to_string(),
            no_start: false,
            startup_script: None,
            meta_data: None,
            user_data: None,
            authorized_key: None,
            no_local_login: false,
            no_cloud_init: false,
            image: "ubuntu-cloud/xenial.img".to_string(),
            mac: None,
            network: "br0".to_string(),
            description: None,
            cores: 1,
            memory: 2,
            vnc_password: None,
        }
    }

    #[test]
    fn test_valid_names() {
        for name in ["a", "web01", "web-01", "A1b2"] {
            assert!(validate_name(name).is_ok(), "{name}");
        }
        assert!(validate_name(&"a".repeat(63)).is_ok());
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "-web", "web-", "web_01", "web.local", "1"] {
            assert!(validate_name(name).is_err(), "{name}");
        }
        assert!(validate_name(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_vnc_password_length() {
        assert!(validate_vnc_password("12345678").is_ok());
        assert!(validate_vnc_password("123456789").is_err());
    }

    #[test]
    fn test_memory_limit() {
        assert!(validate_memory(2).is_ok());
        assert!(validate_memory(u64::MAX / (1024 * 1024 * 1024)).is_ok());
        assert!(validate_memory(20_000_000_000).is_err());
    }

    #[test]
    fn test_default_description() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(
            default_description(now),
            "Created with qvscli at 20240305070809"
        );
    }

    #[test]
    fn test_seed_uses_overrides() {
        let dir = TempDir::new().unwrap();
        let meta = dir.path().join("meta");
        let user = dir.path().join("user");
        fs::write(&meta, "instance-id: custom\n").unwrap();
        fs::write(&user, "#cloud-config\n").unwrap();

        let mut a = args("web01");
        a.meta_data = Some(meta);
        a.user_data = Some(user);

        let seed = build_seed(&a, 1700000000).unwrap();
        assert_eq!(seed.meta_data, "instance-id: custom\n");
        assert_eq!(seed.user_data, "#cloud-config\n");
    }

    #[test]
    fn test_seed_generates_user_data_from_key() {
        let dir = TempDir::new().unwrap();
        let key = dir.path().join("id.pub");
        let script = dir.path().join("startup.sh");
        fs::write(&key, "ssh-ed25519 AAAA test@host\n").unwrap();
        fs::write(&script, "#!/bin/sh\necho hello\n").unwrap();

        let mut a = args("web01");
        a.authorized_key = Some(key);
        a.startup_script = Some(script);
        a.no_local_login = true;

        let seed = build_seed(&a, 1700000000).unwrap();
        assert!(seed.meta_data.contains("instance-id: web01-1700000000"));
        assert!(seed.user_data.contains("hostname: web01"));
        assert!(seed.user_data.contains("- ssh-ed25519 AAAA test@host"));
        assert!(seed.user_data.contains("    echo hello"));
        assert!(!seed.user_data.contains("ssh_pwauth"));
    }

    #[test]
    fn test_missing_key_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut a = args("web01");
        a.authorized_key = Some(dir.path().join("missing.pub"));

        let err = build_seed(&a, 1).unwrap_err();
        assert!(err.to_string().contains("could not generate user-data"));
    }

    #[test]
    fn test_missing_startup_script_is_an_error() {
        let dir = TempDir::new().unwrap();
        let key = dir.path().join("id.pub");
        fs::write(&key, "ssh-rsa AAAA\n").unwrap();

        let mut a = args("web01");
        a.authorized_key = Some(key);
        a.startup_script = Some(dir.path().join("nope.sh"));

        assert!(build_seed(&a, 1).is_err());
    }
}
