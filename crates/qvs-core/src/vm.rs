//! Virtual machine shapes exchanged with the QVS API.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::QvsError;

const GIB: u64 = 1024 * 1024 * 1024;

/// A VM as returned by `GET /qvs/vms`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vm {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cores: i64,
    #[serde(default)]
    pub memory: u64,
    #[serde(default)]
    pub power_state: String,
    #[serde(default)]
    pub adapters: Vec<VmAdapter>,
    #[serde(default)]
    pub disks: Vec<VmDisk>,
    #[serde(default)]
    pub graphics: Vec<VmGraphics>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VmAdapter {
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub bridge: String,
    #[serde(default)]
    pub model: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VmDisk {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub root_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VmGraphics {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub port: i64,
}

impl Vm {
    pub fn id_string(&self) -> String {
        self.id.to_string()
    }

    /// `true` for `power_state == "stop"`.
    pub fn is_stopped(&self) -> bool {
        self.power_state == "stop"
    }

    /// Matches either the exact name or the numeric id.
    pub fn matches(&self, id_or_name: &str) -> bool {
        self.name == id_or_name || self.id_string() == id_or_name
    }

    pub fn primary_adapter(&self) -> Option<&VmAdapter> {
        self.adapters.first()
    }

    pub fn vnc_port(&self) -> Option<i64> {
        self.graphics.first().map(|g| g.port).filter(|p| *p > 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OsType {
    #[default]
    Linux,
    Windows,
}

impl OsType {
    fn qvs_name(self) -> &'static str {
        match self {
            OsType::Linux => "ubuntuzesty",
            OsType::Windows => "win100",
        }
    }
}

/// What the caller wants; turned into a [`VmCreateRequest`] for the wire.
#[derive(Debug, Clone, Default)]
pub struct VmSpec {
    pub name: String,
    pub description: String,
    pub os: OsType,
    pub cores: u32,
    pub memory_gb: u64,
    pub network: String,
    pub mac: String,
    pub boot_iso_path: String,
    pub disk_image_path: String,
    pub vnc_password: Option<String>,
}

/// Body of `POST /qvs/vms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmCreateRequest {
    pub name: String,
    pub description: String,
    pub os_type: String,
    pub is_agent_enabled: bool,
    pub cores: u32,
    pub memory: u64,
    pub adapters: Vec<AdapterSpec>,
    pub cdroms: Vec<CdromSpec>,
    pub disks: Vec<DiskSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub graphics: Vec<GraphicsSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterSpec {
    pub mac: String,
    pub bridge: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdromSpec {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskSpec {
    pub creating_image: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphicsSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub enable_password: bool,
    pub password: String,
}

impl VmSpec {
    /// Memory in bytes; `None` when `memory_gb` does not fit.
    pub fn memory_bytes(&self) -> Option<u64> {
        self.memory_gb.checked_mul(GIB)
    }
}

impl TryFrom<&VmSpec> for VmCreateRequest {
    type Error = QvsError;

    fn try_from(spec: &VmSpec) -> Result<Self, Self::Error> {
        let memory = spec.memory_bytes().ok_or_else(|| {
            QvsError::invalid_input(format!("memory of {} GB is too large", spec.memory_gb))
        })?;

        // QVS expects the VNC password base64-encoded.
        let graphics = spec
            .vnc_password
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| GraphicsSpec {
                kind: "vnc".to_string(),
                enable_password: true,
                password: BASE64_STANDARD.encode(p.as_bytes()),
            })
            .into_iter()
            .collect();

        Ok(Self {
            name: spec.name.clone(),
            description: spec.description.clone(),
            os_type: spec.os.qvs_name().to_string(),
            is_agent_enabled: true,
            cores: spec.cores,
            memory,
            adapters: vec![AdapterSpec {
                mac: spec.mac.clone(),
                bridge: spec.network.clone(),
                model: "virtio".to_string(),
            }],
            cdroms: Some(spec.boot_iso_path.clone())
                .filter(|p| !p.is_empty())
                .map(|path| CdromSpec { path })
                .into_iter()
                .collect(),
            disks: vec![DiskSpec {
                creating_image: "false".to_string(),
                path: spec.disk_image_path.clone(),
            }],
            graphics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vm_from_api_json() {
        let json = r#"{
            "id": 7,
            "uuid": "u-7",
            "name": "web01",
            "cores": 2,
            "power_state": "running",
            "adapters": [{"mac": "00:11:22:33:44:55", "bridge": "br0", "model": "virtio"}],
            "disks": [{"path": "/VirtualMachines/disks/web01/boot.img", "root_path": "/share/VirtualMachines/disks/web01/boot.img"}],
            "graphics": [{"type": "vnc", "port": 5901}],
            "unknown_field": true
        }"#;
        let vm: Vm = serde_json::from_str(json).unwrap();

        assert!(vm.matches("web01"));
        assert!(vm.matches("7"));
        assert!(!vm.matches("8"));
        assert!(!vm.is_stopped());
        assert_eq!(vm.vnc_port(), Some(5901));
        assert_eq!(vm.primary_adapter().unwrap().bridge, "br0");
    }

    #[test]
    fn test_vnc_port_absent_when_zero() {
        let vm = Vm {
            graphics: vec![VmGraphics {
                kind: "vnc".into(),
                port: 0,
            }],
            ..Default::default()
        };
        assert_eq!(vm.vnc_port(), None);
    }

    #[test]
    fn test_create_request_from_spec() {
        let spec = VmSpec {
            name: "web01".into(),
            description: "test".into(),
            os: OsType::Linux,
            cores: 2,
            memory_gb: 4,
            network: "br0".into(),
            mac: "00:11:22:33:44:55".into(),
            boot_iso_path: "/VirtualMachines/disks/web01/metadata.iso".into(),
            disk_image_path: "/VirtualMachines/disks/web01/boot_disk.img".into(),
            vnc_password: Some("abc".into()),
        };
        let req = VmCreateRequest::try_from(&spec).unwrap();

        assert_eq!(req.os_type, "ubuntuzesty");
        assert_eq!(req.memory, 4 * 1024 * 1024 * 1024);
        assert_eq!(req.adapters[0].model, "virtio");
        assert_eq!(req.disks[0].creating_image, "false");
        assert_eq!(req.graphics[0].password, "YWJj");
        assert_eq!(req.cdroms[0].path, "/VirtualMachines/disks/web01/metadata.iso");
    }

    #[test]
    fn test_create_request_without_vnc_password() {
        let spec = VmSpec {
            os: OsType::Windows,
            ..Default::default()
        };
        let req = VmCreateRequest::try_from(&spec).unwrap();
        assert_eq!(req.os_type, "win100");
        assert!(req.graphics.is_empty());
        assert!(req.cdroms.is_empty());

        let value = serde_json::to_value(&req).unwrap();
        assert!(value.get("graphics").is_none());
    }

    #[test]
    fn test_memory_overflow_is_rejected() {
        let largest = u64::MAX / GIB;
        let fits = VmSpec {
            memory_gb: largest,
            ..Default::default()
        };
        assert_eq!(
            VmCreateRequest::try_from(&fits).unwrap().memory,
            largest * GIB
        );

        let spec = VmSpec {
            memory_gb: largest + 1,
            ..Default::default()
        };
        assert!(spec.memory_bytes().is_none());
        assert!(matches!(
            VmCreateRequest::try_from(&spec),
            Err(QvsError::InvalidInput(_))
        ));

        let spec = VmSpec {
            memory_gb: 20_000_000_000,
            ..Default::default()
        };
        assert!(VmCreateRequest::try_from(&spec).is_err());
    }
}
