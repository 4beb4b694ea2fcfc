pub mod images;
pub mod login;
pub mod mac;
pub mod networks;
pub mod snapshot;
pub mod vm;
pub mod vm_create;
