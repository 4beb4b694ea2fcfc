//! cloud-init seed generation for new VMs.

mod iso;
mod password;
mod user_data;

pub use iso::{CloudInitSeed, IsoBuilder};
pub use password::generate_password;
pub use user_data::{UserDataContext, render_meta_data, render_user_data};
