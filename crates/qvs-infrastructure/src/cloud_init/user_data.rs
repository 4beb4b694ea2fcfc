//! cloud-init `meta-data` and `user-data` documents.

use minijinja::{Environment, context};
use qvs_core::Result;

const USER_DATA_TEMPLATE: &str = r#"#cloud-config
hostname: {{ hostname }}
{%- if local_login %}

password: "{{ login_password }}"
ssh_pwauth: True
chpasswd: { expire: False }
{%- endif %}

write_files:
- path: /etc/network/if-up.d/show-ip-address
  permissions: '0755'
  content: |
    #!/bin/sh
    egrep -q -e "eth0=[0-9].*" /etc/issue && exit 0
    sed -i'' 's/\\n \\l.*$/\\n \\l '"eth0=$(hostname -I)"'/g' /etc/issue
{%- if startup_script %}
- path: /var/lib/cloud/scripts/per-instance/startup-script.sh
  permissions: '0755'
  content: |
{{ startup_script|indent(4, true) }}
{%- endif %}

ssh_authorized_keys:
- {{ authorized_key }}
power_state:
  mode: reboot
"#;

/// Inputs for the generated `user-data`.
#[derive(Debug, Clone, Default)]
pub struct UserDataContext {
    pub hostname: String,
    /// Emit a console password; otherwise only SSH keys work.
    pub local_login: bool,
    pub login_password: String,
    pub startup_script: Option<String>,
    pub authorized_key: String,
}

pub fn render_user_data(ctx: &UserDataContext) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("user-data", USER_DATA_TEMPLATE)?;
    let template = env.get_template("user-data")?;

    let startup_script = ctx
        .startup_script
        .as_deref()
        .map(str::trim_end)
        .filter(|s| !s.is_empty());

    let rendered = template.render(context! {
        hostname => ctx.hostname,
        local_login => ctx.local_login,
        login_password => ctx.login_password,
        startup_script => startup_script,
        authorized_key => ctx.authorized_key.trim(),
    })?;
    Ok(format!("{}\n", rendered.trim_end()))
}

pub fn render_meta_data(hostname: &str, timestamp: i64) -> String {
    format!(
        "instance-id: {}-{}\nlocal-hostname: {}\n",
        hostname, timestamp, hostname
    )
}
