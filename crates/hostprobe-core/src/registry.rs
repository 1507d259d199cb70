//! Transport registry
//!
//! A fixed enum maps every registered transport name to its
//! constructor. Resolution only turns a name into a variant; the
//! concrete shim (and whatever client machinery it drags in) is built
//! when the variant's factory runs, not at registry lookup.

use std::sync::Arc;

use hostprobe_exec::ansible::{self, AnsibleBackend};
use hostprobe_exec::chroot::ChrootBackend;
use hostprobe_exec::docker::DockerBackend;
use hostprobe_exec::kubectl::KubectlBackend;
use hostprobe_exec::local::LocalBackend;
use hostprobe_exec::lxc::LxcBackend;
use hostprobe_exec::openshift::OpenShiftBackend;
use hostprobe_exec::paramiko::ParamikoBackend;
use hostprobe_exec::salt::SaltBackend;
use hostprobe_exec::ssh::SshBackend;
use hostprobe_exec::winrm::WinRmBackend;
use hostprobe_exec::{Backend, BackendOptions, ExecError};

use crate::error::ResolveError;

/// Registered transports, one variant per connection name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Local,
    Ssh,
    SafeSsh,
    Paramiko,
    Salt,
    Docker,
    Podman,
    Ansible,
    Kubectl,
    Winrm,
    Lxc,
    Openshift,
    Chroot,
}

/// Transport used when a hostspec names a host but no connection
pub const DEFAULT_REMOTE: Transport = Transport::Paramiko;

impl Transport {
    /// Registry lookup: connection name to transport.
    ///
    /// Names are case-sensitive; anything unregistered is an error
    /// carrying the offending name.
    pub fn resolve(name: &str) -> Result<Transport, ResolveError> {
        match name {
            "local" => Ok(Transport::Local),
            "ssh" => Ok(Transport::Ssh),
            "safe-ssh" => Ok(Transport::SafeSsh),
            "paramiko" => Ok(Transport::Paramiko),
            "salt" => Ok(Transport::Salt),
            "docker" => Ok(Transport::Docker),
            "podman" => Ok(Transport::Podman),
            "ansible" => Ok(Transport::Ansible),
            "kubectl" => Ok(Transport::Kubectl),
            "winrm" => Ok(Transport::Winrm),
            "lxc" => Ok(Transport::Lxc),
            "openshift" => Ok(Transport::Openshift),
            "chroot" => Ok(Transport::Chroot),
            other => Err(ResolveError::UnknownConnection(other.to_string())),
        }
    }

    /// Registered name of this transport
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Transport::Local => "local",
            Transport::Ssh => "ssh",
            Transport::SafeSsh => "safe-ssh",
            Transport::Paramiko => "paramiko",
            Transport::Salt => "salt",
            Transport::Docker => "docker",
            Transport::Podman => "podman",
            Transport::Ansible => "ansible",
            Transport::Kubectl => "kubectl",
            Transport::Winrm => "winrm",
            Transport::Lxc => "lxc",
            Transport::Openshift => "openshift",
            Transport::Chroot => "chroot",
        }
    }

    /// Expand a hostspec's host into the concrete target names it
    /// covers, before any instance exists.
    ///
    /// An ansible pattern may cover many inventory hosts; every other
    /// transport covers exactly the named target.
    pub async fn expand_targets(
        self,
        host: Option<&str>,
        options: &BackendOptions,
    ) -> Result<Vec<Option<String>>, ExecError> {
        match self {
            Transport::Ansible => {
                let hosts =
                    ansible::list_hosts(host, options.ansible_inventory.as_deref()).await?;
                Ok(hosts.into_iter().map(Some).collect())
            }
            _ => Ok(vec![host.map(str::to_string)]),
        }
    }

    /// Construct a backend instance.
    ///
    /// `local` is the only transport built without a target; everything
    /// else requires one. Option validation happens inside the shim
    /// constructors so misconfiguration surfaces here, not on the first
    /// command.
    pub fn construct(
        self,
        target: Option<&str>,
        options: &BackendOptions,
    ) -> Result<Arc<dyn Backend>, ExecError> {
        // local has no addressable target; anything given is ignored
        if self == Transport::Local {
            return Ok(Arc::new(LocalBackend::new(options)?));
        }

        let target = target.ok_or_else(|| {
            ExecError::Config(format!("transport '{}' requires a target host", self.name()))
        })?;

        Ok(match self {
            Transport::Local => unreachable!("handled above"),
            Transport::Ssh => Arc::new(SshBackend::new(target, options)?),
            Transport::SafeSsh => Arc::new(SshBackend::new_safe(target, options)?),
            Transport::Paramiko => Arc::new(ParamikoBackend::new(target, options)?),
            Transport::Salt => Arc::new(SaltBackend::new(target, options)?),
            Transport::Docker => Arc::new(DockerBackend::new(target, options)?),
            Transport::Podman => Arc::new(DockerBackend::new_podman(target, options)?),
            Transport::Ansible => Arc::new(AnsibleBackend::new(target, options)?),
            Transport::Kubectl => Arc::new(KubectlBackend::new(target, options)?),
            Transport::Winrm => Arc::new(WinRmBackend::new(target, options)?),
            Transport::Lxc => Arc::new(LxcBackend::new(target, options)?),
            Transport::Openshift => Arc::new(OpenShiftBackend::new(target, options)?),
            Transport::Chroot => Arc::new(ChrootBackend::new(target, options)?),
        })
    }
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
