use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use hostprobe_checks::{CheckError, File, Group, Package, Service, User};
use hostprobe_exec::quote;
use hostprobe_exec::{Backend, CommandResult, ExecError};

/// Backend with scripted responses, keyed by the encoded command
#[derive(Debug)]
struct MockBackend {
    responses: HashMap<String, (i32, String)>,
}

impl MockBackend {
    fn new(responses: &[(&str, i32, &str)]) -> Arc<Self> {
        Arc::new(Self {
            responses: responses
                .iter()
                .map(|(cmd, status, stdout)| {
                    ((*cmd).to_string(), (*status, (*stdout).to_string()))
                })
                .collect(),
        })
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn connection_type(&self) -> &'static str {
        "mock"
    }

    fn target(&self) -> Option<&str> {
        None
    }

    async fn run(&self, template: &str, args: &[&str]) -> Result<CommandResult, ExecError> {
        let command = quote::encode(template, args)?;
        let (status, stdout) = self
            .responses
            .get(&command)
            .cloned()
            .unwrap_or((127, String::new()));
        Ok(CommandResult {
            command,
            status,
            stdout,
            stderr: String::new(),
            duration: Duration::from_millis(1),
        })
    }
}

#[tokio::test]
async fn group_exists_branches_on_getent_exit_code() {
    let backend = MockBackend::new(&[("getent group wheel", 0, "wheel:x:10:root\n")]);
    assert!(Group::new(backend, "wheel").exists().await.unwrap());

    let backend = MockBackend::new(&[("getent group nosuchgroup", 2, "")]);
    assert!(!Group::new(backend, "nosuchgroup").exists().await.unwrap());
}

#[tokio::test]
async fn group_gid_and_members() {
    let backend = MockBackend::new(&[
        ("getent group wheel | cut -d':' -f3", 0, "10\n"),
        ("getent group wheel | cut -d':' -f4", 0, "root,admin\n"),
    ]);
    let group = Group::new(backend, "wheel");

    assert_eq!(group.gid().await.unwrap(), 10);
    assert_eq!(group.members().await.unwrap(), vec!["root", "admin"]);
}

#[tokio::test]
async fn group_with_no_members_is_empty_not_one_blank() {
    let backend = MockBackend::new(&[("getent group wheel | cut -d':' -f4", 0, "\n")]);
    let members = Group::new(backend, "wheel").members().await.unwrap();
    assert!(members.is_empty());
}

#[tokio::test]
async fn group_listing_takes_first_column() {
    let backend = MockBackend::new(&[(
        "getent group",
        0,
        "root:x:0:\nwheel:x:10:root\ndaemon:x:2:\n",
    )]);
    let all = Group::new(backend, "any").all_groups().await.unwrap();
    assert_eq!(all, vec!["root", "wheel", "daemon"]);
}

#[tokio::test]
async fn group_gid_garbage_is_a_parse_error() {
    let backend = MockBackend::new(&[("getent group wheel | cut -d':' -f3", 0, "teeth\n")]);
    let err = Group::new(backend, "wheel").gid().await.unwrap_err();
    assert!(matches!(err, CheckError::Parse(_)));
}

#[tokio::test]
async fn unexpected_exit_code_surfaces_as_command_failure() {
    // getent exiting 1 (database unavailable) is outside the allowed set
    let backend = MockBackend::new(&[("getent group wheel", 1, "")]);
    let err = Group::new(backend, "wheel").exists().await.unwrap_err();
    assert!(matches!(
        err,
        CheckError::Exec(ExecError::CommandFailed { status: 1, .. })
    ));
}

#[tokio::test]
async fn user_identity_and_groups() {
    let backend = MockBackend::new(&[
        ("getent passwd deploy", 0, "deploy:x:1001:1001::/home/deploy:/bin/sh\n"),
        ("id -u deploy", 0, "1001\n"),
        ("id -nG deploy", 0, "deploy docker wheel\n"),
        ("getent passwd deploy | cut -d':' -f7", 0, "/bin/sh\n"),
    ]);
    let user = User::new(backend, "deploy");

    assert!(user.exists().await.unwrap());
    assert_eq!(user.uid().await.unwrap(), 1001);
    assert_eq!(
        user.groups().await.unwrap(),
        vec!["deploy", "docker", "wheel"]
    );
    assert_eq!(user.shell().await.unwrap(), "/bin/sh");
}

#[tokio::test]
async fn file_mode_is_octal() {
    let backend = MockBackend::new(&[
        ("test -f /etc/passwd", 0, ""),
        ("stat -c %a /etc/passwd", 0, "644\n"),
        ("stat -c %U /etc/passwd", 0, "root\n"),
    ]);
    let file = File::new(backend, "/etc/passwd");

    assert!(file.is_file().await.unwrap());
    assert_eq!(file.mode().await.unwrap(), 0o644);
    assert_eq!(file.owner().await.unwrap(), "root");
}

#[tokio::test]
async fn missing_file_reports_absent() {
    let backend = MockBackend::new(&[("test -e /nope", 1, "")]);
    assert!(!File::new(backend, "/nope").exists().await.unwrap());
}

#[tokio::test]
async fn package_check_probes_dpkg_first() {
    let backend = MockBackend::new(&[
        ("command -v dpkg-query", 0, "/usr/bin/dpkg-query\n"),
        (
            "dpkg-query -f '${Status}' -W openssh-server",
            0,
            "install ok installed",
        ),
        (
            "dpkg-query -f '${Version}' -W openssh-server",
            0,
            "1:9.2p1-2\n",
        ),
    ]);
    let package = Package::new(backend, "openssh-server");

    assert!(package.is_installed().await.unwrap());
    assert_eq!(package.version().await.unwrap(), "1:9.2p1-2");
}

#[tokio::test]
async fn package_check_falls_back_to_rpm() {
    let backend = MockBackend::new(&[
        ("command -v dpkg-query", 127, ""),
        ("command -v rpm", 0, "/usr/bin/rpm\n"),
        ("rpm -q bash", 0, "bash-5.2.26-1.fc40.x86_64\n"),
    ]);
    assert!(Package::new(backend, "bash").is_installed().await.unwrap());
}

#[tokio::test]
async fn package_without_any_provider_is_unsupported() {
    let backend = MockBackend::new(&[
        ("command -v dpkg-query", 127, ""),
        ("command -v rpm", 127, ""),
    ]);
    let err = Package::new(backend, "bash").is_installed().await.unwrap_err();
    assert!(matches!(err, CheckError::PackageProviderNotFound));
}

#[tokio::test]
async fn service_states() {
    let backend = MockBackend::new(&[
        ("systemctl is-active sshd", 0, "active\n"),
        ("systemctl is-enabled sshd", 0, "enabled\n"),
    ]);
    let service = Service::new(backend, "sshd");
    assert!(service.is_running().await.unwrap());
    assert!(service.is_enabled().await.unwrap());

    let backend = MockBackend::new(&[
        ("systemctl is-active crond", 3, "inactive\n"),
        ("systemctl is-enabled crond", 1, "disabled\n"),
    ]);
    let service = Service::new(backend, "crond");
    assert!(!service.is_running().await.unwrap());
    assert!(!service.is_enabled().await.unwrap());
}
