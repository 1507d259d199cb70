//! Hostspec parsing
//!
//! A hostspec is `[transport://][host][?query]`. Without the scheme
//! delimiter the whole string is the host; with it, the scheme names
//! the transport, the authority is kept verbatim (per-transport
//! decomposition happens inside the backend), and the query carries
//! connection options. Unknown query keys are dropped without error so
//! newer hostspec strings keep working against older binaries.

use std::collections::HashSet;
use std::path::PathBuf;

use url::form_urlencoded;

use hostprobe_exec::BackendOptions;

/// Parsed hostspec: target plus normalized options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSpec {
    /// Target authority; `None` when the specification carries no address
    pub host: Option<String>,
    /// Options from the scheme and query string
    pub options: BackendOptions,
}

/// Parse a single hostspec string. Never fails.
#[must_use]
pub fn parse_hostspec(hostspec: &str) -> HostSpec {
    let Some((scheme, rest)) = hostspec.split_once("://") else {
        return HostSpec {
            host: (!hostspec.is_empty()).then(|| hostspec.to_string()),
            options: BackendOptions::default(),
        };
    };

    // schemes are case-insensitive; registered names are lowercase
    let mut options = BackendOptions::default().with_connection(scheme.to_ascii_lowercase());

    let rest = rest.split('#').next().unwrap_or(rest);
    let (authority, query) = match rest.split_once('?') {
        Some((authority, query)) => (authority, Some(query)),
        None => (rest, None),
    };

    if let Some(query) = query {
        apply_query(&mut options, query);
    }

    HostSpec {
        host: (!authority.is_empty()).then(|| authority.to_string()),
        options,
    }
}

fn apply_query(options: &mut BackendOptions, query: &str) {
    let mut seen = HashSet::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        // only the first value per key is consulted
        if !seen.insert(key.to_string()) {
            continue;
        }
        match key.as_ref() {
            // boolean flags: set only when the value is literally "true"
            "sudo" => options.sudo = value.eq_ignore_ascii_case("true"),
            "ssl" => options.ssl = value.eq_ignore_ascii_case("true"),
            "no_ssl" => options.no_ssl = value.eq_ignore_ascii_case("true"),
            "no_verify_ssl" => options.no_verify_ssl = value.eq_ignore_ascii_case("true"),
            "force_ansible" => options.force_ansible = value.eq_ignore_ascii_case("true"),

            // string-valued options, passed through verbatim
            "sudo_user" => options.sudo_user = Some(value.into_owned()),
            "namespace" => options.namespace = Some(value.into_owned()),
            "container" => options.container = Some(value.into_owned()),
            "read_timeout_sec" => options.read_timeout_sec = Some(value.into_owned()),
            "operation_timeout_sec" => {
                options.operation_timeout_sec = Some(value.into_owned());
            }
            "timeout" => options.timeout = Some(value.into_owned()),
            "controlpersist" => options.controlpersist = Some(value.into_owned()),
            "kubeconfig" => options.kubeconfig = Some(value.into_owned()),
            "context" => options.context = Some(value.into_owned()),

            // path-valued options, with `~` expanded
            "ssh_config" => options.ssh_config = Some(expanduser(&value)),
            "ansible_inventory" => options.ansible_inventory = Some(expanduser(&value)),
            "ssh_identity_file" => options.ssh_identity_file = Some(expanduser(&value)),

            // unknown keys are not a failure condition
            _ => {}
        }
    }
}

fn expanduser(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_scheme_is_all_host() {
        let spec = parse_hostspec("web01.example.com");
        assert_eq!(spec.host.as_deref(), Some("web01.example.com"));
        assert_eq!(spec.options, BackendOptions::default());

        // without a scheme delimiter, nothing is treated as a query
        let spec = parse_hostspec("web01.example.com?sudo=true");
        assert_eq!(spec.host.as_deref(), Some("web01.example.com?sudo=true"));
        assert!(!spec.options.sudo);
    }

    #[test]
    fn test_scheme_becomes_connection() {
        let spec = parse_hostspec("docker://app@web-1");
        assert_eq!(spec.options.connection.as_deref(), Some("docker"));
        assert_eq!(spec.host.as_deref(), Some("app@web-1"));

        // scheme is case-insensitive
        let spec = parse_hostspec("SSH://web01");
        assert_eq!(spec.options.connection.as_deref(), Some("ssh"));
    }

    #[test]
    fn test_empty_authority_is_no_host() {
        let spec = parse_hostspec("local://");
        assert_eq!(spec.host, None);
        assert_eq!(spec.options.connection.as_deref(), Some("local"));

        let spec = parse_hostspec("local://?sudo=true");
        assert_eq!(spec.host, None);
        assert!(spec.options.sudo);
    }

    #[test]
    fn test_authority_kept_verbatim() {
        let spec = parse_hostspec("ssh://Admin@Web01:2222");
        assert_eq!(spec.host.as_deref(), Some("Admin@Web01:2222"));
    }

    #[test]
    fn test_boolean_flags_require_literal_true() {
        for value in ["true", "True", "TRUE"] {
            let spec = parse_hostspec(&format!("ssh://h?sudo={value}"));
            assert!(spec.options.sudo, "sudo={value} should set the flag");
        }
        for value in ["1", "yes", "", "false", "sudo"] {
            let spec = parse_hostspec(&format!("ssh://h?sudo={value}"));
            assert!(!spec.options.sudo, "sudo={value} should not set the flag");
        }
    }

    #[test]
    fn test_first_query_value_wins() {
        let spec = parse_hostspec("ssh://h?timeout=10&timeout=20");
        assert_eq!(spec.options.timeout.as_deref(), Some("10"));

        let spec = parse_hostspec("ssh://h?sudo=false&sudo=true");
        assert!(!spec.options.sudo);
    }

    #[test]
    fn test_string_options_verbatim() {
        let spec = parse_hostspec("kubectl://pod-0?namespace=monitoring&container=sidecar");
        assert_eq!(spec.options.namespace.as_deref(), Some("monitoring"));
        assert_eq!(spec.options.container.as_deref(), Some("sidecar"));
    }

    #[test]
    fn test_percent_decoding() {
        let spec = parse_hostspec("ssh://h?sudo_user=svc%20account");
        assert_eq!(spec.options.sudo_user.as_deref(), Some("svc account"));
    }

    #[test]
    fn test_path_options_expand_home() {
        let spec = parse_hostspec("ssh://h?ssh_identity_file=~/.ssh/id_ed25519");
        let expanded = spec.options.ssh_identity_file.unwrap();
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, home.join(".ssh/id_ed25519"));
        }

        let spec = parse_hostspec("ssh://h?ssh_config=/etc/ssh/config");
        assert_eq!(
            spec.options.ssh_config.unwrap(),
            PathBuf::from("/etc/ssh/config")
        );
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let spec = parse_hostspec("ssh://h?sudo=true&future_option=value&color=blue");
        assert!(spec.options.sudo);
        assert_eq!(spec.host.as_deref(), Some("h"));
    }
}
