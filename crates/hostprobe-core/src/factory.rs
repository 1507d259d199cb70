//! Backend factory and set resolver

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use hostprobe_exec::{Backend, BackendOptions};

use crate::error::ResolveError;
use crate::hostspec::{HostSpec, parse_hostspec};
use crate::registry::{DEFAULT_REMOTE, Transport};

/// Identity of a backend instance: target name plus full option set
type BackendKey = (Option<String>, BackendOptions);

/// Build one backend from a hostspec.
///
/// Caller defaults fill option holes (never overwriting the hostspec);
/// a missing connection falls back to the full SSH transport. A single
/// named host is assumed to be remote, which is why this default
/// differs from [`get_backends`].
pub fn get_backend(
    hostspec: &str,
    defaults: &BackendOptions,
) -> Result<Arc<dyn Backend>, ResolveError> {
    let HostSpec { host, options } = parse_hostspec(hostspec);
    let mut options = options.merge_defaults(defaults);
    if options.connection.is_none() {
        options.connection = Some(DEFAULT_REMOTE.name().to_string());
    }

    let connection = options.connection.as_deref().unwrap_or_default();
    let transport = Transport::resolve(connection)?;

    debug!(hostspec = %hostspec, transport = %transport, "building backend");

    transport
        .construct(host.as_deref(), &options)
        .map_err(|source| ResolveError::Backend {
            hostspec: hostspec.to_string(),
            source,
        })
}

/// Resolve a batch of hostspecs into deduplicated backends.
///
/// Order-preserving over first occurrence. Two hostspecs that resolve
/// to the same `(target, options)` key share one instance; the result
/// holds one entry per distinct key. A bad hostspec anywhere aborts the
/// whole batch, because silently dropping a misconfigured target would
/// hide exactly the failures this crate exists to surface.
///
/// The connection default here is two-step: no host and no connection
/// means the local machine, a host without a connection means the full
/// SSH transport, and an explicit connection always wins. When the
/// connection was defaulted it is not written into the options, so it
/// does not participate in the dedup key.
pub async fn get_backends<I, S>(
    hostspecs: I,
    defaults: &BackendOptions,
) -> Result<Vec<Arc<dyn Backend>>, ResolveError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashSet<BackendKey> = HashSet::new();
    let mut backends: Vec<Arc<dyn Backend>> = Vec::new();

    for hostspec in hostspecs {
        let hostspec = hostspec.as_ref();
        let HostSpec { host, options } = parse_hostspec(hostspec);
        let options = options.merge_defaults(defaults);

        let transport = match options.connection.as_deref() {
            Some(name) => Transport::resolve(name)?,
            None if host.is_none() => Transport::Local,
            None => DEFAULT_REMOTE,
        };

        let wrap = |source| ResolveError::Backend {
            hostspec: hostspec.to_string(),
            source,
        };

        let targets = transport
            .expand_targets(host.as_deref(), &options)
            .await
            .map_err(wrap)?;

        for target in targets {
            let key = (target.clone(), options.clone());
            if seen.contains(&key) {
                continue;
            }
            let backend = transport
                .construct(target.as_deref(), &options)
                .map_err(wrap)?;
            debug!(
                hostspec = %hostspec,
                transport = %transport,
                target = target.as_deref().unwrap_or("<local>"),
                "resolved backend"
            );
            seen.insert(key);
            backends.push(backend);
        }
    }

    Ok(backends)
}
