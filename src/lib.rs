use std::io::{self, Write};
use crate::config::TraceConfig;
use crate::error::{Result, TraceError};
use crate::probe::{IcmpProbe, NetworkProbe};
use crate::prober::HopProber;
use crate::resolver::{AddressFamily, AddressSet, NameLookup, SystemLookup};
use crate::session::{SessionState, Target};

pub mod cli;
pub mod config;
pub mod error;
pub mod hop;
pub mod packet;
pub mod probe;
pub mod prober;
pub mod resolver;
pub mod session;

#[cfg(test)]
mod testing;

/// Resolves both ends, prints what was found, then traces every address family
/// that both the local host and the target have.
pub fn run(hostname: &str, config: &TraceConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(TraceError::Runtime)?;

    let local_name = resolver::local_hostname().unwrap_or_else(|e| {
        log::warn!("{e}");
        "localhost".to_string()
    });
    let (local, remote) = runtime.block_on(async {
        tokio::join!(resolver::resolve(&local_name), resolver::resolve(hostname))
    });
    let local = local.unwrap_or_else(|e| {
        log::warn!("{e}");
        AddressSet::default()
    });

    let stdout = io::stdout();
    let mut out = stdout.lock();
    report(
        &mut out,
        &local_name,
        &local,
        hostname,
        remote,
        config,
        IcmpProbe::new,
        SystemLookup,
    )
}

/// Writes both address headers and then one section per address family.
///
/// A failed target resolution still gets its (empty) header before the error
/// is returned. `open_probe` is called once for every family that can be
/// traced; a family whose probe cannot be opened is skipped, and the first
/// such error is returned only when no family could be traced at all.
#[allow(clippy::too_many_arguments)]
pub fn report<P, L>(
    out: &mut impl Write,
    local_name: &str,
    local: &AddressSet,
    hostname: &str,
    remote: Result<AddressSet>,
    config: &TraceConfig,
    mut open_probe: impl FnMut(AddressFamily) -> Result<P>,
    lookup: L,
) -> Result<()>
where
    P: NetworkProbe,
    L: NameLookup,
{
    write_addresses(out, local_name, local)?;
    let remote = match remote {
        Ok(remote) => remote,
        Err(e) => {
            write_addresses(out, hostname, &AddressSet::default())?;
            return Err(e);
        }
    };
    write_addresses(out, hostname, &remote)?;

    let targets = plan_traces(local, &remote);
    let mut socket_error = None;
    let mut traced = 0;
    for (section, family) in AddressFamily::ALL.into_iter().enumerate() {
        if section > 0 {
            writeln!(out).map_err(TraceError::Output)?;
        }
        let Some(target) = targets.iter().find(|target| target.family() == family) else {
            continue;
        };
        writeln!(out, "Can perform {family} Traceroute").map_err(TraceError::Output)?;
        match open_probe(family) {
            Ok(probe) => {
                let mut prober = HopProber::new(probe, &lookup, config.clone());
                print_trace(out, &mut prober, *target)?;
                traced += 1;
            }
            Err(e) => {
                log::error!("skipping {family} trace: {e}");
                eprintln!("{e}");
                if socket_error.is_none() {
                    socket_error = Some(e);
                }
            }
        }
    }

    match socket_error {
        Some(e) if traced == 0 => Err(e),
        _ => Ok(()),
    }
}

/// One target per family that has an address on both ends, IPv4 first.
pub fn plan_traces(local: &AddressSet, remote: &AddressSet) -> Vec<Target> {
    AddressFamily::ALL
        .into_iter()
        .filter(|family| local.get(*family).is_some())
        .filter_map(|family| remote.get(family))
        .map(Target::new)
        .collect()
}

fn write_addresses(out: &mut impl Write, host: &str, addresses: &AddressSet) -> Result<()> {
    write!(out, "{host} addresses\n\n{addresses}\n").map_err(TraceError::Output)
}

/// Prints one line per hop as the trace advances and returns how it ended.
pub fn print_trace<P: NetworkProbe, L: NameLookup>(
    out: &mut impl Write,
    prober: &mut HopProber<P, L>,
    target: Target,
) -> Result<SessionState> {
    let mut trace = prober.trace(target);
    for hop in trace.by_ref() {
        writeln!(out, "{hop}").map_err(TraceError::Output)?;
    }
    let state = trace.state();
    if let SessionState::Aborted {
        consecutive_timeouts, ..
    } = state
    {
        writeln!(out, "{consecutive_timeouts} consecutive timeouts, stopping traceroute.")
            .map_err(TraceError::Output)?;
    }
    Ok(state)
}
