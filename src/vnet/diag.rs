//! Post-start health checks for the VNet network stack.
//!
//! Best-effort: callers only log the result.

use anyhow::{bail, Context, Result};
use std::fmt;
use std::net::Ipv6Addr;

use super::NetworkStackInfo;
use crate::config::DiagConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed(String),
    Skipped,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Passed => write!(f, "passed"),
            Outcome::Failed(reason) => write!(f, "failed: {}", reason),
            Outcome::Skipped => write!(f, "skipped"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Check {
    pub name: &'static str,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default)]
pub struct Report {
    pub checks: Vec<Check>,
}

impl Report {
    fn push(&mut self, name: &'static str, outcome: Outcome) {
        self.checks.push(Check { name, outcome });
    }

    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks
            .iter()
            .filter(|c| matches!(c.outcome, Outcome::Failed(_)))
    }

    /// Turn failed checks into an error
    pub fn into_result(self) -> Result<Self> {
        let failures: Vec<String> = self
            .failures()
            .map(|c| format!("{} ({})", c.name, c.outcome))
            .collect();
        if !failures.is_empty() {
            bail!(
                "diagnostics found {} problem(s): {}",
                failures.len(),
                failures.join("; ")
            );
        }
        Ok(self)
    }
}

/// Run diagnostics against a snapshot of the network stack.
#[cfg(target_os = "linux")]
pub async fn run_diagnostics(config: &DiagConfig, info: &NetworkStackInfo) -> Result<Report> {
    let mut report = Report::default();

    let iface_path = std::path::Path::new("/sys/class/net").join(&info.interface_name);
    let outcome = if tokio::fs::metadata(&iface_path).await.is_ok() {
        Outcome::Passed
    } else {
        Outcome::Failed(format!("interface {} not found", info.interface_name))
    };
    report.push("interface", outcome);

    if config.check_routes {
        let table = tokio::fs::read_to_string("/proc/net/ipv6_route")
            .await
            .context("reading /proc/net/ipv6_route")?;
        let routes = parse_ipv6_routes(&table);
        let prefix = Ipv6Prefix::parse(&info.ipv6_prefix)?;
        report.push("routes", check_routes(&routes, &prefix, &info.interface_name));
    } else {
        report.push("routes", Outcome::Skipped);
    }

    if config.check_dns {
        let outcome = match tokio::fs::read_to_string("/etc/resolv.conf").await {
            Ok(resolv) if nameservers(&resolv).next().is_some() => Outcome::Passed,
            Ok(_) => Outcome::Failed("no nameservers in /etc/resolv.conf".to_string()),
            Err(e) => Outcome::Failed(format!("reading /etc/resolv.conf: {}", e)),
        };
        report.push("dns", outcome);
    } else {
        report.push("dns", Outcome::Skipped);
    }

    report.into_result()
}

#[cfg(not(target_os = "linux"))]
pub async fn run_diagnostics(_config: &DiagConfig, _info: &NetworkStackInfo) -> Result<Report> {
    bail!("diagnostics are not supported on this platform")
}

/// An IPv6 network in CIDR form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv6Prefix {
    pub addr: Ipv6Addr,
    pub len: u8,
}

impl Ipv6Prefix {
    pub fn parse(s: &str) -> Result<Self> {
        let (addr, len) = s
            .split_once('/')
            .with_context(|| format!("IPv6 prefix {} has no length", s))?;
        let addr: Ipv6Addr = addr
            .parse()
            .with_context(|| format!("parsing IPv6 prefix {}", s))?;
        let len: u8 = len
            .parse()
            .with_context(|| format!("parsing IPv6 prefix length {}", s))?;
        if len > 128 {
            bail!("IPv6 prefix length {} out of range", len);
        }
        Ok(Self { addr, len })
    }

    fn mask(len: u8) -> u128 {
        if len == 0 {
            0
        } else {
            u128::MAX << (128 - u32::from(len))
        }
    }

    /// Whether the two networks share any address
    pub fn overlaps(&self, other: &Ipv6Prefix) -> bool {
        let len = self.len.min(other.len);
        let mask = Self::mask(len);
        u128::from(self.addr) & mask == u128::from(other.addr) & mask
    }
}

/// One row of `/proc/net/ipv6_route`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub dest: Ipv6Prefix,
    pub iface: String,
}

/// Parse `/proc/net/ipv6_route`, skipping malformed rows.
///
/// Columns: dest, dest_len, src, src_len, next_hop, metric, refcnt, use,
/// flags, iface. Addresses are 32 hex digits, lengths 2.
pub fn parse_ipv6_routes(table: &str) -> Vec<Route> {
    table
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 10 {
                return None;
            }
            let addr = u128::from_str_radix(fields[0], 16).ok()?;
            let len = u8::from_str_radix(fields[1], 16).ok()?;
            Some(Route {
                dest: Ipv6Prefix {
                    addr: Ipv6Addr::from(addr),
                    len,
                },
                iface: fields[9].to_string(),
            })
        })
        .collect()
}

/// VNet's prefix must be routed to its interface and nowhere else.
pub fn check_routes(routes: &[Route], prefix: &Ipv6Prefix, iface: &str) -> Outcome {
    let routed = routes
        .iter()
        .any(|r| r.iface == iface && r.dest.len == prefix.len && r.dest.overlaps(prefix));
    if !routed {
        return Outcome::Failed(format!(
            "no route for {}/{} via {}",
            prefix.addr, prefix.len, iface
        ));
    }

    // Default and loopback routes never conflict
    let conflicts: Vec<String> = routes
        .iter()
        .filter(|r| r.iface != iface && r.iface != "lo" && r.dest.len > 0)
        .filter(|r| r.dest.overlaps(prefix))
        .map(|r| format!("{}/{} via {}", r.dest.addr, r.dest.len, r.iface))
        .collect();
    if !conflicts.is_empty() {
        return Outcome::Failed(format!("conflicting routes: {}", conflicts.join(", ")));
    }

    Outcome::Passed
}

pub fn nameservers(resolv: &str) -> impl Iterator<Item = &str> {
    resolv
        .lines()
        .filter_map(|line| line.trim().strip_prefix("nameserver "))
        .map(str::trim)
}
