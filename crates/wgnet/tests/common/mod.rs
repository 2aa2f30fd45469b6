//! Common test utilities for integration tests.
//!
//! Provides `TestLink` for links that are removed on drop, and the
//! `require_*!` skip macros.

use std::io;
use std::process::Command;
use std::sync::Once;
use std::sync::atomic::{AtomicU32, Ordering};

use wgnet::{Result, WgManager, WireguardAdapter};

static LINK_COUNTER: AtomicU32 = AtomicU32::new(0);
static TRACING: Once = Once::new();

/// Generate a unique interface name, at most 15 bytes.
fn unique_link_name(prefix: &str) -> String {
    let id = LINK_COUNTER.fetch_add(1, Ordering::SeqCst);
    let pid = std::process::id() % 10_000;
    format!("{}{}x{}", prefix, pid, id)
}

/// Install a `RUST_LOG`-driven subscriber once per test binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A link that is deleted when dropped.
pub struct TestLink {
    name: String,
}

impl TestLink {
    /// Create a dummy link with `ip link add`, without IPv6 autoconfiguration.
    ///
    /// Fails when `ip` is missing or the kernel has no dummy link support;
    /// tests go through `require_dummy!` to skip in that case.
    pub fn dummy(prefix: &str) -> io::Result<Self> {
        init_tracing();
        let name = unique_link_name(prefix);

        let output = Command::new("ip")
            .args(["link", "add", &name, "type", "dummy"])
            .output()?;

        if !output.status.success() {
            return Err(io::Error::other(format!(
                "ip link add {} type dummy: {}",
                name,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        // no link-local address, so an assigned IPv6 address is the last one seen
        let _ = Command::new("ip")
            .args(["link", "set", "dev", &name, "addrgenmode", "none"])
            .status();

        Ok(Self { name })
    }

    /// Create a WireGuard link through the library.
    pub fn wireguard(prefix: &str, port: u16) -> Result<(Self, wgnet::Device)> {
        init_tracing();
        let name = unique_link_name(prefix);
        let device = WgManager::new().create_device(&name, port)?;
        Ok((Self { name }, device))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for TestLink {
    fn drop(&mut self) {
        let _ = Command::new("ip")
            .args(["link", "del", &self.name])
            .output();
    }
}

/// Check if running as root.
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Skip the test if not running as root.
#[macro_export]
macro_rules! require_root {
    () => {
        if !crate::common::is_root() {
            eprintln!("Skipping test: requires root");
            return Ok(());
        }
    };
}

/// Skip the test if the kernel has no WireGuard support.
#[macro_export]
macro_rules! require_wireguard {
    () => {
        if let Err(e) = wgnet::wireguard::WireguardConnection::new(&wgnet::Config::default()) {
            eprintln!("Skipping test: wireguard unavailable: {}", e);
            return Ok(());
        }
    };
}

/// Create a dummy [`TestLink`], or skip the test if that is not possible.
#[macro_export]
macro_rules! require_dummy {
    ($prefix:expr) => {
        match crate::common::TestLink::dummy($prefix) {
            Ok(link) => link,
            Err(e) => {
                eprintln!("Skipping test: dummy links unavailable: {}", e);
                return Ok(());
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_link_name() {
        let name1 = unique_link_name("wgt");
        let name2 = unique_link_name("wgt");
        assert_ne!(name1, name2);
        assert!(name1.len() < libc::IFNAMSIZ);
        assert!(name1.starts_with("wgt"));
    }
}
