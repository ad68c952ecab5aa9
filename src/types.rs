//! Common argument types
//!
//! Constructors for the argument specs operator CLIs keep redefining (names,
//! addresses, ports, VLANs...) and parsers for the values they capture.
//!
//! ```ignore
//! Command::new("set_address", "set address <addr>", set_address)
//!     .arg(types::ipv4("addr", "IPv4 address"));
//! ```

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::grammar::ArgSpec;

pub const RE_NAME: &str = "[a-zA-Z][a-zA-Z0-9_-]*";
pub const RE_HOSTNAME: &str = "[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?";
pub const RE_IFNAME: &str = "[a-zA-Z][a-zA-Z0-9_.-]*";
pub const RE_FILENAME: &str = "[^ ]+";
pub const RE_IPV4: &str = r"[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}";
pub const RE_IPV4_PREFIX: &str = r"[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}/[0-9]{1,2}";
pub const RE_IPV6: &str = "[0-9a-fA-F:.]+";
pub const RE_IPV6_PREFIX: &str = "[0-9a-fA-F:.]+/[0-9]{1,3}";
pub const RE_MAC: &str = "[0-9a-fA-F]{1,2}(:[0-9a-fA-F]{1,2}){5}";
pub const RE_MAC_ANY: &str = "[0-9a-fA-F]{1,2}([-:][0-9a-fA-F]{1,2}){5}";
pub const RE_HEX: &str = "(0[xX])?[0-9a-fA-F]+";

fn re(id: &str, pattern: &str, help: &str) -> ArgSpec {
    ArgSpec::pattern(id, pattern).with_help(help)
}

fn range(id: &str, min: i64, max: i64, help: &str) -> ArgSpec {
    ArgSpec::int(id, min, max).with_help(help)
}

pub fn name(id: &str, help: &str) -> ArgSpec {
    re(id, RE_NAME, help)
}

pub fn hostname(id: &str, help: &str) -> ArgSpec {
    re(id, RE_HOSTNAME, help)
}

pub fn ifname(id: &str, help: &str) -> ArgSpec {
    re(id, RE_IFNAME, help)
}

pub fn filename(id: &str, help: &str) -> ArgSpec {
    re(id, RE_FILENAME, help)
}

pub fn ipv4(id: &str, help: &str) -> ArgSpec {
    re(id, RE_IPV4, help)
}

pub fn ipv4_prefix(id: &str, help: &str) -> ArgSpec {
    re(id, RE_IPV4_PREFIX, help)
}

pub fn ipv6(id: &str, help: &str) -> ArgSpec {
    re(id, RE_IPV6, help)
}

pub fn ipv6_prefix(id: &str, help: &str) -> ArgSpec {
    re(id, RE_IPV6_PREFIX, help)
}

pub fn mac(id: &str, help: &str) -> ArgSpec {
    re(id, RE_MAC, help)
}

/// MAC address with `:` or `-` separators
pub fn mac_any(id: &str, help: &str) -> ArgSpec {
    re(id, RE_MAC_ANY, help)
}

pub fn hex(id: &str, help: &str) -> ArgSpec {
    re(id, RE_HEX, help)
}

pub fn uint(id: &str, max: i64, help: &str) -> ArgSpec {
    range(id, 0, max, help)
}

pub fn port(id: &str, help: &str) -> ArgSpec {
    range(id, 1, 65535, help)
}

pub fn vlan(id: &str, help: &str) -> ArgSpec {
    range(id, 1, 4094, help)
}

pub fn priority(id: &str, help: &str) -> ArgSpec {
    range(id, 0, 7, help)
}

pub fn dscp(id: &str, help: &str) -> ArgSpec {
    range(id, 0, 63, help)
}

pub fn mtu(id: &str, help: &str) -> ArgSpec {
    range(id, 64, 65535, help)
}

pub fn percent(id: &str, help: &str) -> ArgSpec {
    range(id, 0, 100, help)
}

pub fn on_off(id: &str, help: &str) -> ArgSpec {
    re(id, "on|off", help)
}

pub fn enable_disable(id: &str, help: &str) -> ArgSpec {
    re(id, "enable|disable", help)
}

pub fn yes_no(id: &str, help: &str) -> ArgSpec {
    re(id, "yes|no", help)
}

pub fn parse_ipv4(text: &str) -> Option<Ipv4Addr> {
    text.parse().ok()
}

/// `a.b.c.d/len` with `len <= 32`
pub fn parse_ipv4_prefix(text: &str) -> Option<(Ipv4Addr, u8)> {
    let (addr, len) = text.split_once('/')?;
    let len: u8 = len.parse().ok()?;
    if len > 32 {
        return None;
    }
    Some((parse_ipv4(addr)?, len))
}

pub fn parse_ipv6(text: &str) -> Option<Ipv6Addr> {
    text.parse().ok()
}

/// Six hex octets separated by `:` or `-`
pub fn parse_mac(text: &str) -> Option<[u8; 6]> {
    let separator = if text.contains(':') { ':' } else { '-' };
    let mut mac = [0u8; 6];
    let mut parts = text.split(separator);
    for byte in mac.iter_mut() {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 2 {
            return None;
        }
        *byte = u8::from_str_radix(part, 16).ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(mac)
}

pub fn format_mac(mac: &[u8; 6]) -> String {
    mac.iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// on/enable/yes/true/1 and off/disable/no/false/0, case-insensitive
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "on" | "enable" | "yes" | "true" | "1" => Some(true),
        "off" | "disable" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}
