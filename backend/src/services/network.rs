//! LAN bootstrap helpers for shop-floor devices
//!
//! A device on the shop network reaches the server by hostname. These helpers
//! find the address other machines should use, check the server port answers
//! there and pin the hostname in the local hosts file.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::path::Path;
use std::time::Duration;

use tokio::net::TcpStream;

/// Address of the interface that routes outward.
///
/// Connecting a UDP socket sends no packets; it only asks the OS to pick the
/// outbound interface.
pub fn detect_lan_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect(("8.8.8.8", 80)).ok()?;
    let ip = socket.local_addr().ok()?.ip();
    if ip.is_unspecified() || ip.is_loopback() {
        None
    } else {
        Some(ip)
    }
}

pub async fn is_reachable(host: IpAddr, port: u16, timeout: Duration) -> bool {
    let addr = SocketAddr::new(host, port);
    matches!(
        tokio::time::timeout(timeout, TcpStream::connect(addr)).await,
        Ok(Ok(_))
    )
}

/// Replace every line that maps `hostname` with a single `ip hostname` entry,
/// appending it when absent. Comments and other entries are kept as they are.
pub fn rewrite_hosts(contents: &str, hostname: &str, ip: IpAddr) -> String {
    let entry = format!("{ip}\t{hostname}");
    let mut out = Vec::new();
    let mut placed = false;

    for line in contents.lines() {
        let maps_host = {
            let body = line.split('#').next().unwrap_or_default();
            let mut fields = body.split_whitespace();
            fields.next().is_some() && fields.any(|name| name.eq_ignore_ascii_case(hostname))
        };

        if maps_host {
            if !placed {
                out.push(entry.clone());
                placed = true;
            }
        } else {
            out.push(line.to_string());
        }
    }

    if !placed {
        out.push(entry);
    }

    let mut rewritten = out.join("\n");
    rewritten.push('\n');
    rewritten
}

/// Returns `true` when the file changed.
pub fn update_hosts_file(path: &Path, hostname: &str, ip: IpAddr) -> io::Result<bool> {
    let current = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };

    let updated = rewrite_hosts(&current, hostname, ip);
    if updated == current {
        return Ok(false);
    }

    std::fs::write(path, updated)?;
    tracing::info!(path = %path.display(), hostname, %ip, "Hosts file updated");
    Ok(true)
}
