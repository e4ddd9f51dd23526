//! Parses two log line shapes into `heatmap_core::Event`:
//!
//! - **honeypot**: `<epoch>[.<micros>] <src_ip>:<src_port> -> <dst_ip>:<dst_port> <proto>`
//! - **FortiGate**: syslog `key=value` pairs with `date=`, `time=`, `srcip=`,
//!   `srcport=`, `dstip=`, `dstport=`, `proto=`.
//!
//! A line matching neither shape is not an error — it just doesn't produce
//! an event. The driver counts these as parse failures and keeps going.

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use heatmap_core::{Event, Protocol};
use std::net::Ipv4Addr;

pub fn parse_line(line: &str) -> Option<Event> {
    parse_honeypot(line).or_else(|| parse_fortigate(line))
}

fn parse_honeypot(line: &str) -> Option<Event> {
    let mut parts = line.split_whitespace();
    let ts = parts.next()?;
    let src = parts.next()?;
    if parts.next()? != "->" {
        return None;
    }
    let dst = parts.next()?;
    let proto_str = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let (timestamp_seconds, timestamp_micros) = parse_epoch(ts)?;
    let (src_ip, src_port) = parse_ip_port(src)?;
    let (dst_ip, dst_port) = parse_ip_port(dst)?;
    let protocol = parse_protocol(proto_str)?;

    Some(Event { timestamp_seconds, timestamp_micros, src_ip, dst_ip, src_port, dst_port, protocol })
}

fn parse_epoch(s: &str) -> Option<(i64, u32)> {
    match s.split_once('.') {
        Some((whole, frac)) => {
            let secs: i64 = whole.parse().ok()?;
            let mut frac = frac.to_string();
            if frac.len() > 6 {
                frac.truncate(6);
            }
            while frac.len() < 6 {
                frac.push('0');
            }
            let micros: u32 = frac.parse().ok()?;
            Some((secs, micros))
        }
        None => Some((s.parse().ok()?, 0)),
    }
}

/// Port is validated by explicit range check against [0, 65535]; port 0 is
/// accepted as a valid port rather than rejected.
fn parse_ip_port(s: &str) -> Option<(u32, u16)> {
    let (ip_str, port_str) = s.rsplit_once(':')?;
    let ip: Ipv4Addr = ip_str.parse().ok()?;
    let port: u32 = port_str.parse().ok()?;
    if port > 65_535 {
        return None;
    }
    Some((u32::from(ip), port as u16))
}

fn parse_protocol(s: &str) -> Option<Protocol> {
    match s.to_ascii_uppercase().as_str() {
        "TCP" | "6" => Some(Protocol::Tcp),
        "UDP" | "17" => Some(Protocol::Udp),
        "ICMP" | "1" => Some(Protocol::Icmp),
        _ => None,
    }
}

fn parse_fortigate(line: &str) -> Option<Event> {
    let mut date = None;
    let mut time = None;
    let mut srcip = None;
    let mut srcport = None;
    let mut dstip = None;
    let mut dstport = None;
    let mut proto = None;

    for tok in line.split_whitespace() {
        if let Some((k, v)) = tok.split_once('=') {
            let v = v.trim_matches('"');
            match k {
                "date" => date = Some(v),
                "time" => time = Some(v),
                "srcip" => srcip = Some(v),
                "srcport" => srcport = Some(v),
                "dstip" => dstip = Some(v),
                "dstport" => dstport = Some(v),
                "proto" => proto = Some(v),
                _ => {}
            }
        }
    }

    let timestamp_seconds = parse_fortigate_datetime(date?, time?)?;
    let (src_ip, src_port) = parse_ip_port_no_delim(srcip?, srcport?)?;
    let (dst_ip, dst_port) = parse_ip_port_no_delim(dstip?, dstport?)?;
    let proto_num: u8 = proto?.parse().ok()?;
    let protocol = match proto_num {
        6 => Protocol::Tcp,
        17 => Protocol::Udp,
        1 => Protocol::Icmp,
        _ => return None,
    };

    Some(Event { timestamp_seconds, timestamp_micros: 0, src_ip, dst_ip, src_port, dst_port, protocol })
}

fn parse_ip_port_no_delim(ip_str: &str, port_str: &str) -> Option<(u32, u16)> {
    let ip: Ipv4Addr = ip_str.parse().ok()?;
    let port: u32 = port_str.parse().ok()?;
    if port > 65_535 {
        return None;
    }
    Some((u32::from(ip), port as u16))
}

fn parse_fortigate_datetime(date: &str, time: &str) -> Option<i64> {
    let d = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let t = NaiveTime::parse_from_str(time, "%H:%M:%S").ok()?;
    let dt = d.and_time(t);
    Some(Utc.from_utc_datetime(&dt).timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_honeypot_line() {
        let line = "1700000059.123456 10.0.0.1:44321 -> 192.168.1.5:22 TCP";
        let e = parse_line(line).unwrap();
        assert_eq!(e.timestamp_seconds, 1_700_000_059);
        assert_eq!(e.timestamp_micros, 123_456);
        assert_eq!(e.src_ip, u32::from(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(e.src_port, 44_321);
        assert_eq!(e.protocol, Protocol::Tcp);
    }

    #[test]
    fn parses_honeypot_line_without_micros_and_port_zero() {
        let line = "1700000059 10.0.0.1:0 -> 192.168.1.5:80 UDP";
        let e = parse_line(line).unwrap();
        assert_eq!(e.timestamp_micros, 0);
        assert_eq!(e.src_port, 0);
        assert_eq!(e.protocol, Protocol::Udp);
    }

    #[test]
    fn parses_fortigate_line() {
        let line = r#"date=2023-11-14 time=22:00:59 devname=FGT srcip=203.0.113.9 srcport=5000 dstip=10.0.0.2 dstport=443 proto=6 action=deny"#;
        let e = parse_line(line).unwrap();
        assert_eq!(e.timestamp_seconds, 1_699_999_259);
        assert_eq!(e.src_ip, u32::from(Ipv4Addr::new(203, 0, 113, 9)));
        assert_eq!(e.protocol, Protocol::Tcp);
    }

    #[test]
    fn unparseable_line_is_none() {
        assert!(parse_line("this is not a log line at all").is_none());
    }
}
