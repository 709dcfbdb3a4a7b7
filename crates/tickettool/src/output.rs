//! Ticket pretty-printing and JSON rendering

use chrono::{DateTime, Local, Utc};
use formsauth::Ticket;
use serde_json::json;
use std::time::SystemTime;

const LABEL_WIDTH: usize = 16;

/// Print a ticket as aligned key/value lines
pub fn print_pretty(ticket: &Ticket, as_utc: bool, header: &str) {
    let (issued_label, expires_label) = if as_utc {
        ("Issued (UTC)", "Expires (UTC)")
    } else {
        ("Issued (local)", "Expires (local)")
    };

    println!("=== {} ===", header);
    write_kv("Version", &ticket.version.to_string());
    write_kv("Name", &ticket.name);
    write_kv(issued_label, &format_time(ticket.issued_at, as_utc));
    write_kv(expires_label, &format_time(ticket.expires_at, as_utc));
    write_kv("Persistent", &ticket.is_persistent.to_string());
    write_kv("TTL", &format_ttl(ticket.expires_at));
    write_kv("UserData", &ticket.user_data);
    write_kv("CookiePath", &ticket.cookie_path);
    println!();
}

/// Render a ticket as a JSON value with ISO-8601 timestamps
pub fn ticket_json(ticket: &Ticket, as_utc: bool) -> serde_json::Value {
    json!({
        "version": ticket.version,
        "name": ticket.name,
        "issued": format_time_iso(ticket.issued_at, as_utc),
        "expires": format_time_iso(ticket.expires_at, as_utc),
        "persistent": ticket.is_persistent,
        "userdata": ticket.user_data,
        "cookie_path": ticket.cookie_path,
    })
}

fn write_kv(key: &str, value: &str) {
    println!("{:<width$}: {}", key, value, width = LABEL_WIDTH);
}

fn format_time(t: SystemTime, as_utc: bool) -> String {
    if as_utc {
        DateTime::<Utc>::from(t).format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

fn format_time_iso(t: SystemTime, as_utc: bool) -> String {
    if as_utc {
        DateTime::<Utc>::from(t).to_rfc3339()
    } else {
        DateTime::<Local>::from(t).to_rfc3339()
    }
}

fn format_ttl(expires_at: SystemTime) -> String {
    match expires_at.duration_since(SystemTime::now()) {
        Ok(ttl) => {
            let secs = ttl.as_secs();
            format!(
                "{}.{:02}:{:02}:{:02}",
                secs / 86_400,
                secs % 86_400 / 3_600,
                secs % 3_600 / 60,
                secs % 60
            )
        }
        Err(_) => "expired".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_ttl_expired() {
        let past = SystemTime::now() - Duration::from_secs(60);
        assert_eq!(format_ttl(past), "expired");
    }

    #[test]
    fn test_ttl_format() {
        let future = SystemTime::now() + Duration::from_secs(86_400 + 3 * 3_600 + 25 * 60 + 40);
        let rendered = format_ttl(future);
        // Allow one second of slack between now() calls
        assert!(rendered == "1.03:25:40" || rendered == "1.03:25:39", "got {}", rendered);
    }

    #[test]
    fn test_json_fields() {
        let ticket = Ticket::new("alice", "role=admin", false, Duration::from_secs(60));
        let value = ticket_json(&ticket, true);
        assert_eq!(value["name"], "alice");
        assert_eq!(value["userdata"], "role=admin");
        assert_eq!(value["persistent"], false);
        assert!(value["issued"].as_str().unwrap().ends_with("+00:00"));
    }
}
