//! Built-in string formats.

use once_cell::sync::Lazy;
use regex::Regex;
use std::net::{Ipv4Addr, Ipv6Addr};

static BYTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$")
        .expect("base64 regex should be valid")
});

static DATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("date regex should be valid")
});

static DATE_TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{2})-(\d{2})[Tt](\d{2}):(\d{2}):(\d{2})(?:\.\d+)?(?:[Zz]|[+-]\d{2}:\d{2})$",
    )
    .expect("date-time regex should be valid")
});

static HOSTNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .expect("hostname regex should be valid")
});

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$"#,
    )
    .expect("email regex should be valid")
});

static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("uuid regex should be valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringFormat {
    Byte,
    Binary,
    Password,
    Date,
    DateTime,
    Ipv4,
    Ipv6,
    Hostname,
    Email,
    Uuid,
}

impl StringFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "byte" => Some(StringFormat::Byte),
            "binary" => Some(StringFormat::Binary),
            "password" => Some(StringFormat::Password),
            "date" => Some(StringFormat::Date),
            "date-time" => Some(StringFormat::DateTime),
            "ipv4" => Some(StringFormat::Ipv4),
            "ipv6" => Some(StringFormat::Ipv6),
            "hostname" => Some(StringFormat::Hostname),
            "email" => Some(StringFormat::Email),
            "uuid" => Some(StringFormat::Uuid),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StringFormat::Byte => "byte",
            StringFormat::Binary => "binary",
            StringFormat::Password => "password",
            StringFormat::Date => "date",
            StringFormat::DateTime => "date-time",
            StringFormat::Ipv4 => "ipv4",
            StringFormat::Ipv6 => "ipv6",
            StringFormat::Hostname => "hostname",
            StringFormat::Email => "email",
            StringFormat::Uuid => "uuid",
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            StringFormat::Binary | StringFormat::Password => true,
            StringFormat::Byte => BYTE_REGEX.is_match(value),
            StringFormat::Date => DATE_REGEX
                .captures(value)
                .is_some_and(|c| valid_date(&c[1], &c[2], &c[3])),
            StringFormat::DateTime => DATE_TIME_REGEX.captures(value).is_some_and(|c| {
                valid_date(&c[1], &c[2], &c[3]) && valid_time(&c[4], &c[5], &c[6])
            }),
            StringFormat::Ipv4 => value.parse::<Ipv4Addr>().is_ok(),
            StringFormat::Ipv6 => value.parse::<Ipv6Addr>().is_ok(),
            StringFormat::Hostname => value.len() <= 253 && HOSTNAME_REGEX.is_match(value),
            StringFormat::Email => EMAIL_REGEX.is_match(value),
            StringFormat::Uuid => UUID_REGEX.is_match(value),
        }
    }
}

fn valid_date(year: &str, month: &str, day: &str) -> bool {
    let (Ok(y), Ok(m), Ok(d)) = (year.parse::<u32>(), month.parse::<u32>(), day.parse::<u32>())
    else {
        return false;
    };
    let leap = (y % 4 == 0 && y % 100 != 0) || y % 400 == 0;
    let days = match m {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if leap => 29,
        2 => 28,
        _ => return false,
    };
    (1..=days).contains(&d)
}

fn valid_time(hour: &str, minute: &str, second: &str) -> bool {
    matches!(
        (hour.parse::<u32>(), minute.parse::<u32>(), second.parse::<u32>()),
        // 60 allows a leap second
        (Ok(h), Ok(m), Ok(s)) if h < 24 && m < 60 && s <= 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_formats() {
        assert!(StringFormat::Date.matches("2024-02-29"));
        assert!(!StringFormat::Date.matches("2023-02-29"));
        assert!(!StringFormat::Date.matches("2024-13-01"));
        assert!(StringFormat::DateTime.matches("2024-01-01T10:00:00Z"));
        assert!(StringFormat::DateTime.matches("2024-01-01T10:00:00.123+02:00"));
        assert!(!StringFormat::DateTime.matches("2024-01-01 10:00:00"));
    }

    #[test]
    fn test_network_formats() {
        assert!(StringFormat::Ipv4.matches("192.168.0.1"));
        assert!(!StringFormat::Ipv4.matches("256.0.0.1"));
        assert!(StringFormat::Ipv6.matches("::1"));
        assert!(StringFormat::Hostname.matches("api.example.com"));
        assert!(!StringFormat::Hostname.matches("-bad.example"));
    }

    #[test]
    fn test_misc_formats() {
        assert!(StringFormat::Uuid.matches("123e4567-e89b-12d3-a456-426614174000"));
        assert!(!StringFormat::Uuid.matches("123e4567"));
        assert!(StringFormat::Email.matches("dev@example.com"));
        assert!(!StringFormat::Email.matches("dev@"));
        assert!(StringFormat::Byte.matches("aGVsbG8="));
        assert!(!StringFormat::Byte.matches("aGVsbG8"));
        assert!(StringFormat::Binary.matches("\u{0}anything"));
        assert_eq!(StringFormat::from_name("unknown"), None);
    }
}
