//! W3C trace-context header parsing.
//!
//! Only validity matters here; parsed values are not retained.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

const MAX_VERSION: u8 = 254;
const MAX_TRACESTATE_MEMBERS: usize = 32;

static TRACEPARENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9a-f]{2})-([a-f0-9]{32})-([a-f0-9]{16})-([a-f0-9]{2})(?:-.*)?$")
        .expect("traceparent pattern is valid")
});

static TRACESTATE_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[a-z][_0-9a-z\-*/]{0,255}|[a-z0-9][_0-9a-z\-*/]{0,240}@[a-z][_0-9a-z\-*/]{0,13})$",
    )
    .expect("tracestate key pattern is valid")
});

static TRACESTATE_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\x20-\x2b\x2d-\x3c\x3e-\x7e]{0,255}[\x21-\x2b\x2d-\x3c\x3e-\x7e]$")
        .expect("tracestate value pattern is valid")
});

/// Returns `true` if `src` is a valid `traceparent` header.
///
/// Version `ff` is reserved. Version `00` headers must have exactly four
/// fields and flags no greater than `02`; later versions may carry extra
/// trailing fields. All-zero trace and span ids are invalid.
pub fn traceparent_valid(src: &str) -> bool {
    let Some(caps) = TRACEPARENT_RE.captures(src) else {
        return false;
    };

    let Ok(version) = u8::from_str_radix(&caps[1], 16) else {
        return false;
    };
    if version > MAX_VERSION {
        return false;
    }
    // 2 + 1 + 32 + 1 + 16 + 1 + 2
    if version == 0 && src.len() != 55 {
        return false;
    }

    let Ok(flags) = u8::from_str_radix(&caps[4], 16) else {
        return false;
    };
    if version == 0 && flags > 2 {
        return false;
    }

    !is_all_zeros(&caps[2]) && !is_all_zeros(&caps[3])
}

/// Returns `true` if `src` is a valid `tracestate` header.
///
/// Members are comma separated `key=value` pairs with optional surrounding
/// whitespace. Empty members are skipped. Keys must be unique and at most
/// 32 members are allowed. The empty string is a valid, empty tracestate.
pub fn tracestate_valid(src: &str) -> bool {
    let mut seen = HashSet::new();

    for member in src.split(',') {
        if member.is_empty() {
            continue;
        }
        if seen.len() >= MAX_TRACESTATE_MEMBERS {
            return false;
        }

        let member = member.trim_matches([' ', '\t']);
        let Some((key, value)) = member.split_once('=') else {
            return false;
        };
        if !TRACESTATE_KEY_RE.is_match(key) || !TRACESTATE_VALUE_RE.is_match(value) {
            return false;
        }
        if !seen.insert(key) {
            return false;
        }
    }

    true
}

fn is_all_zeros(hex: &str) -> bool {
    hex.bytes().all(|b| b == b'0')
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01";

    #[test]
    fn test_traceparent_valid() {
        assert!(traceparent_valid(VALID));
        assert!(traceparent_valid(
            "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-00"
        ));
    }

    #[test]
    fn test_traceparent_future_version_allows_extra_fields() {
        assert!(traceparent_valid(
            "01-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-09-extra"
        ));
        assert!(!traceparent_valid(
            "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01-extra"
        ));
    }

    #[test]
    fn test_traceparent_invalid() {
        assert!(!traceparent_valid(""));
        assert!(!traceparent_valid("foo"));
        // Reserved version.
        assert!(!traceparent_valid(
            "ff-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01"
        ));
        // Upper-case hex.
        assert!(!traceparent_valid(
            "00-0AF7651916CD43DD8448EB211C80319C-b7ad6b7169203331-01"
        ));
        // Zero trace id.
        assert!(!traceparent_valid(
            "00-00000000000000000000000000000000-b7ad6b7169203331-01"
        ));
        // Zero span id.
        assert!(!traceparent_valid(
            "00-0af7651916cd43dd8448eb211c80319c-0000000000000000-01"
        ));
        // Version 00 flags above 02.
        assert!(!traceparent_valid(
            "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-03"
        ));
        // Short span id.
        assert!(!traceparent_valid(
            "00-0af7651916cd43dd8448eb211c80319c-b7ad6b716920333-01"
        ));
    }

    #[test]
    fn test_tracestate_valid() {
        assert!(tracestate_valid(""));
        assert!(tracestate_valid("congo=t61rcWkgMzE"));
        assert!(tracestate_valid("rojo=00f067aa0ba902b7,congo=t61rcWkgMzE"));
        assert!(tracestate_valid(" rojo=00f067aa0ba902b7 ,\tcongo=t61rcWkgMzE"));
        assert!(tracestate_valid("tenant@vendor=value"));
        assert!(tracestate_valid("a=1,,b=2"));
    }

    #[test]
    fn test_tracestate_invalid() {
        assert!(!tracestate_valid("123"));
        assert!(!tracestate_valid("123=value"));
        assert!(!tracestate_valid("Rojo=1"));
        assert!(!tracestate_valid("rojo="));
        assert!(!tracestate_valid("rojo=a=b"));
        assert!(!tracestate_valid("rojo=1,rojo=2"));
    }

    #[test]
    fn test_tracestate_member_limit() {
        let members: Vec<String> = (0..32).map(|i| format!("k{i}=v")).collect();
        assert!(tracestate_valid(&members.join(",")));

        let members: Vec<String> = (0..33).map(|i| format!("k{i}=v")).collect();
        assert!(!tracestate_valid(&members.join(",")));
    }
}
