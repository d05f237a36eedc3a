//! Line-oriented wire protocol between scheduler and workers.
//!
//! One request line and one reply line per connection:
//!
//! | Request                          | Reply       |
//! |----------------------------------|-------------|
//! | `PROBE`                          | `Q <n>`     |
//! | `ASSIGN <duration> [<origin>]`   | `OK`        |
//! | `REQUEST <duration>`             | `START`     |
//! | `CANCEL`                         | `CANCELLED` |
//!
//! Workers parse requests permissively: a missing or malformed duration is
//! read as 0 and an unknown command yields no request at all. Replies are
//! parsed strictly by the scheduler.

use std::fmt;

/// Longest line either side accepts, newline excluded.
pub const MAX_LINE_LEN: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Probe,
    Assign {
        duration_ms: u64,
        /// Scheduler address. Carried on the wire, unused by the worker.
        origin: Option<String>,
    },
    Request {
        duration_ms: u64,
    },
    Cancel,
}

impl Request {
    /// Parse a request line. Returns `None` for empty input or an unknown command.
    pub fn parse(line: &str) -> Option<Request> {
        let mut parts = line.split_whitespace();
        let request = match parts.next()? {
            "PROBE" => Request::Probe,
            "ASSIGN" => Request::Assign {
                duration_ms: parse_duration(parts.next()),
                origin: parts.next().map(str::to_string),
            },
            "REQUEST" => Request::Request {
                duration_ms: parse_duration(parts.next()),
            },
            "CANCEL" => Request::Cancel,
            _ => return None,
        };
        Some(request)
    }
}

/// Read the leading decimal digits of `field` as milliseconds.
///
/// Trailing garbage is ignored (`30ms` is 30). No digits, a minus sign, or
/// overflow all give 0.
fn parse_duration(field: Option<&str>) -> u64 {
    let Some(field) = field else {
        return 0;
    };
    let unsigned = field.strip_prefix('+').unwrap_or(field);
    let end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    unsigned[..end].parse::<u64>().unwrap_or(0)
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Probe => write!(f, "PROBE"),
            Request::Assign {
                duration_ms,
                origin: Some(origin),
            } => write!(f, "ASSIGN {} {}", duration_ms, origin),
            Request::Assign {
                duration_ms,
                origin: None,
            } => write!(f, "ASSIGN {}", duration_ms),
            Request::Request { duration_ms } => write!(f, "REQUEST {}", duration_ms),
            Request::Cancel => write!(f, "CANCEL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Queue(u64),
    Ok,
    Start,
    Cancelled,
}

impl Reply {
    pub fn parse(line: &str) -> Option<Reply> {
        let mut parts = line.split_whitespace();
        let reply = match parts.next()? {
            "Q" => Reply::Queue(parts.next()?.parse().ok()?),
            "OK" => Reply::Ok,
            "START" => Reply::Start,
            "CANCELLED" => Reply::Cancelled,
            _ => return None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(reply)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Queue(n) => write!(f, "Q {}", n),
            Reply::Ok => write!(f, "OK"),
            Reply::Start => write!(f, "START"),
            Reply::Cancelled => write!(f, "CANCELLED"),
        }
    }
}
