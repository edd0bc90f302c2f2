use bstr::{BStr, BString, ByteSlice, ByteVec};

use crate::ObjectError;

/// A point in time as git stores it: Unix seconds plus a timezone offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    /// Seconds since the Unix epoch.
    pub seconds: i64,
    /// Timezone offset in minutes from UTC (e.g. -300 for -0500).
    pub offset_minutes: i32,
}

impl Timestamp {
    pub fn new(seconds: i64, offset_minutes: i32) -> Self {
        Self {
            seconds,
            offset_minutes,
        }
    }

    /// The current time with the local timezone offset.
    pub fn now() -> Self {
        let now = chrono::Local::now();
        let offset_secs = now.offset().local_minus_utc();
        Self {
            seconds: now.timestamp(),
            offset_minutes: offset_secs / 60,
        }
    }

    /// Parse the raw git format: `"<seconds> <+/-HHMM>"`.
    pub fn parse(input: &str) -> Result<Self, ObjectError> {
        let mut parts = input.trim().splitn(2, ' ');
        let seconds: i64 = parts
            .next()
            .unwrap_or("")
            .parse()
            .map_err(|_| ObjectError::InvalidSignature(format!("invalid timestamp: {input:?}")))?;
        let offset_minutes = match parts.next() {
            Some(tz) => {
                let tz: i32 = tz.trim().parse().map_err(|_| {
                    ObjectError::InvalidSignature(format!("invalid timezone: {tz:?}"))
                })?;
                tz_to_minutes(tz)
            }
            None => 0,
        };
        Ok(Self {
            seconds,
            offset_minutes,
        })
    }

    /// Format in the raw git format: `"<seconds> <+/-HHMM>"`.
    pub fn to_raw(&self) -> String {
        format!("{} {:+05}", self.seconds, minutes_to_tz(self.offset_minutes))
    }
}

/// Git stores the offset as a "decimal" +/-HHMM (e.g. -0500 => -500).
fn tz_to_minutes(tz: i32) -> i32 {
    let sign = if tz < 0 { -1 } else { 1 };
    let abs = tz.abs();
    sign * (abs / 100 * 60 + abs % 100)
}

fn minutes_to_tz(minutes: i32) -> i32 {
    let sign = if minutes < 0 { -1 } else { 1 };
    let abs = minutes.abs();
    sign * (abs / 60 * 100 + abs % 60)
}

/// Author/committer identity with timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: BString,
    pub email: BString,
    pub when: Timestamp,
}

impl Signature {
    pub fn new(name: impl Into<BString>, email: impl Into<BString>, when: Timestamp) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            when,
        }
    }

    /// Parse from git's format: `Name <email> timestamp tz`.
    pub fn parse(input: &BStr) -> Result<Self, ObjectError> {
        let input = input.as_bytes();

        let gt_pos = input
            .iter()
            .rposition(|&b| b == b'>')
            .ok_or_else(|| ObjectError::InvalidSignature("missing '>'".into()))?;
        let lt_pos = input[..gt_pos]
            .iter()
            .rposition(|&b| b == b'<')
            .ok_or_else(|| ObjectError::InvalidSignature("missing '<'".into()))?;

        let name = input[..lt_pos].trim();
        let email = &input[lt_pos + 1..gt_pos];

        let date_str = std::str::from_utf8(input[gt_pos + 1..].trim())
            .map_err(|_| ObjectError::InvalidSignature("non-UTF-8 date".into()))?;
        let when = Timestamp::parse(date_str)?;

        Ok(Self {
            name: BString::from(name),
            email: BString::from(email),
            when,
        })
    }

    /// Format in git's canonical form: `Name <email> timestamp tz`.
    pub fn to_bytes(&self) -> BString {
        let mut out = BString::new(Vec::new());
        out.push_str(&self.name);
        out.push_str(b" <");
        out.push_str(&self.email);
        out.push_str(b"> ");
        out.push_str(self.when.to_raw().as_bytes());
        out
    }
}
