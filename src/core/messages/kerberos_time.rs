use crate::error::ProtocolError;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::fmt;

const GENERALIZED_TIME_FORMAT: &str = "%Y%m%d%H%M%SZ";

/// Absolute time with one second granularity, encoded as a
/// GeneralizedTime `YYYYMMDDHHMMSSZ`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KerberosTime(DateTime<Utc>);

impl KerberosTime {
    pub fn now() -> Self {
        return Utc::now().into();
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        return self.0;
    }

    pub fn timestamp(&self) -> i64 {
        return self.0.timestamp();
    }

    pub fn timestamp_millis(&self) -> i64 {
        return self.0.timestamp_millis();
    }

    /// Time shifted by the given offset, `None` if out of range.
    pub fn checked_add(&self, offset: Duration) -> Option<Self> {
        return self.0.checked_add_signed(offset).map(Self::from);
    }

    pub fn to_generalized_time(&self) -> String {
        return self.0.format(GENERALIZED_TIME_FORMAT).to_string();
    }

    pub fn parse(value: &[u8]) -> Result<Self, ProtocolError> {
        let invalid = || {
            ProtocolError::invalid(
                "KerberosTime",
                String::from_utf8_lossy(value).into_owned(),
            )
        };

        if value.len() != 15
            || value[14] != b'Z'
            || !value[..14].iter().all(u8::is_ascii_digit)
        {
            return Err(invalid());
        }

        let number = |from: usize, to: usize| -> u32 {
            value[from..to]
                .iter()
                .fold(0, |acc, digit| acc * 10 + (digit - b'0') as u32)
        };

        let naive = NaiveDate::from_ymd_opt(
            number(0, 4) as i32,
            number(4, 6),
            number(6, 8),
        )
        .and_then(|date| {
            date.and_hms_opt(number(8, 10), number(10, 12), number(12, 14))
        })
        .ok_or_else(invalid)?;

        return Ok(Self(Utc.from_utc_datetime(&naive)));
    }
}

impl From<DateTime<Utc>> for KerberosTime {
    /// Drops the sub-second part.
    fn from(datetime: DateTime<Utc>) -> Self {
        let nanos = datetime.timestamp_subsec_nanos() as i64;
        return Self(datetime - Duration::nanoseconds(nanos));
    }
}

impl From<KerberosTime> for DateTime<Utc> {
    fn from(time: KerberosTime) -> Self {
        return time.0;
    }
}

impl fmt::Display for KerberosTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%m/%d/%Y %H:%M:%S"))
    }
}
