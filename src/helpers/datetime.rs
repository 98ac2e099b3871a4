use eyre::{Result, eyre};
use time::{OffsetDateTime, UtcOffset};

pub trait Timezone {
    fn to_localtime(&self) -> OffsetDateTime;
    fn to_formatted_string(&self) -> String;
}

impl Timezone for OffsetDateTime {
    fn to_localtime(&self) -> OffsetDateTime {
        let mut dt = *self;
        let tz_offset_sec = chrono::Local::now().offset().local_minus_utc();
        if let Ok(offset) = UtcOffset::from_whole_seconds(tz_offset_sec) {
            dt = dt.to_offset(offset);
        }
        dt
    }

    fn to_formatted_string(&self) -> String {
        let str = format!("{:?}", self);
        let v: Vec<&str> = str.split('.').collect();
        match v.as_slice() {
            [whole, fractional, ..] => {
                let mut fractional = fractional.to_string();
                fractional.truncate(3);
                format!("{}.{}", whole, fractional)
            }
            _ => str,
        }
    }
}

/// Parses a commitment exit date given either as unix seconds or as a
/// `YYYY-MM-DD` date (midnight UTC).
pub fn parse_exit_date(s: &str) -> Result<u64> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }
    let date = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| eyre!("invalid exit date {:?}: {}", s, e))?;
    let secs = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| eyre!("invalid exit date {:?}", s))?
        .and_utc()
        .timestamp();
    u64::try_from(secs).map_err(|_| eyre!("exit date {:?} is before the unix epoch", s))
}

pub fn from_unix(secs: u64) -> Result<OffsetDateTime> {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
        .ok_or_else(|| eyre!("unix time {} is out of range", secs))
}
