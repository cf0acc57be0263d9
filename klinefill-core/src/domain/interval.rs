//! Kline interval codes and their fixed durations.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed-duration candlestick interval.
///
/// Calendar months (`1M`) are not representable: the backfill cursor steps
/// by a constant duration.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interval {
    S1,
    M1,
    M3,
    M5,
    M15,
    M30,
    H1,
    H2,
    H4,
    H6,
    H8,
    H12,
    D1,
    D3,
    W1,
}

impl Interval {
    pub const ALL: [Interval; 15] = [
        Interval::S1,
        Interval::M1,
        Interval::M3,
        Interval::M5,
        Interval::M15,
        Interval::M30,
        Interval::H1,
        Interval::H2,
        Interval::H4,
        Interval::H6,
        Interval::H8,
        Interval::H12,
        Interval::D1,
        Interval::D3,
        Interval::W1,
    ];

    /// Exchange wire code, e.g. `"1h"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::S1 => "1s",
            Interval::M1 => "1m",
            Interval::M3 => "3m",
            Interval::M5 => "5m",
            Interval::M15 => "15m",
            Interval::M30 => "30m",
            Interval::H1 => "1h",
            Interval::H2 => "2h",
            Interval::H4 => "4h",
            Interval::H6 => "6h",
            Interval::H8 => "8h",
            Interval::H12 => "12h",
            Interval::D1 => "1d",
            Interval::D3 => "3d",
            Interval::W1 => "1w",
        }
    }

    /// Length of one candle. Always positive.
    pub fn duration(&self) -> TimeDelta {
        match self {
            Interval::S1 => TimeDelta::seconds(1),
            Interval::M1 => TimeDelta::minutes(1),
            Interval::M3 => TimeDelta::minutes(3),
            Interval::M5 => TimeDelta::minutes(5),
            Interval::M15 => TimeDelta::minutes(15),
            Interval::M30 => TimeDelta::minutes(30),
            Interval::H1 => TimeDelta::hours(1),
            Interval::H2 => TimeDelta::hours(2),
            Interval::H4 => TimeDelta::hours(4),
            Interval::H6 => TimeDelta::hours(6),
            Interval::H8 => TimeDelta::hours(8),
            Interval::H12 => TimeDelta::hours(12),
            Interval::D1 => TimeDelta::days(1),
            Interval::D3 => TimeDelta::days(3),
            Interval::W1 => TimeDelta::weeks(1),
        }
    }

    /// Widest window one request of `page_size` rows can cover.
    ///
    /// Saturates at `TimeDelta::MAX` when the product does not fit.
    pub fn span(&self, page_size: u32) -> TimeDelta {
        i32::try_from(page_size)
            .ok()
            .and_then(|n| self.duration().checked_mul(n))
            .unwrap_or(TimeDelta::MAX)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Interval::ALL
            .iter()
            .copied()
            .find(|i| i.as_str() == code)
            .ok_or_else(|| {
                let valid: Vec<&str> = Interval::ALL.iter().map(|i| i.as_str()).collect();
                format!("unknown interval '{code}'. Valid: {}", valid.join(", "))
            })
    }
}

impl TryFrom<String> for Interval {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Interval> for String {
    fn from(interval: Interval) -> Self {
        interval.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_roundtrip_through_from_str() {
        for interval in Interval::ALL {
            assert_eq!(interval.as_str().parse::<Interval>().unwrap(), interval);
        }
    }

    #[test]
    fn month_interval_is_rejected() {
        let err = "1M".parse::<Interval>().unwrap_err();
        assert!(err.contains("unknown interval '1M'"));
    }

    #[test]
    fn durations_are_positive_and_ordered() {
        let mut prev = TimeDelta::zero();
        for interval in Interval::ALL {
            let d = interval.duration();
            assert!(d > prev, "{interval} not longer than its predecessor");
            prev = d;
        }
    }

    #[test]
    fn span_scales_with_page_size() {
        assert_eq!(Interval::H1.span(1000), TimeDelta::hours(1000));
        assert_eq!(Interval::M1.span(1), TimeDelta::minutes(1));
    }

    #[test]
    fn span_saturates_instead_of_wrapping() {
        assert_eq!(Interval::M1.span(u32::MAX), TimeDelta::MAX);
        assert!(Interval::S1.span(i32::MAX as u32) > TimeDelta::zero());
    }

    #[test]
    fn serde_uses_wire_code() {
        #[derive(Deserialize, Serialize)]
        struct Wrapper {
            interval: Interval,
        }
        let w: Wrapper = toml::from_str("interval = \"4h\"").unwrap();
        assert_eq!(w.interval, Interval::H4);
        assert_eq!(toml::to_string(&w).unwrap().trim(), "interval = \"4h\"");
    }
}
