//! Supported list dialects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the textual conventions a pasted list may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatId {
    /// Official Warhammer 40k app export
    GwApp,
    /// NewRecruit "WTC-Compact" export (one line per unit)
    WtcCompact,
    /// NewRecruit "WTC" export
    Wtc,
    /// NewRecruit native text export
    Nrnr,
    /// NewRecruit export in GW app style
    NrGw,
    /// ListForge text export
    Lf,
}

impl FormatId {
    /// Every dialect, in tie-break priority order (first wins a tie).
    pub const PRIORITY: [FormatId; 6] = [
        FormatId::GwApp,
        FormatId::WtcCompact,
        FormatId::Wtc,
        FormatId::Nrnr,
        FormatId::NrGw,
        FormatId::Lf,
    ];

    /// Stable identifier used in JSON, CLI flags and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatId::GwApp => "gw-app",
            FormatId::WtcCompact => "wtc-compact",
            FormatId::Wtc => "wtc",
            FormatId::Nrnr => "nrnr",
            FormatId::NrGw => "nr-gw",
            FormatId::Lf => "lf",
        }
    }

    /// Position in the tie-break order.
    pub fn priority(&self) -> usize {
        Self::PRIORITY
            .iter()
            .position(|f| f == self)
            .unwrap_or(Self::PRIORITY.len())
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        FormatId::PRIORITY
            .into_iter()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "Unknown format '{}'. Expected one of: gw-app, wtc-compact, wtc, nrnr, nr-gw, lf",
                    s
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_round_trips_through_str() {
        for format in FormatId::PRIORITY {
            assert_eq!(format.as_str().parse::<FormatId>().unwrap(), format);
        }
    }

    #[test]
    fn test_format_from_str_lenient() {
        assert_eq!("WTC_Compact".parse::<FormatId>().unwrap(), FormatId::WtcCompact);
        assert!("battlescribe".parse::<FormatId>().is_err());
    }

    #[test]
    fn test_format_serialization() {
        let json = serde_json::to_string(&FormatId::NrGw).unwrap();
        assert_eq!(json, "\"nr-gw\"");
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(FormatId::GwApp.priority(), 0);
        assert!(FormatId::WtcCompact.priority() < FormatId::Wtc.priority());
    }
}
