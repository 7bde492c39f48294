//! Format classifier.
//!
//! Scores pasted text against the signature of every supported dialect and
//! reports the best match. Scoring is table driven: each [`Probe`] is a
//! labelled regex with a fixed weight per dialect. Negative weights are cross
//! penalties, applied when a signal is strong evidence *against* a dialect
//! that would otherwise match just as well.
//!
//! Classification never fails. Text without any signal still yields a result
//! (the highest-priority dialect with score 0 and confidence 0); deciding that
//! a confidence is too low to proceed is the caller's business.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Confidence, FormatId};
use crate::text::split_lines;

/// Number of non-blank lines probed by [`Scope::Head`] probes.
pub const HEAD_LINES: usize = 30;

/// Which part of the input a probe looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The first [`HEAD_LINES`] non-blank lines
    Head,
    /// The whole text
    Whole,
}

/// A labelled scoring rule.
#[derive(Debug)]
pub struct Probe {
    /// Signal name reported in the breakdown
    pub signal: &'static str,
    pub scope: Scope,
    /// Regex, compiled in multi-line mode
    pub pattern: &'static str,
    /// Weight contributed to each dialect when the probe matches
    pub weights: &'static [(FormatId, i32)],
}

use FormatId::{GwApp, Lf, NrGw, Nrnr, Wtc, WtcCompact};

/// The scoring table. A probe contributes once per input, however many
/// lines match it.
pub static PROBES: &[Probe] = &[
    Probe {
        signal: "faction_keyword_header",
        scope: Scope::Head,
        pattern: r"^\+[ \t]*FACTION KEYWORD:",
        weights: &[(Wtc, 30), (WtcCompact, 30)],
    },
    Probe {
        signal: "plus_rule",
        scope: Scope::Head,
        pattern: r"^\+{3,}[ \t]*$",
        weights: &[(Wtc, 10), (WtcCompact, 10), (Nrnr, -10)],
    },
    Probe {
        signal: "plus_detachment",
        scope: Scope::Head,
        pattern: r"^\+[ \t]*DETACHMENT:",
        weights: &[(Wtc, 10), (WtcCompact, 10)],
    },
    Probe {
        signal: "plus_total_points",
        scope: Scope::Head,
        pattern: r"^\+[ \t]*TOTAL ARMY POINTS:",
        weights: &[(Wtc, 10), (WtcCompact, 10)],
    },
    Probe {
        signal: "ampersand_enhancement",
        scope: Scope::Head,
        pattern: r"^&[ \t]*[^\n]+\(on[ \t]+",
        weights: &[(Wtc, 5), (WtcCompact, 5)],
    },
    Probe {
        signal: "compact_inline_unit",
        scope: Scope::Whole,
        pattern: r"^(?:[A-Za-z]+\d+:[ \t]*)?\d+x[ \t]+[^\n]+\(\d+[ \t]*pts\):[ \t]*\S",
        weights: &[(WtcCompact, 25), (Wtc, -15)],
    },
    Probe {
        signal: "colon_bullet_subunit",
        scope: Scope::Whole,
        pattern: r"^[ \t]*•[ \t]*\d+x[ \t]+[^:\n]+:[ \t]*\S",
        weights: &[(WtcCompact, 10), (Nrnr, 10)],
    },
    Probe {
        signal: "wtc_unit_line",
        scope: Scope::Whole,
        pattern: r"^(?:[A-Za-z]+\d+:[ \t]*)?\d+x[ \t]+[^\n]+\(\d+[ \t]*pts\)[ \t]*$",
        weights: &[(Wtc, 20)],
    },
    Probe {
        signal: "with_clause_line",
        scope: Scope::Whole,
        pattern: r"^[ \t]*(?:[•◦][ \t]*)?\d+ with ",
        weights: &[(Wtc, 10)],
    },
    Probe {
        signal: "caps_section_header",
        scope: Scope::Whole,
        pattern: r"^(?:CHARACTERS?|EPIC HERO(?:ES)?|BATTLELINE|OTHER DATASHEETS|DEDICATED TRANSPORTS?|ALLIED UNITS|FORTIFICATIONS?)[ \t]*$",
        weights: &[(Wtc, 5), (GwApp, 5), (NrGw, 5)],
    },
    Probe {
        signal: "exported_with_banner",
        scope: Scope::Whole,
        pattern: r"^[ \t]*Exported with App Version",
        weights: &[(GwApp, 40), (NrGw, -30)],
    },
    Probe {
        signal: "points_unit_line",
        scope: Scope::Whole,
        pattern: r"^\S[^\n]*\(\d+ [Pp]oints\)[ \t]*$",
        weights: &[(GwApp, 15), (NrGw, 15)],
    },
    Probe {
        signal: "battle_size_line",
        scope: Scope::Head,
        pattern: r"^(?:Combat Patrol|Incursion|Strike Force|Onslaught) \(\d+ [Pp]oints\)",
        weights: &[(GwApp, 10), (NrGw, 10)],
    },
    Probe {
        signal: "hollow_bullet",
        scope: Scope::Whole,
        pattern: r"^[ \t]*◦",
        weights: &[(GwApp, 5), (NrGw, 5)],
    },
    Probe {
        signal: "bullet_quantity_item",
        scope: Scope::Whole,
        pattern: r"^[ \t]*•[ \t]*\d+x[ \t]+[^:\n]+$",
        weights: &[(GwApp, 5), (NrGw, 5), (Wtc, 3)],
    },
    Probe {
        signal: "dashed_points_title",
        scope: Scope::Head,
        pattern: r"^[^\n]+ - [^\n]+ \(\d+ [Pp]oints\)[ \t]*$",
        weights: &[(NrGw, 35), (GwApp, -15)],
    },
    Probe {
        signal: "priced_bullet_enhancement",
        scope: Scope::Whole,
        pattern: r"^[ \t]*•[ \t]*Enhancement:[^\n]*\(\+?\d+[ \t]*pts\)",
        weights: &[(NrGw, 10), (Wtc, 5), (GwApp, -5)],
    },
    Probe {
        signal: "markdown_section",
        scope: Scope::Whole,
        pattern: r"^##[ \t]+\S",
        weights: &[(Nrnr, 25)],
    },
    Probe {
        signal: "bracket_points_unit",
        scope: Scope::Whole,
        pattern: r"^[^\[\]\n]+\[\d+pts\]",
        weights: &[(Nrnr, 15)],
    },
    Probe {
        signal: "nrnr_title",
        scope: Scope::Head,
        pattern: r"^[^\n]+ - \[\d+pts\][ \t]*$",
        weights: &[(Nrnr, 20), (NrGw, -10)],
    },
    Probe {
        signal: "newrecruit_banner",
        scope: Scope::Whole,
        pattern: r"(?i)created with[ \t]+\S*newrecruit",
        weights: &[(Nrnr, 30)],
    },
    Probe {
        signal: "key_value_faction",
        scope: Scope::Head,
        pattern: r"^Faction:[ \t]*\S",
        weights: &[(Lf, 20), (Nrnr, 5)],
    },
    Probe {
        signal: "key_value_detachment",
        scope: Scope::Head,
        pattern: r"^Detachment:[ \t]*\S",
        weights: &[(Lf, 10), (Nrnr, 5)],
    },
    Probe {
        signal: "army_name_key",
        scope: Scope::Head,
        pattern: r"^(?:Army|List) Name:[ \t]*\S",
        weights: &[(Lf, 10)],
    },
    Probe {
        signal: "dashed_section",
        scope: Scope::Whole,
        pattern: r"^-{3}[ \t]*[^-\n]+?[ \t]*-{3}[ \t]*$",
        weights: &[(Lf, 20)],
    },
    Probe {
        signal: "dash_bullet",
        scope: Scope::Whole,
        pattern: r"^[ \t]+-[ \t]+\S",
        weights: &[(Lf, 5)],
    },
    Probe {
        signal: "bracket_space_points",
        scope: Scope::Whole,
        pattern: r"\[\d+ pts\]",
        weights: &[(Lf, 15), (Nrnr, -5)],
    },
    Probe {
        signal: "listforge_banner",
        scope: Scope::Whole,
        pattern: r"(?i)listforge",
        weights: &[(Lf, 30)],
    },
];

static COMPILED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    PROBES
        .iter()
        .map(|p| Regex::new(&format!("(?m){}", p.pattern)).expect("Invalid probe regex"))
        .collect()
});

/// Result of classifying a pasted list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Winning dialect
    pub format: FormatId,
    /// `score / max_score(format)`, clamped to `[0, 1]`
    pub confidence: f64,
    /// Bucketed confidence
    pub level: Confidence,
    /// Raw score of the winner
    pub score: i32,
    /// Signals that moved the winner's score, with their weight
    pub breakdown: IndexMap<String, i32>,
    /// Raw score of every dialect
    pub scores: IndexMap<FormatId, i32>,
}

/// Highest score a dialect can reach (sum of its positive weights).
pub fn max_score(format: FormatId) -> i32 {
    PROBES
        .iter()
        .flat_map(|p| p.weights.iter())
        .filter(|(f, w)| *f == format && *w > 0)
        .map(|(_, w)| *w)
        .sum()
}

/// Classify raw text (split on CR/LF).
pub fn classify_text(text: &str) -> Classification {
    classify_lines(&split_lines(text))
}

/// Classify an ordered list of source lines.
pub fn classify_lines(lines: &[&str]) -> Classification {
    let head = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .take(HEAD_LINES)
        .copied()
        .collect::<Vec<_>>()
        .join("\n");
    let whole = lines.join("\n");

    let mut scores: IndexMap<FormatId, i32> =
        FormatId::PRIORITY.iter().map(|f| (*f, 0)).collect();
    let mut fired: Vec<&Probe> = Vec::new();

    for (probe, re) in PROBES.iter().zip(COMPILED.iter()) {
        let haystack = match probe.scope {
            Scope::Head => &head,
            Scope::Whole => &whole,
        };
        if !re.is_match(haystack) {
            continue;
        }
        fired.push(probe);
        for (format, weight) in probe.weights {
            if let Some(score) = scores.get_mut(format) {
                *score += weight;
            }
        }
    }

    // Strictly greater wins, so ties go to the earlier dialect in PRIORITY.
    let mut winner = FormatId::PRIORITY[0];
    let mut best = i32::MIN;
    for format in FormatId::PRIORITY {
        let score = scores[&format];
        if score > best {
            best = score;
            winner = format;
        }
    }

    let max = max_score(winner);
    let confidence = if max > 0 {
        (best.max(0) as f64 / max as f64).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let breakdown: IndexMap<String, i32> = fired
        .iter()
        .filter_map(|probe| {
            probe
                .weights
                .iter()
                .find(|(f, _)| *f == winner)
                .map(|(_, w)| (probe.signal.to_string(), *w))
        })
        .collect();

    debug!(
        "Classified as {} (score {}, confidence {:.2}); scores: {:?}",
        winner, best, confidence, scores
    );

    Classification {
        format: winner,
        confidence,
        level: Confidence::from_ratio(confidence),
        score: best,
        breakdown,
        scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GW_APP: &str = include_str!("../../tests/fixtures/gw_app.txt");
    const WTC: &str = include_str!("../../tests/fixtures/wtc.txt");
    const WTC_COMPACT: &str = include_str!("../../tests/fixtures/wtc_compact.txt");
    const NR_GW: &str = include_str!("../../tests/fixtures/nr_gw.txt");
    const NRNR: &str = include_str!("../../tests/fixtures/nrnr.txt");
    const LF: &str = include_str!("../../tests/fixtures/listforge.txt");

    #[test]
    fn test_probe_patterns_compile() {
        assert_eq!(COMPILED.len(), PROBES.len());
    }

    #[test]
    fn test_every_format_can_score() {
        for format in FormatId::PRIORITY {
            assert!(max_score(format) > 0, "{} has no positive probes", format);
        }
    }

    #[test]
    fn test_wtc_compact_minimal_scenario() {
        let lines = [
            "+ FACTION KEYWORD: Chaos - World Eaters",
            "+++",
            "Char1: 1x Daemon Prince of Khorne (220 pts): Warlord",
        ];
        let result = classify_lines(&lines);
        assert_eq!(result.format, FormatId::WtcCompact);
        assert!(result.confidence > 0.5);
        assert_eq!(result.breakdown["compact_inline_unit"], 25);
        assert!(result.scores[&FormatId::Wtc] < result.score);
    }

    #[test]
    fn test_fixtures_classify_as_their_dialect() {
        let cases = [
            (GW_APP, FormatId::GwApp),
            (WTC, FormatId::Wtc),
            (WTC_COMPACT, FormatId::WtcCompact),
            (NR_GW, FormatId::NrGw),
            (NRNR, FormatId::Nrnr),
            (LF, FormatId::Lf),
        ];
        for (text, expected) in cases {
            let result = classify_text(text);
            assert_eq!(result.format, expected, "scores: {:?}", result.scores);
            assert!(
                result.level.is_acceptable(),
                "{} classified with low confidence {:.2}",
                expected,
                result.confidence
            );
        }
    }

    #[test]
    fn test_exported_with_penalizes_nr_gw() {
        let result = classify_text(GW_APP);
        assert_eq!(result.breakdown["exported_with_banner"], 40);
        assert!(result.scores[&FormatId::NrGw] < result.scores[&FormatId::GwApp]);
    }

    #[test]
    fn test_empty_input_defaults_with_zero_confidence() {
        let result = classify_lines(&[]);
        assert_eq!(result.format, FormatId::GwApp);
        assert_eq!(result.score, 0);
        assert_eq!(result.confidence, 0.0);
        assert!(result.breakdown.is_empty());
    }

    #[test]
    fn test_tie_breaks_by_priority() {
        // Only the shared WTC header fires: WTC and WTC-Compact tie.
        let result = classify_text("+ FACTION KEYWORD: Xenos - Orks\n");
        assert_eq!(result.scores[&FormatId::Wtc], result.scores[&FormatId::WtcCompact]);
        assert_eq!(result.format, FormatId::WtcCompact);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let a = classify_text(NRNR);
        let b = classify_text(NRNR);
        assert_eq!(a, b);
    }

    #[test]
    fn test_confidence_is_clamped() {
        for text in [GW_APP, WTC, WTC_COMPACT, NR_GW, NRNR, LF, "garbage\nmore garbage"] {
            let result = classify_text(text);
            assert!((0.0..=1.0).contains(&result.confidence));
        }
    }
}
