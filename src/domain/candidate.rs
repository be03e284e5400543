//! Candidate-type classification.
//!
//! Every registered predicate is evaluated, with no early exit, so that a
//! snapshot qualifying for more than one type is detected and held rather than
//! resolved by registration order.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::reason_log::{Outcome, ReasonLog, Stage};
use crate::domain::snapshot::InstrumentSnapshot;

pub const RULE_ID: &str = "candidate_classification";
pub const NO_QUALIFYING_TYPE: &str = "no qualifying type";
pub const AMBIGUOUS_CLASSIFICATION: &str = "ambiguous classification";

/// Slack applied to both ends of the defensive price band.
const PRICE_BAND_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateType {
    TrendPullback,
    MeanReversion,
    DefensiveIncome,
}

impl CandidateType {
    pub const ALL: [CandidateType; 3] = [
        CandidateType::TrendPullback,
        CandidateType::MeanReversion,
        CandidateType::DefensiveIncome,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateType::TrendPullback => "TREND_PULLBACK",
            CandidateType::MeanReversion => "MEAN_REVERSION",
            CandidateType::DefensiveIncome => "DEFENSIVE_INCOME",
        }
    }

    /// Lower-case key used for config sections and rule ids.
    pub fn key(&self) -> &'static str {
        match self {
            CandidateType::TrendPullback => "trend_pullback",
            CandidateType::MeanReversion => "mean_reversion",
            CandidateType::DefensiveIncome => "defensive_income",
        }
    }
}

impl fmt::Display for CandidateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationThresholds {
    pub trend_pullback_drawdown_min: f64,
    pub trend_pullback_drawdown_max: f64,
    pub mean_reversion_drawdown_max: f64,
    pub defensive_drawdown_min: f64,
    pub defensive_max_volatility: f64,
    pub defensive_price_band_low: f64,
    pub defensive_price_band_high: f64,
    pub defensive_max_ma_50_distance: f64,
    pub defensive_max_volume_ratio: f64,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        ClassificationThresholds {
            trend_pullback_drawdown_min: -0.20,
            trend_pullback_drawdown_max: -0.05,
            mean_reversion_drawdown_max: -0.30,
            defensive_drawdown_min: -0.15,
            defensive_max_volatility: 0.25,
            defensive_price_band_low: 0.97,
            defensive_price_band_high: 1.12,
            defensive_max_ma_50_distance: 0.08,
            defensive_max_volume_ratio: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub label: String,
    pub passed: bool,
}

impl Condition {
    fn new(label: String, passed: bool) -> Self {
        Condition { label, passed }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.passed { "PASS" } else { "FAIL" };
        write!(f, "{} ({})", self.label, mark)
    }
}

/// Result of one type's qualifying predicate, with its sub-conditions.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateCheck {
    pub candidate: CandidateType,
    pub conditions: Vec<Condition>,
}

impl CandidateCheck {
    pub fn matched(&self) -> bool {
        self.conditions.iter().all(|c| c.passed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "types", rename_all = "snake_case")]
pub enum ClassificationResult {
    Matched(CandidateType),
    Ambiguous(Vec<CandidateType>),
    Unmatched,
}

impl ClassificationResult {
    pub fn candidate(&self) -> Option<CandidateType> {
        match self {
            ClassificationResult::Matched(t) => Some(*t),
            _ => None,
        }
    }
}

type Predicate = fn(&InstrumentSnapshot, &ClassificationThresholds) -> Vec<Condition>;

/// Qualifying predicates, one per candidate type, in evaluation order.
pub fn registry() -> [(CandidateType, Predicate); 3] {
    [
        (CandidateType::TrendPullback, trend_pullback),
        (CandidateType::MeanReversion, mean_reversion),
        (CandidateType::DefensiveIncome, defensive_income),
    ]
}

fn trend_pullback(stock: &InstrumentSnapshot, t: &ClassificationThresholds) -> Vec<Condition> {
    let dd = stock.drawdown_6m;
    vec![
        Condition::new(
            format!("price {:.2} > ma_200 {:.2}", stock.price, stock.ma_200),
            stock.price > stock.ma_200,
        ),
        Condition::new(
            format!(
                "drawdown_6m={:.2} within [{:.2}, {:.2}]",
                dd, t.trend_pullback_drawdown_min, t.trend_pullback_drawdown_max
            ),
            dd >= t.trend_pullback_drawdown_min && dd <= t.trend_pullback_drawdown_max,
        ),
    ]
}

fn mean_reversion(stock: &InstrumentSnapshot, t: &ClassificationThresholds) -> Vec<Condition> {
    vec![
        Condition::new(
            format!(
                "drawdown_6m={:.2} <= {:.2}",
                stock.drawdown_6m, t.mean_reversion_drawdown_max
            ),
            stock.drawdown_6m <= t.mean_reversion_drawdown_max,
        ),
        Condition::new(
            format!("price {:.2} < ma_200 {:.2}", stock.price, stock.ma_200),
            stock.price < stock.ma_200,
        ),
    ]
}

fn defensive_income(stock: &InstrumentSnapshot, t: &ClassificationThresholds) -> Vec<Condition> {
    let ratio = stock.price_to_ma_200();
    let low = t.defensive_price_band_low - PRICE_BAND_TOLERANCE;
    let high = t.defensive_price_band_high + PRICE_BAND_TOLERANCE;
    let distance = stock.ma_50_distance();
    let volume_ratio = stock.volume_ratio();
    vec![
        Condition::new(
            format!(
                "drawdown_6m={:.2} >= {:.2}",
                stock.drawdown_6m, t.defensive_drawdown_min
            ),
            stock.drawdown_6m >= t.defensive_drawdown_min,
        ),
        Condition::new(
            format!(
                "volatility_annual={:.2} <= {:.2}",
                stock.volatility_annual, t.defensive_max_volatility
            ),
            stock.volatility_annual <= t.defensive_max_volatility,
        ),
        Condition::new(
            format!("price_to_ma200={ratio:.6} within [{low:.6}, {high:.6}]"),
            ratio >= low && ratio <= high,
        ),
        Condition::new(
            format!(
                "overheat_check ma50_distance={:.2} <= {:.2}, volume_ratio={:.2} <= {:.2}",
                distance,
                t.defensive_max_ma_50_distance,
                volume_ratio,
                t.defensive_max_volume_ratio
            ),
            distance <= t.defensive_max_ma_50_distance
                && volume_ratio <= t.defensive_max_volume_ratio,
        ),
    ]
}

/// Run every predicate and report each one's sub-conditions.
pub fn check_all(stock: &InstrumentSnapshot, t: &ClassificationThresholds) -> Vec<CandidateCheck> {
    registry()
        .into_iter()
        .map(|(candidate, predicate)| CandidateCheck {
            candidate,
            conditions: predicate(stock, t),
        })
        .collect()
}

/// Classify and append one summary entry to the log.
pub fn classify(
    stock: &InstrumentSnapshot,
    thresholds: &ClassificationThresholds,
    log: &mut ReasonLog,
) -> ClassificationResult {
    let checks = check_all(stock, thresholds);
    let hits: Vec<CandidateType> = checks
        .iter()
        .filter(|c| c.matched())
        .map(|c| c.candidate)
        .collect();

    let (result, outcome, summary) = match hits.as_slice() {
        [single] => (
            ClassificationResult::Matched(*single),
            Outcome::Pass,
            format!("classified as {single}"),
        ),
        [] => (
            ClassificationResult::Unmatched,
            Outcome::Wait,
            NO_QUALIFYING_TYPE.to_string(),
        ),
        many => {
            let names: Vec<&str> = many.iter().map(|t| t.as_str()).collect();
            (
                ClassificationResult::Ambiguous(many.to_vec()),
                Outcome::Wait,
                format!("{AMBIGUOUS_CLASSIFICATION}: {}", names.join(", ")),
            )
        }
    };

    let details: Vec<String> = checks
        .iter()
        .map(|check| {
            let conditions: Vec<String> = check.conditions.iter().map(|c| c.to_string()).collect();
            format!("{}: {}", check.candidate, conditions.join("; "))
        })
        .collect();
    log.record(
        Stage::Classification,
        RULE_ID,
        outcome,
        format!("{summary} | {}", details.join(" | ")),
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(price: f64, ma_50: f64, ma_200: f64, drawdown_6m: f64) -> InstrumentSnapshot {
        InstrumentSnapshot {
            ticker: "CLS".into(),
            price,
            avg_volume: 1000.0,
            volume: 1000.0,
            volatility_annual: 0.2,
            ma_50,
            ma_200,
            drawdown_6m,
            dividend_yield: 0.0,
            earnings_risk: false,
            regulatory_risk: false,
            business_clarity: Some(true),
            sector_defensive: false,
        }
    }

    fn defensive_matched(s: &InstrumentSnapshot) -> bool {
        check_all(s, &ClassificationThresholds::default())
            .into_iter()
            .find(|c| c.candidate == CandidateType::DefensiveIncome)
            .unwrap()
            .matched()
    }

    #[test]
    fn trend_pullback_single_match() {
        let mut log = ReasonLog::new();
        let s = stock(52.0, 50.0, 45.0, -0.12);
        let result = classify(&s, &ClassificationThresholds::default(), &mut log);
        assert_eq!(result, ClassificationResult::Matched(CandidateType::TrendPullback));
        assert_eq!(log.len(), 1);
        let entry = &log.entries()[0];
        assert_eq!(entry.outcome, Outcome::Pass);
        assert!(entry.reason.starts_with("classified as TREND_PULLBACK"));
    }

    #[test]
    fn mean_reversion_single_match() {
        let mut log = ReasonLog::new();
        let s = stock(28.0, 30.0, 32.0, -0.35);
        let result = classify(&s, &ClassificationThresholds::default(), &mut log);
        assert_eq!(result.candidate(), Some(CandidateType::MeanReversion));
    }

    #[test]
    fn no_match_waits() {
        let mut log = ReasonLog::new();
        let s = stock(40.0, 50.0, 45.0, -0.25);
        let result = classify(&s, &ClassificationThresholds::default(), &mut log);
        assert_eq!(result, ClassificationResult::Unmatched);
        assert_eq!(log.entries()[0].outcome, Outcome::Wait);
        assert!(log.entries()[0].reason.starts_with(NO_QUALIFYING_TYPE));
    }

    #[test]
    fn two_matches_are_ambiguous_not_tie_broken() {
        let mut log = ReasonLog::new();
        // Inside the trend pullback drawdown window and the defensive band at once.
        let s = stock(150.0, 148.0, 140.0, -0.08);
        let result = classify(&s, &ClassificationThresholds::default(), &mut log);
        assert_eq!(
            result,
            ClassificationResult::Ambiguous(vec![
                CandidateType::TrendPullback,
                CandidateType::DefensiveIncome
            ])
        );
        assert_eq!(result.candidate(), None);
        assert_eq!(log.entries()[0].outcome, Outcome::Wait);
        assert!(log.entries()[0].reason.contains(AMBIGUOUS_CLASSIFICATION));
    }

    #[test]
    fn reason_lists_every_type_checked() {
        let mut log = ReasonLog::new();
        classify(
            &stock(52.0, 50.0, 45.0, -0.12),
            &ClassificationThresholds::default(),
            &mut log,
        );
        let reason = &log.entries()[0].reason;
        for t in CandidateType::ALL {
            assert!(reason.contains(t.as_str()), "missing {t} in {reason}");
        }
    }

    #[test]
    fn defensive_failed_subcondition_is_reported() {
        let mut log = ReasonLog::new();
        // Flat at its averages, but too volatile for the defensive profile.
        let mut s = stock(100.0, 100.0, 100.0, -0.1);
        s.volatility_annual = 0.02 * 252f64.sqrt();
        classify(&s, &ClassificationThresholds::default(), &mut log);
        let reason = &log.entries()[0].reason;
        assert!(reason.contains("volatility_annual=0.32 <= 0.25 (FAIL)"));
    }

    #[test]
    fn defensive_band_lower_bound_inclusive() {
        let s = stock(97.0, 97.0, 100.0, -0.1);
        assert!(defensive_matched(&s));
        let checks = check_all(&s, &ClassificationThresholds::default());
        let band = &checks[2].conditions[2].label;
        assert!(band.contains("price_to_ma200=0.970000"));
        assert!(band.contains("within [0.969999, 1.120001]"));
    }

    #[test]
    fn defensive_band_upper_bound_tolerates_rounding() {
        let s = stock(112.00005, 112.00005, 100.0, -0.1);
        assert!(defensive_matched(&s));
    }

    #[test]
    fn defensive_band_rejects_extended_price() {
        let s = stock(115.0, 115.0, 100.0, -0.1);
        assert!(!defensive_matched(&s));
    }

    #[test]
    fn defensive_overheat_check() {
        let mut s = stock(100.0, 100.0, 100.0, -0.1);
        s.volume = 2000.0;
        assert!(!defensive_matched(&s));
    }

    #[test]
    fn registry_covers_every_type_once() {
        let types: Vec<_> = registry().iter().map(|(t, _)| *t).collect();
        assert_eq!(types, CandidateType::ALL.to_vec());
    }
}
