//! Configuration validation.
//!
//! Runs once, before any snapshot is evaluated. Every failure names the INI
//! section and key it came from.

use crate::domain::candidate::{CandidateType, ClassificationThresholds};
use crate::domain::config::EngineConfig;
use crate::domain::entry::EntryConfig;
use crate::domain::error::EngineError;
use crate::domain::gate::GateThresholds;
use crate::domain::regime::RegimeThresholds;
use crate::domain::sizing::SizingConfig;

/// Largest tranche count accepted; beyond this a plan stops being a plan.
pub const MAX_TRANCHES: usize = 20;

pub fn validate_engine_config(config: &EngineConfig) -> Result<(), EngineError> {
    validate_regime(&config.regime)?;
    validate_gates(&config.gates)?;
    validate_classification(&config.classification)?;
    validate_entry(&config.entry)?;
    validate_sizing(&config.sizing)?;
    Ok(())
}

fn finite(section: &str, key: &str, value: f64) -> Result<(), EngineError> {
    if !value.is_finite() {
        return Err(EngineError::config_invalid(
            section,
            key,
            format!("{key} must be a finite number"),
        ));
    }
    Ok(())
}

fn non_negative(section: &str, key: &str, value: f64) -> Result<(), EngineError> {
    finite(section, key, value)?;
    if value < 0.0 {
        return Err(EngineError::config_invalid(
            section,
            key,
            format!("{key} must be non-negative"),
        ));
    }
    Ok(())
}

fn fraction(section: &str, key: &str, value: f64) -> Result<(), EngineError> {
    finite(section, key, value)?;
    if value <= 0.0 || value > 1.0 {
        return Err(EngineError::config_invalid(
            section,
            key,
            format!("{key} must be between 0 and 1"),
        ));
    }
    Ok(())
}

fn drawdown(section: &str, key: &str, value: f64) -> Result<(), EngineError> {
    finite(section, key, value)?;
    if !(-1.0..=0.0).contains(&value) {
        return Err(EngineError::config_invalid(
            section,
            key,
            format!("{key} must be between -1 and 0"),
        ));
    }
    Ok(())
}

fn validate_regime(t: &RegimeThresholds) -> Result<(), EngineError> {
    non_negative("regime", "risk_on_max_vix", t.risk_on_max_vix)?;
    non_negative("regime", "risk_off_min_vix", t.risk_off_min_vix)?;
    if t.risk_on_max_vix > t.risk_off_min_vix {
        return Err(EngineError::config_invalid(
            "regime",
            "risk_on_max_vix",
            "risk_on_max_vix must not exceed risk_off_min_vix",
        ));
    }
    Ok(())
}

fn validate_gates(t: &GateThresholds) -> Result<(), EngineError> {
    non_negative("gates", "min_avg_volume", t.min_avg_volume)?;
    finite("gates", "max_volatility", t.max_volatility)?;
    if t.max_volatility <= 0.0 {
        return Err(EngineError::config_invalid(
            "gates",
            "max_volatility",
            "max_volatility must be positive",
        ));
    }
    Ok(())
}

fn validate_classification(t: &ClassificationThresholds) -> Result<(), EngineError> {
    let s = "classification";
    drawdown(s, "trend_pullback_drawdown_min", t.trend_pullback_drawdown_min)?;
    drawdown(s, "trend_pullback_drawdown_max", t.trend_pullback_drawdown_max)?;
    if t.trend_pullback_drawdown_min > t.trend_pullback_drawdown_max {
        return Err(EngineError::config_invalid(
            s,
            "trend_pullback_drawdown_min",
            "trend_pullback_drawdown_min must not exceed trend_pullback_drawdown_max",
        ));
    }
    drawdown(s, "mean_reversion_drawdown_max", t.mean_reversion_drawdown_max)?;
    drawdown(s, "defensive_drawdown_min", t.defensive_drawdown_min)?;
    non_negative(s, "defensive_max_volatility", t.defensive_max_volatility)?;
    finite(s, "defensive_price_band_low", t.defensive_price_band_low)?;
    finite(s, "defensive_price_band_high", t.defensive_price_band_high)?;
    if t.defensive_price_band_low <= 0.0 {
        return Err(EngineError::config_invalid(
            s,
            "defensive_price_band_low",
            "defensive_price_band_low must be positive",
        ));
    }
    if t.defensive_price_band_low > t.defensive_price_band_high {
        return Err(EngineError::config_invalid(
            s,
            "defensive_price_band_low",
            "defensive_price_band_low must not exceed defensive_price_band_high",
        ));
    }
    non_negative(s, "defensive_max_ma_50_distance", t.defensive_max_ma_50_distance)?;
    non_negative(s, "defensive_max_volume_ratio", t.defensive_max_volume_ratio)?;
    Ok(())
}

fn validate_entry(config: &EntryConfig) -> Result<(), EngineError> {
    for candidate in CandidateType::ALL {
        let section = format!("entry.{}", candidate.key());
        let t = config.for_type(candidate);
        non_negative(&section, "volume_multiple", t.volume_multiple)?;
        finite(&section, "max_volatility", t.max_volatility)?;
        if t.max_volatility <= 0.0 {
            return Err(EngineError::config_invalid(
                &section,
                "max_volatility",
                "max_volatility must be positive",
            ));
        }
    }
    Ok(())
}

fn validate_sizing(c: &SizingConfig) -> Result<(), EngineError> {
    fraction("sizing", "max_weight", c.max_weight)?;
    finite("sizing", "target_volatility", c.target_volatility)?;
    if c.target_volatility <= 0.0 {
        return Err(EngineError::config_invalid(
            "sizing",
            "target_volatility",
            "target_volatility must be positive",
        ));
    }
    if c.tranche_count < 1 || c.tranche_count > MAX_TRANCHES {
        return Err(EngineError::config_invalid(
            "sizing",
            "tranche_count",
            format!("tranche_count must be between 1 and {MAX_TRANCHES}"),
        ));
    }
    fraction("sizing", "first_tranche_fraction", c.first_tranche_fraction)?;
    // The first tranche may not outweigh any later one.
    let equal_share = 1.0 / c.tranche_count as f64;
    if c.tranche_count > 1 && c.first_tranche_fraction > equal_share + 1e-12 {
        return Err(EngineError::config_invalid(
            "sizing",
            "first_tranche_fraction",
            format!(
                "first_tranche_fraction must not exceed 1/tranche_count ({equal_share:.4})"
            ),
        ));
    }
    fraction("sizing", "risk_cap", c.risk_cap)?;
    Ok(())
}
