//! Key levels and proximity.

use keylevel_core::KeyLevels;
use tracing::warn;

/// Key levels at `last_price ± atr` and the proximity to the nearer one.
///
/// Both levels sit `atr` away from the last price, so the proximity is the
/// ATR itself. The distances measured back from the stored levels are
/// re-checked against it and a mismatch is logged.
pub fn key_levels(last_price: f64, atr: f64) -> (KeyLevels, f64) {
    let levels = KeyLevels::around(last_price, atr);
    let measured = levels.proximity(last_price);

    if !is_consistent(&levels, last_price, atr, measured) {
        warn!(
            last_price,
            atr,
            upper = levels.upper,
            lower = levels.lower,
            measured,
            "key levels are not symmetric around last price"
        );
    }

    (levels, atr)
}

/// Check `upper - price == price - lower == measured == atr` up to the
/// rounding of the stored levels.
///
/// `upper` and `lower` are rounded to the f64 grid at their own magnitude, so
/// distances measured back from them can be off by about one ulp of the
/// larger level. Anything beyond two such ulps is a real asymmetry.
pub fn is_consistent(levels: &KeyLevels, last_price: f64, atr: f64, measured: f64) -> bool {
    if !(last_price.is_finite() && atr.is_finite() && measured.is_finite()) {
        return false;
    }
    let magnitude = levels.upper.abs().max(levels.lower.abs());
    let tolerance = 2.0 * f64::EPSILON * magnitude.max(f64::MIN_POSITIVE);
    let close = |a: f64, b: f64| (a - b).abs() <= tolerance;

    close(levels.upper - last_price, atr)
        && close(last_price - levels.lower, atr)
        && close(measured, atr)
}
