//! 照合スコアから [0, 1] の確信度への決定的な写像。

/// 比率の分母。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Denominator {
    /// 全カテゴリ合計（0 の場合は 1）。
    TotalScore,
    Fixed(f64),
}

/// 呼び出し元ごとの (base, scale, cap, divisor) の組。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationParams {
    pub base: f64,
    pub scale: f64,
    pub cap: f64,
    pub denominator: Denominator,
}

impl CalibrationParams {
    /// テキスト経路: `min(0.95, 0.65 + best / max(total, 1) * 0.30)`
    pub const TEXT: Self = Self {
        base: 0.65,
        scale: 0.30,
        cap: 0.95,
        denominator: Denominator::TotalScore,
    };

    /// ファイル名経路: `min(0.90, 0.70 + best / 15 * 0.20)`
    pub const FILENAME: Self = Self {
        base: 0.70,
        scale: 0.20,
        cap: 0.90,
        denominator: Denominator::Fixed(15.0),
    };
}

/// # Examples
/// ```
/// use waste_sorter::classification::calibration::{calibrate, CalibrationParams};
///
/// let confidence = calibrate(3, 6, CalibrationParams::FILENAME);
/// assert!((confidence - 0.74).abs() < 1e-9);
/// ```
#[must_use]
pub fn calibrate(best_score: u32, total_score: u32, params: CalibrationParams) -> f64 {
    let divisor = match params.denominator {
        Denominator::TotalScore => f64::from(total_score.max(1)),
        Denominator::Fixed(value) => value,
    };
    let ratio = f64::from(best_score) / divisor;
    let raw = params.base + ratio * params.scale;
    if !raw.is_finite() {
        return 0.0;
    }

    // cap may itself lie outside [0, 1]
    raw.min(params.cap).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn text_single_category_hits_cap() {
        assert!(approx(calibrate(9, 9, CalibrationParams::TEXT), 0.95));
    }

    #[test]
    fn text_split_scores() {
        // 5 of 10 → 0.65 + 0.5 * 0.30
        assert!(approx(calibrate(5, 10, CalibrationParams::TEXT), 0.80));
    }

    #[test]
    fn filename_scales_with_fixed_divisor() {
        assert!(approx(calibrate(3, 6, CalibrationParams::FILENAME), 0.74));
        assert!(approx(calibrate(6, 6, CalibrationParams::FILENAME), 0.78));
        assert!(approx(calibrate(30, 30, CalibrationParams::FILENAME), 0.90));
    }

    #[test]
    fn misconfigured_params_are_clamped() {
        let params = CalibrationParams {
            base: 1.4,
            scale: 1.0,
            cap: 2.0,
            denominator: Denominator::TotalScore,
        };
        assert!(approx(calibrate(1, 1, params), 1.0));

        let negative = CalibrationParams {
            base: -3.0,
            scale: 0.1,
            cap: 1.0,
            denominator: Denominator::Fixed(0.0),
        };
        assert!(approx(calibrate(0, 0, negative), 0.0));
    }

    proptest! {
        #[test]
        fn confidence_stays_in_unit_interval(best in 0u32..10_000, extra in 0u32..10_000) {
            let total = best.saturating_add(extra);
            for params in [CalibrationParams::TEXT, CalibrationParams::FILENAME] {
                let confidence = calibrate(best, total, params);
                prop_assert!((0.0..=1.0).contains(&confidence));
            }
        }
    }
}
