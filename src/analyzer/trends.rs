use std::collections::BTreeMap;

/// Least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trend {
    pub slope: f64,
    pub intercept: f64,
}

impl Trend {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

pub struct TrendAnalyzer;

impl TrendAnalyzer {
    /// Fits a straight line through the points.
    /// Returns None with fewer than two distinct x values.
    pub fn linear_trend(points: &[(f64, f64)]) -> Option<Trend> {
        if points.len() < 2 {
            return None;
        }
        let n = points.len() as f64;
        let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;
        let numerator: f64 = points
            .iter()
            .map(|(x, y)| (x - mean_x) * (y - mean_y))
            .sum();
        let denominator: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
        if denominator == 0.0 {
            return None;
        }
        let slope = numerator / denominator;
        Some(Trend {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    /// Percentage change between the fifth-latest and the latest year that has
    /// incorporations. 0.0 when fewer than five such years exist.
    pub fn growth_rate(year_counts: &BTreeMap<i32, usize>) -> f64 {
        if year_counts.len() < 5 {
            return 0.0;
        }
        let counts: Vec<usize> = year_counts.values().copied().collect();
        let latest = counts[counts.len() - 1] as f64;
        let base = counts[counts.len() - 5] as f64;
        if base == 0.0 {
            return 0.0;
        }
        let growth = (latest - base) / base * 100.0;
        (growth * 100.0).round() / 100.0
    }
}
