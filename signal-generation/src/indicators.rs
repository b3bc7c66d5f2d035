// Rolling-window indicators
// Output vectors are index-aligned with their input; `None` marks rows where
// the window is not yet full (or the value is undefined).

use statrs::statistics::Statistics;

/// Simple moving average
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().mean())
}

/// Rolling sample standard deviation (n - 1 denominator)
pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().std_dev())
}

/// Rolling statistic over optional values; a window containing `None` yields `None`
pub fn rolling_std_opt(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }

    for end in window..=values.len() {
        let slice = &values[end - window..end];
        if slice.iter().all(Option::is_some) {
            let window_values: Vec<f64> = slice.iter().flatten().copied().collect();
            out[end - 1] = finite(window_values.iter().std_dev());
        }
    }
    out
}

/// ln(p[i] / p[i-1])
pub fn log_returns(values: &[f64]) -> Vec<Option<f64>> {
    pairwise(values, |prev, cur| (cur / prev).ln())
}

/// p[i] / p[i-1] - 1
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    pairwise(values, |prev, cur| cur / prev - 1.0)
}

fn rolling(values: &[f64], window: usize, stat: impl Fn(&[f64]) -> f64) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }

    for end in window..=values.len() {
        out[end - 1] = finite(stat(&values[end - window..end]));
    }
    out
}

fn pairwise(values: &[f64], f: impl Fn(f64, f64) -> f64) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    for i in 1..values.len() {
        out[i] = finite(f(values[i - 1], values[i]));
    }
    out
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}
