/// Arithmetic mean; `None` for an empty slice.
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population standard deviation; `None` for an empty slice.
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    let variance = data.iter().map(|v| (m - v) * (m - v)).sum::<f64>() / data.len() as f64;
    Some(variance.sqrt())
}
