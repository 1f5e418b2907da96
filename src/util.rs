/// Round to a fixed number of decimals, half away from zero.
///
/// Example: `round_to(26.04, 1)` → `26.0`
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    // Avoid emitting "-0.0" for tiny negative values.
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Chart label for a zone id.
///
/// Example: `3` → `"Zone 3"`
pub fn zone_label(zone: i64) -> String {
    format!("Zone {}", zone)
}
