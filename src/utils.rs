//! Utility functions.

//-----------------------------------------------------------------------------

// Formatting sizes for log messages.

const SIZE_UNITS: [(f64, &str); 6] = [
    (1.0, "B"),
    (1024.0, "KiB"),
    (1024.0 * 1024.0, "MiB"),
    (1024.0 * 1024.0 * 1024.0, "GiB"),
    (1024.0 * 1024.0 * 1024.0 * 1024.0, "TiB"),
    (1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0, "PiB"),
];

/// Returns a human-readable representation of the given number of bytes.
///
/// # Examples
///
/// ```
/// use seqgraph_view::utils::human_readable_size;
///
/// assert_eq!(human_readable_size(512), "512.000 B");
/// assert_eq!(human_readable_size(3 * 1024 * 1024), "3.000 MiB");
/// ```
pub fn human_readable_size(bytes: usize) -> String {
    let mut unit = 0;
    let value = bytes as f64;
    while unit + 1 < SIZE_UNITS.len() && value >= SIZE_UNITS[unit + 1].0 {
        unit += 1;
    }
    format!("{:.3} {}", value / SIZE_UNITS[unit].0, SIZE_UNITS[unit].1)
}

//-----------------------------------------------------------------------------


//-----------------------------------------------------------------------------
