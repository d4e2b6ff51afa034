// SPDX-License-Identifier: MIT
//! Formatting helpers shared by tool handlers (spec.md §4.3).

const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

/// Binary-unit byte formatting with one decimal place above KiB
/// (spec.md §4.3 "Memory formatting").
pub fn format_bytes_binary(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// spec.md §4.3 "CPU percentage": `(cpuDelta/sysDelta) * 100 * numCPUs`,
/// zero if `sys_delta` is zero.
pub fn cpu_percent(cpu_delta: f64, sys_delta: f64, num_cpus: f64) -> f64 {
    if sys_delta == 0.0 {
        0.0
    } else {
        (cpu_delta / sys_delta) * 100.0 * num_cpus
    }
}
