// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-readable durations for uptime columns.

/// Format seconds compactly: `"5s"`, `"2m"`, `"1h30m"`, `"3d"`.
///
/// Hours include minutes when non-zero (`"1h"` vs `"1h5m"`).
pub fn format_elapsed(secs: u64) -> String {
    match secs {
        0..=59 => format!("{secs}s"),
        60..=3599 => format!("{}m", secs / 60),
        3600..=86399 => {
            let (h, m) = (secs / 3600, (secs % 3600) / 60);
            if m > 0 {
                format!("{h}h{m}m")
            } else {
                format!("{h}h")
            }
        }
        _ => format!("{}d", secs / 86400),
    }
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
