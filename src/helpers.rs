use std::time::SystemTime;

use chrono::{DateTime, Local};
use formato::Formato;
use ratatui::style::Color;

pub fn nice_size(val: u64) -> String {
    let val = val as f64;
    let format = "#,##0.0";
    //missing or unreadable counters show as a dash, not a blank cell
    if val == 0.0 {
        "-".to_string()
    } else if val < 5000.0 {
        format!("{}B", val.formato(format))
    } else if val < 500.0 * 1024.0 {
        format!("{}K", (val / 1024.).formato(format))
    } else if val < 50000.0 * 1024.0 * 1024.0 {
        format!("{}M", (val / 1024. / 1024.).formato(format))
    } else {
        format!("{}G", (val / 1024. / 1024. / 1024.).formato(format))
    }
}

pub fn nice_size_g(val: u64) -> String {
    format!("{:.1}G", val as f64 / 1024. / 1024. / 1024.)
}

pub fn nice_time(time_seconds: u64) -> String {
    let d = time_seconds / (60 * 60 * 24);
    let h = time_seconds / (60 * 60) % 24;
    let m = time_seconds / 60 % 60;
    let s = time_seconds % 60;
    if time_seconds < 60 {
        format!("{s}s")
    } else if time_seconds < 60 * 60 {
        format!("{m:02}m {s:02}s")
    } else if time_seconds < 60 * 60 * 24 {
        format!("{h}h {m:>2}m {s:>2}s")
    } else {
        format!("{d}d {h:>2}h {m:>2}m {s:>2}s")
    }
}

/// Local wall-clock time, `HH:MM:SS`.
pub fn clock(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format("%H:%M:%S").to_string()
}

/// Green up to `warn`, yellow up to `crit`, red above.
pub fn level_color(value: f32, warn: f32, crit: f32) -> Color {
    if value <= warn {
        Color::Green
    } else if value <= crit {
        Color::Yellow
    } else {
        Color::Red
    }
}

pub fn cpu_cell_color(cpu: f32) -> Color {
    level_color(cpu, 20., 50.)
}

pub fn mem_cell_color(percent: f32) -> Color {
    level_color(percent, 5., 10.)
}

///gauges switch colour earlier than table cells
pub fn cpu_gauge_color(cpu: f32) -> Color {
    if cpu < 50. {
        Color::Green
    } else if cpu < 80. {
        Color::Yellow
    } else {
        Color::Red
    }
}

pub fn mem_gauge_color(percent: f32) -> Color {
    if percent < 60. {
        Color::Green
    } else if percent < 85. {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Cuts to `max` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_formats() {
        assert_eq!(nice_time(59), "59s");
        assert_eq!(nice_time(61), "01m 01s");
        assert_eq!(nice_time(3600 + 120 + 3), "1h  2m  3s");
        assert_eq!(nice_time(2 * 86400 + 3600), "2d  1h  0m  0s");
    }

    #[test]
    fn zero_size_is_placeholder() {
        assert_eq!(nice_size(0), "-");
        assert_eq!(nice_size_g(1024 * 1024 * 1024 * 3 / 2), "1.5G");
    }

    #[test]
    fn clock_is_hours_minutes_seconds() {
        let text = clock(SystemTime::now());
        assert_eq!(text.len(), 8);
        assert_eq!(text.matches(':').count(), 2);
    }

    #[test]
    fn thresholds() {
        assert_eq!(cpu_cell_color(20.), Color::Green);
        assert_eq!(cpu_cell_color(20.1), Color::Yellow);
        assert_eq!(cpu_cell_color(75.), Color::Red);
        assert_eq!(mem_cell_color(6.), Color::Yellow);
        assert_eq!(cpu_gauge_color(50.), Color::Yellow);
        assert_eq!(mem_gauge_color(90.), Color::Red);
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefgh", 5), "abcd…");
    }
}
