// Clock formatting for minute offsets

/// Format a minute offset as a clock string.
///
/// Military output does not wrap at 24 hours, so offsets past midnight read
/// as `25:30`. The 12-hour output only classifies AM/PM correctly for hours
/// in `[0, 24]`; anything later is reported as PM.
pub fn format_time(minutes: i64, military: bool) -> String {
    let hours = minutes.div_euclid(60);
    let mins = minutes.rem_euclid(60);

    if military {
        return format!("{:02}:{:02}", hours, mins);
    }

    let suffix = if hours < 12 || hours == 24 { "AM" } else { "PM" };
    let hours_12 = match hours.rem_euclid(12) {
        0 => 12,
        h => h,
    };
    format!("{:02}:{:02} {}", hours_12, mins, suffix)
}
