use std::time::Duration;

pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let millis = duration.subsec_millis();
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn format_duration_zero() {
        assert_eq!(format_duration(Duration::from_secs(0)), "00:00:00.000");
    }

    #[test]
    fn format_duration_rollover() {
        assert_eq!(format_duration(Duration::from_secs(61)), "00:01:01.000");
        assert_eq!(format_duration(Duration::from_millis(3_661_250)), "01:01:01.250");
    }
}
