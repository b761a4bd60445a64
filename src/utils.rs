/// Formats seconds as `m:ss`. Unknown, negative and non-finite values print as `0:00`.
pub(crate) fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }

    let total = seconds.floor() as u64;

    format!("{}:{:02}", total / 60, total % 60)
}

pub(crate) fn format_optional_time(seconds: Option<f64>) -> String {
    format_time(seconds.unwrap_or(f64::NAN))
}
