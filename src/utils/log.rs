// src/utils/log.rs

//! Console formatting helpers for run reports.
//!
//! Everything goes through the `log` facade so the CLI's logger decides
//! timestamps and filtering.

/// Log a header
pub fn header(title: &str) {
    let border = "═".repeat(60);
    ::log::info!("{}", border);
    ::log::info!("  {}", title);
    ::log::info!("{}", border);
}

/// Log a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    ::log::info!("[SUMMARY] {}", title);
    for line in summary_lines(items) {
        ::log::info!("{}", line);
    }
}

fn summary_lines(items: &[(&str, String)]) -> Vec<String> {
    let width = items.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    items
        .iter()
        .map(|(key, value)| format!("    {key:<width$} : {value}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_lines_align_keys() {
        let lines = summary_lines(&[("stored", "12".to_string()), ("outcome", "exhausted".to_string())]);
        assert_eq!(lines[0], "    stored  : 12");
        assert_eq!(lines[1], "    outcome : exhausted");
    }
}
