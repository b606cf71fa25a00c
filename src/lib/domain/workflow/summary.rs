use tracing::{info, warn};

pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();
    for (i, &ch) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(ch);
    }
    result
}

pub struct RunSummary {
    pub command: &'static str,
    pub tables: usize,
    pub rows_in: usize,
    pub rows_out: usize,
    pub warnings: Vec<String>,
    pub total_runtime_secs: f64,
}

pub fn log_summary(summary: RunSummary) {
    info!("=== {} Summary ===", summary.command);
    info!("Tables processed: {}", format_number(summary.tables));
    info!("Rows read: {}", format_number(summary.rows_in));
    info!("Rows written: {}", format_number(summary.rows_out));
    info!("Total runtime: {:.2}s", summary.total_runtime_secs);
    if !summary.warnings.is_empty() {
        warn!("Warnings: {}", summary.warnings.len());
        for warning in &summary.warnings {
            warn!("  {}", warning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_separators() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }
}
