//! Text formatting shared by the report renderers.

use colored::{ColoredString, Colorize};

use nodefit_placement::{Utilization, UtilizationTier};

const MB_PER_GB: f64 = 1024.0;
const MB_PER_TB: f64 = 1024.0 * 1024.0;

/// `1234567` → `1,234,567`.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Megabytes in the largest unit that keeps the value at least 1.
pub fn format_memory(mb: f64) -> String {
    if mb >= MB_PER_TB {
        format!("{:.1} TB", mb / MB_PER_TB)
    } else if mb >= MB_PER_GB {
        format!("{:.1} GB", mb / MB_PER_GB)
    } else {
        format!("{mb:.0} MB")
    }
}

/// Shortest decimal form that still shows a fractional part (`4.0`, `1.5`).
pub fn plain_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

pub fn tinted(text: String, tier: UtilizationTier) -> ColoredString {
    match tier {
        UtilizationTier::Normal => text.green(),
        UtilizationTier::Warning => text.yellow(),
        UtilizationTier::Critical => text.red(),
    }
}

/// What a utilization line counts.
#[derive(Debug, Clone, Copy)]
pub enum Quantity {
    /// Whole units, labelled (`cores`, `devices`).
    Count(&'static str),
    /// Megabytes, shown in MB/GB/TB.
    Memory,
}

/// `32 used / 64 total cores (50.0%)`, coloured by tier. A resource with
/// nothing available prints `0 used / 0 total` uncoloured.
pub fn utilization(util: &Utilization, quantity: Quantity) -> String {
    if util.is_empty() {
        return match quantity {
            Quantity::Count(unit) => format!("0 used / 0 total {unit} (0.0%)"),
            Quantity::Memory => "0 used / 0 total (0.0%)".to_string(),
        };
    }

    let text = match quantity {
        Quantity::Count(unit) => format!(
            "{} used / {} total {unit} ({:.1}%)",
            thousands(util.used as u64),
            thousands(util.total as u64),
            util.percent
        ),
        Quantity::Memory => format!(
            "{} used / {} total ({:.1}%)",
            format_memory(util.used),
            format_memory(util.total),
            util.percent
        ),
    };
    tinted(text, util.tier).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_separators() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(12_345), "12,345");
        assert_eq!(thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn memory_units() {
        assert_eq!(format_memory(512.0), "512 MB");
        assert_eq!(format_memory(128_000.0), "125.0 GB");
        assert_eq!(format_memory(1_048_576.0), "1.0 TB");
        assert_eq!(format_memory(1_304_576.0), "1.2 TB");
    }

    #[test]
    fn plain_numbers() {
        assert_eq!(plain_number(4.0), "4.0");
        assert_eq!(plain_number(1.5), "1.5");
        assert_eq!(plain_number(0.25), "0.25");
    }

    #[test]
    fn utilization_lines() {
        colored::control::set_override(false);

        let cores = Utilization::new(32.0, 64.0);
        assert_eq!(utilization(&cores, Quantity::Count("cores")), "32 used / 64 total cores (50.0%)");

        let memory = Utilization::new(128_000.0, 256_000.0);
        assert_eq!(utilization(&memory, Quantity::Memory), "125.0 GB used / 250.0 GB total (50.0%)");

        let none = Utilization::new(0.0, 0.0);
        assert_eq!(utilization(&none, Quantity::Count("devices")), "0 used / 0 total devices (0.0%)");
        assert_eq!(utilization(&none, Quantity::Memory), "0 used / 0 total (0.0%)");
    }
}
