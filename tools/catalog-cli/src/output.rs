//! Output formatting for the CLI.

use catalog_browse::{Fallback, PageSlot, ViewStatus};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output handler for CLI messages.
#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    /// Create a new output handler.
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    /// Print an info message.
    pub fn info(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("ℹ").blue(), msg);
    }

    /// Print a success message.
    pub fn success(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("✓").green(), msg);
    }

    /// Print a warning message.
    pub fn warn(&self, msg: &str) {
        if self.json {
            return;
        }
        eprintln!("{} {}", style("⚠").yellow(), msg);
    }

    /// Print an error message.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
            return;
        }
        eprintln!("{} {}", style("✗").red(), style(msg).red());
    }

    /// Print a debug message (only in verbose mode).
    pub fn debug(&self, msg: &str) {
        if !self.verbose || self.json {
            return;
        }
        eprintln!("{} {}", style("→").dim(), style(msg).dim());
    }

    /// Print a header/title.
    pub fn header(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a rendered block as is.
    pub fn block(&self, text: &str) {
        if self.json {
            return;
        }
        print!("{}", text);
    }

    /// Print JSON output.
    pub fn json<T: serde::Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string_pretty(value) {
            println!("{}", json);
        }
    }

    /// Print a key-value pair.
    pub fn kv(&self, key: &str, value: &str) {
        if self.json {
            return;
        }
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Show the generic fallback for a view that failed to render.
    pub fn fallback(&self, fallback: &Fallback) {
        if self.json {
            self.json(fallback);
            return;
        }
        eprintln!("{} {}", style("✗").red(), style(&fallback.message).red().bold());
        if self.verbose {
            eprintln!("  {}", style(&fallback.detail).dim());
        }
        eprintln!("  {}", style("Reload: run the same command again.").yellow());
    }

    /// Create a spinner for indeterminate progress.
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.json {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }

    /// Check if JSON mode is enabled.
    pub fn is_json(&self) -> bool {
        self.json
    }
}

/// Page strip with the current page highlighted.
pub fn page_strip(slots: &[PageSlot], current: u32) -> String {
    slots
        .iter()
        .map(|slot| match slot {
            PageSlot::Number(n) if *n == current => style(format!("[{}]", n)).cyan().bold().to_string(),
            PageSlot::Number(n) => n.to_string(),
            PageSlot::Ellipsis => style("…").dim().to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Short status label for a view.
pub fn status_badge(status: &ViewStatus) -> String {
    match status {
        ViewStatus::Ready => style("ready").green().to_string(),
        ViewStatus::Loading => style("loading").yellow().to_string(),
        ViewStatus::Empty => style("empty").dim().to_string(),
        ViewStatus::Failed { not_found: true, .. } => style("not found").red().to_string(),
        ViewStatus::Failed { .. } => style("failed").red().to_string(),
    }
}

/// Enabled or greyed-out navigation control.
pub fn control(label: &str, enabled: bool) -> String {
    if enabled {
        style(label).bold().to_string()
    } else {
        style(label).dim().strikethrough().to_string()
    }
}

/// Horizontal bar for a stat value out of `max`.
pub fn stat_bar(value: u32, max: u32, width: usize) -> String {
    let filled = if max == 0 {
        0
    } else {
        ((value.min(max) as usize) * width).div_ceil(max as usize)
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_bar() {
        assert_eq!(stat_bar(0, 100, 10), "░░░░░░░░░░");
        assert_eq!(stat_bar(100, 100, 4), "████");
        assert_eq!(stat_bar(255, 100, 4), "████");
        assert_eq!(stat_bar(50, 100, 4), "██░░");
        assert_eq!(stat_bar(5, 0, 3), "░░░");
    }

    #[test]
    fn test_page_strip_contains_all_slots() {
        console::set_colors_enabled(false);
        let strip = page_strip(
            &[PageSlot::Number(1), PageSlot::Ellipsis, PageSlot::Number(4), PageSlot::Number(5)],
            4,
        );
        assert_eq!(strip, "1 … [4] 5");
    }
}
