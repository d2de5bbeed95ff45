//! Progress bars for long-running batches

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Counting bar, drawn to stderr only when `visible`
pub fn create_progress_bar(total: u64, message: &str, visible: bool) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if !visible {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    pb.set_message(message.to_string());
    pb
}

pub fn create_spinner(message: &str, visible: bool) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if !visible {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_bar_still_counts() {
        let pb = create_progress_bar(5, "Aligning", false);
        pb.inc(3);
        assert_eq!(pb.position(), 3);
        assert_eq!(pb.length(), Some(5));
        pb.finish_and_clear();
    }
}
