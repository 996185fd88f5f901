//! Status and score coloring. `console` disables styling when stdout is not a terminal.

use console::{style, StyledObject};

/// Color a request status: success green, no_data yellow, error red.
pub fn colorize_status(status: &str) -> StyledObject<&str> {
    match status {
        "success" => style(status).green(),
        "no_data" => style(status).yellow(),
        "error" => style(status).red().bold(),
        _ => style(status),
    }
}

/// Color a quality score relative to the stopping threshold.
pub fn colorize_score(score: f64, threshold: f64) -> StyledObject<String> {
    let text = format!("{score:.2}");
    if score >= threshold {
        style(text).green().bold()
    } else if score >= threshold - 0.2 {
        style(text).yellow()
    } else {
        style(text).red()
    }
}
