//! CLI UI utilities for terminal output.
//!
//! This module provides colored output, a loading spinner, and styled
//! formatting for listings, paper details and chatbot answers.

use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;

use crate::api::{ChatAnswer, PaperAnswer};
use crate::listing::PageLink;
use crate::models::Publication;

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Render the pagination strip, e.g. `1 ... 9 [10] 11 ... 20`.
pub fn render_page_strip(links: &[PageLink], current_page: u32) -> String {
    links
        .iter()
        .map(|link| match link {
            PageLink::Page(n) if *n == current_page => format!("[{}]", n),
            PageLink::Page(n) => n.to_string(),
            PageLink::StartEllipsis | PageLink::EndEllipsis => "...".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Print the full record of one publication.
pub fn print_publication_detail(publication: &Publication) {
    print_section(&publication.title);
    println!("  {} {}", "Id:".dimmed(), publication.id);
    if !publication.authors.is_empty() {
        println!(
            "  {} {}",
            "Authors:".dimmed(),
            publication.authors.join(", ")
        );
    }
    println!("  {} {}", "Year:".dimmed(), publication.year.yellow());
    println!("  {} {}", "Link:".dimmed(), publication.link.cyan());
    if !publication.r#abstract.is_empty() {
        println!();
        println!("{}", publication.r#abstract);
    }
}

/// Print a corpus-wide chatbot answer with its supporting passages.
pub fn print_chat_answer(answer: &ChatAnswer) {
    print_section("Answer");
    println!("{}", answer.summary);

    if !answer.retrieved_chunks.is_empty() {
        print_section("Retrieved passages");
        for (i, chunk) in answer.retrieved_chunks.iter().enumerate() {
            println!(
                "{} {}",
                format!("[{}]", i + 1).green().bold(),
                truncate_with_ellipsis(chunk.trim(), 300)
            );
        }
    }
}

/// Print a single-paper chatbot answer.
pub fn print_paper_answer(answer: &PaperAnswer) {
    print_section("Answer");
    println!("{}", answer.answer);
    println!();
    println!("  {} {}", "Paper:".dimmed(), answer.link.cyan());
}

/// Format a number with commas.
pub fn format_number(n: u64) -> String {
    n.to_string()
        .chars()
        .rev()
        .collect::<Vec<_>>()
        .chunks(3)
        .map(|c| c.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(",")
        .chars()
        .rev()
        .collect()
}

/// Truncate text to fit within the given width, unicode-aware.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width <= 3 {
        return "...".to_string();
    }

    let total_width: usize = text
        .chars()
        .map(|c| unicode_width::UnicodeWidthChar::width(c).unwrap_or(1))
        .sum();
    if total_width <= max_width {
        return text.to_string();
    }

    let limit = max_width - 3;
    let mut used = 0;
    let mut truncated = String::new();
    for c in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(1);
        if used + w > limit {
            break;
        }
        used += w;
        truncated.push(c);
    }
    truncated.push_str("...");
    truncated
}

/// Loading spinner shown while a fetch is in flight.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// Set the message.
    pub fn set_message(&self, msg: &str) {
        self.pb.set_message(msg.to_string());
    }

    /// Finish with error message.
    pub fn finish_with_error(&self, msg: &str) {
        self.pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.red} {msg}")
                .unwrap()
                .tick_chars("✗ "),
        );
        self.pb.finish_with_message(msg.to_string());
    }

    /// Stop the spinner and erase it, making room for real output.
    pub fn finish_and_clear(&self) {
        self.pb.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_page_strip() {
        let links = vec![
            PageLink::Page(1),
            PageLink::StartEllipsis,
            PageLink::Page(9),
            PageLink::Page(10),
            PageLink::Page(11),
            PageLink::EndEllipsis,
            PageLink::Page(20),
        ];
        assert_eq!(render_page_strip(&links, 10), "1 ... 9 [10] 11 ... 20");
    }

    #[test]
    fn test_render_page_strip_single_page() {
        assert_eq!(render_page_strip(&[PageLink::Page(1)], 1), "[1]");
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("Hello", 10), "Hello");
        assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
        assert_eq!(truncate_with_ellipsis("Hi", 10), "Hi");
        assert_eq!(truncate_with_ellipsis("", 10), "");
        assert_eq!(truncate_with_ellipsis("Hello", 3), "...");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1000000), "1,000,000");
        assert_eq!(format_number(123), "123");
    }
}
