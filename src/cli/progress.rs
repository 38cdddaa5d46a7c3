//! Progress display driven by scraper events.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use staffscout::scraper::ScrapeEvent;

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
            .unwrap()
            .progress_chars("█▓░"),
    );
    pb.set_message("Enriching");
    pb
}

/// Render events until every sender is dropped.
pub fn spawn(mut rx: mpsc::Receiver<ScrapeEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut current: Option<ProgressBar> = None;

        while let Some(event) = rx.recv().await {
            match event {
                ScrapeEvent::SearchStarted { label, ceiling } => {
                    if let Some(pb) = current.take() {
                        pb.finish_and_clear();
                    }
                    current = Some(spinner(format!("Searching {} (up to {})", label, ceiling)));
                }
                ScrapeEvent::SearchFinished { label, found } => {
                    if let Some(pb) = current.take() {
                        pb.finish_and_clear();
                    }
                    eprintln!("{} {}: {} profiles", style("→").cyan(), label, found);
                }
                ScrapeEvent::EnrichStarted { total } => {
                    if let Some(pb) = current.take() {
                        pb.finish_and_clear();
                    }
                    if total > 0 {
                        current = Some(bar(total));
                    }
                }
                ScrapeEvent::Enriched { index, name, .. } => {
                    if let Some(pb) = &current {
                        pb.set_position(index as u64);
                        pb.set_message(name);
                    }
                }
                ScrapeEvent::Halted { reason } => {
                    let line = format!("{} {}", style("!").yellow(), reason);
                    match &current {
                        Some(pb) => pb.println(line),
                        None => eprintln!("{}", line),
                    }
                }
            }
        }

        if let Some(pb) = current.take() {
            pb.finish_and_clear();
        }
    })
}
