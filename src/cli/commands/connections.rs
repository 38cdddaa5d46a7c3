//! The account's own network.

use staffscout::export::staff_rows;

use super::OutputArgs;
use crate::cli::helpers::{finish_progress, report_outcome, write_output, Context};

pub async fn cmd_connections(
    ctx: &Context,
    max: Option<usize>,
    enrich: bool,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let max = max.unwrap_or_else(|| ctx.config.max_results());
    let (scraper, progress) = ctx.scraper().await?;
    let result = scraper.scrape_connections(max, enrich).await;
    finish_progress(scraper, progress).await;

    let outcome = result?;
    report_outcome(&outcome, "connections");
    write_output(&staff_rows(&outcome.items), output)
}
