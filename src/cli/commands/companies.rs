//! Company lookups.

use staffscout::export::CompanyRow;

use super::OutputArgs;
use crate::cli::helpers::{finish_progress, report_outcome, write_output, Context};

pub async fn cmd_companies(ctx: &Context, names: &[String], output: &OutputArgs) -> anyhow::Result<()> {
    let (scraper, progress) = ctx.scraper().await?;
    let result = scraper.scrape_companies(names).await;
    finish_progress(scraper, progress).await;

    let outcome = result?;
    report_outcome(&outcome, "companies");
    let rows: Vec<CompanyRow> = outcome.items.iter().map(CompanyRow::from).collect();
    write_output(&rows, output)
}
