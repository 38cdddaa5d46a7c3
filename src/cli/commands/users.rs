//! Explicit profile enrichment.

use staffscout::export::staff_rows;
use staffscout::scraper::StaffAction;

use super::OutputArgs;
use crate::cli::helpers::{finish_progress, report_outcome, write_output, Context};

pub async fn cmd_users(
    ctx: &Context,
    public_ids: &[String],
    action: Option<StaffAction>,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let (scraper, progress) = ctx.scraper().await?;
    let result = scraper.scrape_users(public_ids, action).await;
    finish_progress(scraper, progress).await;

    let outcome = result?;
    report_outcome(&outcome, "users");
    write_output(&staff_rows(&outcome.items), output)
}
