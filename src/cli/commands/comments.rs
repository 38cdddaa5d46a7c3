//! Post comments.

use staffscout::export::CommentRow;

use super::OutputArgs;
use crate::cli::helpers::{finish_progress, report_outcome, write_output, Context};

pub async fn cmd_comments(ctx: &Context, post_ids: &[String], output: &OutputArgs) -> anyhow::Result<()> {
    let (scraper, progress) = ctx.scraper().await?;
    let result = scraper.scrape_comments(post_ids).await;
    finish_progress(scraper, progress).await;

    let outcome = result?;
    report_outcome(&outcome, "comments");
    let rows: Vec<CommentRow> = outcome.items.iter().map(CommentRow::from).collect();
    write_output(&rows, output)
}
