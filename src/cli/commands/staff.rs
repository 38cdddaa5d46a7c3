//! Company staff search across facets.

use console::style;

use staffscout::export::staff_rows;
use staffscout::facets::{dedup_staff, fan_out};
use staffscout::scraper::{StaffAction, StaffQuery};
use staffscout::ScrapeError;

use super::OutputArgs;
use crate::cli::helpers::{finish_progress, write_output, Context};

pub struct StaffArgs {
    pub company: String,
    pub terms: Vec<String>,
    pub locations: Vec<String>,
    pub max: Option<usize>,
    pub enrich: bool,
    pub action: Option<StaffAction>,
}

/// Run one query per (term, location) facet, then merge by identity.
pub async fn cmd_staff(ctx: &Context, args: StaffArgs, output: &OutputArgs) -> anyhow::Result<()> {
    let facets = fan_out(&args.terms, &args.locations);
    let max_results = args.max.unwrap_or_else(|| ctx.config.max_results());
    let (scraper, progress) = ctx.scraper().await?;

    let mut collected = Vec::new();
    let mut stopped: Option<ScrapeError> = None;

    for facet in &facets {
        let query = StaffQuery {
            term: facet.term.clone(),
            location: facet.location.clone(),
            max_results,
            enrich: args.enrich,
            action: args.action,
            ..StaffQuery::new(args.company.clone())
        };

        match scraper.scrape_staff(&query).await {
            Ok(outcome) => {
                collected.extend(outcome.items);
                if outcome.halted.is_some() {
                    stopped = outcome.halted;
                    break;
                }
            }
            Err(e) if collected.is_empty() => {
                finish_progress(scraper, progress).await;
                return Err(e.into());
            }
            Err(e) => {
                stopped = Some(e);
                break;
            }
        }
    }
    finish_progress(scraper, progress).await;

    let total = collected.len();
    let staff = dedup_staff(collected);
    match &stopped {
        Some(e) => eprintln!(
            "{} Stopped early ({}); keeping {} profiles",
            style("!").yellow(),
            e,
            staff.len()
        ),
        None => eprintln!(
            "{} {} profiles across {} facets ({} duplicates removed)",
            style("✓").green(),
            staff.len(),
            facets.len(),
            total - staff.len()
        ),
    }

    write_output(&staff_rows(&staff), output)
}
