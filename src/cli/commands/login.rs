//! Session login.

use console::style;

use crate::cli::helpers::Context;

/// Authenticate and persist the session.
pub async fn cmd_login(ctx: &Context, fresh: bool) -> anyhow::Result<()> {
    let store = ctx.session_store();
    if fresh {
        store.clear()?;
        println!(
            "{} Cleared saved session at {}",
            style("→").cyan(),
            store.path().display()
        );
    }

    let session = ctx.authenticate().await?;
    println!(
        "{} Logged in ({} cookies saved to {})",
        style("✓").green(),
        session.cookies.len(),
        store.path().display()
    );
    Ok(())
}
