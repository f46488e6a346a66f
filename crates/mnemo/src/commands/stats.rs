//! Stats command - index and store statistics.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use mnemo_memory::{RecordStore, ServiceState};

use super::Context;

/// Arguments for the stats command.
#[derive(Args, Debug)]
pub struct StatsArgs {}

/// Run the stats command.
pub async fn run(_args: StatsArgs, ctx: &Context) -> Result<()> {
    let session = ctx.open_session().await?;
    let stats = session.service.stats();
    let records = session.service.records().count()?;

    if ctx.json_output {
        let value = serde_json::json!({
            "records": records,
            "index": stats,
            "embedding": {
                "provider": session.embedder.name(),
                "dimensions": session.embedder.dimensions(),
            },
            "database": session.database,
            "load": session.load,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let dim = Style::new().dim();

    println!("{}", style("Memory Statistics").bold());
    println!("{}", dim.apply_to("─".repeat(50)));
    println!();
    println!("  Records:     {}", style(records).cyan());
    println!("  Indexed:     {}", style(stats.index.indexed).cyan());
    println!("  Rebuilds:    {}", style(stats.index.rebuilds).cyan());
    println!("  Database:    {}", dim.apply_to(session.database.display()));
    println!();

    println!("{}", style("Embedding Configuration").bold());
    println!("{}", dim.apply_to("─".repeat(50)));
    println!();
    println!("  Provider:    {}", style(session.embedder.name()).cyan());
    println!("  Dimensions:  {}", style(stats.index.dimensions).cyan());
    match stats.state {
        ServiceState::Ready if session.load.skipped == 0 => {
            println!("  Status:      {}", Style::new().green().apply_to("ok"))
        }
        ServiceState::Ready => println!(
            "  Status:      {}",
            Style::new()
                .yellow()
                .apply_to(format!("{} records could not be embedded", session.load.skipped))
        ),
        ServiceState::Uninitialized => {
            println!("  Status:      {}", Style::new().red().apply_to("not loaded"))
        }
    }
    println!("  Load time:   {:.1?}", session.load.elapsed);
    println!();

    Ok(())
}
