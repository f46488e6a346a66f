//! Search command - recall the nearest memories.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use mnemo_memory::{SearchMemoryRequest, SearchMemoryResponse, VectorInput};

use super::{Context, parse_vector, truncate};

/// Arguments for the search command.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Query text, embedded with the configured provider
    #[arg(required_unless_present = "vector", conflicts_with = "vector")]
    pub query: Option<String>,

    /// Query embedding as a JSON array
    #[arg(long, value_parser = parse_vector)]
    pub vector: Option<VectorInput>,

    /// Number of neighbors to return (default from [memory] default_k)
    #[arg(short, long)]
    pub k: Option<usize>,
}

/// Run the search command.
pub async fn run(args: SearchArgs, ctx: &Context) -> Result<()> {
    let session = ctx.open_session().await?;
    let dim = Style::new().dim();

    let response = match (args.vector, args.query) {
        (Some(vector), _) => session
            .service
            .search_request(&SearchMemoryRequest { vector, k: args.k })?,
        (None, Some(query)) => {
            let k = args.k.unwrap_or_else(|| ctx.default_k());
            if ctx.verbose {
                eprintln!(
                    "{}",
                    dim.apply_to(format!("Searching: \"{}\" (k: {})", query, k))
                );
            }
            let matches = session.service.search_text(&query, k).await?;
            SearchMemoryResponse { matches }
        }
        (None, None) => anyhow::bail!("either a query or --vector is required"),
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else if response.matches.is_empty() {
        println!("{}", dim.apply_to("No results found"));
    } else {
        println!("{}", style("Memory Search Results").bold());
        println!("{}", dim.apply_to("─".repeat(50)));
        println!();

        for (i, m) in response.matches.iter().enumerate() {
            println!("{}. {}", style(i + 1).cyan(), truncate(&m.text, 70));
            println!(
                "   {}",
                dim.apply_to(format!("(id: {}, distance: {:.4})", m.faiss_id, m.distance))
            );
            println!();
        }
    }

    Ok(())
}
