//! Add command - remember a text.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use mnemo_memory::{AddMemoryRequest, VectorInput};

use super::{Context, parse_vector};

/// Arguments for the add command.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Text to remember
    pub text: String,

    /// Owning user id
    #[arg(short, long, default_value = "1")]
    pub owner: i64,

    /// Precomputed embedding as a JSON array (computed from the text if omitted)
    #[arg(long, value_parser = parse_vector)]
    pub vector: Option<VectorInput>,
}

/// Run the add command.
pub async fn run(args: AddArgs, ctx: &Context) -> Result<()> {
    let session = ctx.open_session().await?;
    let request = AddMemoryRequest {
        vector: args.vector,
        text: args.text,
        owner_id: args.owner,
    };

    let response = session.service.add(request).await?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        let green = Style::new().green();
        println!("{} {}", green.apply_to("✓"), response.message);
        if ctx.verbose {
            let dim = Style::new().dim();
            println!(
                "  {}",
                dim.apply_to(format!("id {} in {}", style(response.faiss_id).cyan(), session.database.display()))
            );
        }
    }

    Ok(())
}
