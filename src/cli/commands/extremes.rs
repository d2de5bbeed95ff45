use crate::cli::commands::matrix::describe_pair;
use crate::cli::output::{format_number, info, section_header, tree_item};
use crate::core::cache::load_matrix;
use crate::core::extremes::find_extremes;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ExtremesArgs {
    /// Similarity matrix written by `seqsim matrix`
    #[arg(value_name = "MATRIX")]
    pub matrix: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ExtremesArgs) -> anyhow::Result<()> {
    let matrix = load_matrix(&args.matrix)?;
    let (closest, farthest) = find_extremes(&matrix)?;

    if args.json {
        let report = serde_json::json!({
            "closest": closest,
            "farthest": farthest,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    section_header(&format!("Extremes of {}", args.matrix.display()));
    info(&format!(
        "{} sequences, {} pairs",
        format_number(matrix.size()),
        format_number(crate::utils::parallel::pair_count(matrix.size()))
    ));
    tree_item(false, "Closest sequences", Some(&describe_pair(&closest)));
    tree_item(true, "Farthest sequences", Some(&describe_pair(&farthest)));
    Ok(())
}
