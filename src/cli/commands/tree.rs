use crate::cli::commands::{resolve_matrix, MatrixInputArgs};
use crate::cli::output::success;
use crate::cli::Context;
use crate::core::clustering::{default_labels, upgma};
use crate::utils::progress::create_spinner;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct TreeArgs {
    #[command(flatten)]
    pub input: MatrixInputArgs,

    /// Write the Newick tree here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Label leaves with sequence ids instead of `Seq <n>`
    #[arg(long)]
    pub ids: bool,
}

pub fn run(ctx: Context, args: TreeArgs) -> anyhow::Result<()> {
    let ctx = ctx.with_scoring(&args.input.scoring);
    let (sequences, matrix) = resolve_matrix(&ctx, &args.input)?;

    let spinner = create_spinner("Clustering with UPGMA", ctx.config.performance.show_progress);
    let linkage = upgma(&matrix);
    spinner.finish_and_clear();
    let linkage = linkage?;

    let labels = if args.ids && sequences.len() == matrix.size() {
        sequences.iter().map(|s| s.id.clone()).collect()
    } else {
        default_labels(matrix.size())
    };
    let newick = linkage.to_newick(&labels)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", newick))?;
            success(&format!("Wrote tree to {}", path.display()));
        }
        None => println!("{}", newick),
    }
    Ok(())
}
