use crate::bio::alignment::SmithWaterman;
use crate::cli::output::{section_header, tree_item};
use crate::cli::{Context, ScoringArgs};
use clap::Args;
use colored::*;

/// Residues shown per block of the alignment view
const LINE_WIDTH: usize = 60;

#[derive(Args, Debug)]
pub struct AlignArgs {
    /// First sequence
    #[arg(value_name = "SEQ_A")]
    pub seq_a: String,

    /// Second sequence
    #[arg(value_name = "SEQ_B")]
    pub seq_b: String,

    #[command(flatten)]
    pub scoring: ScoringArgs,
}

pub fn run(ctx: Context, args: AlignArgs) -> anyhow::Result<()> {
    let ctx = ctx.with_scoring(&args.scoring);
    let matrix = ctx.substitution_matrix()?;
    let aligner = SmithWaterman::new(&matrix, ctx.config.alignment.gap_penalty)
        .with_max_cells(ctx.config.performance.max_cells);

    let result = aligner.try_align(args.seq_a.trim().as_bytes(), args.seq_b.trim().as_bytes())?;

    section_header("Local Alignment");
    tree_item(false, "Score", Some(&format!("{}", result.score)));
    if result.is_empty() {
        tree_item(true, "Alignment", Some(&"none (no positive-scoring region)".dimmed().to_string()));
        return Ok(());
    }

    tree_item(
        false,
        "Region A",
        Some(&format!("{}..{}", result.range_a.0 + 1, result.range_a.1)),
    );
    tree_item(
        false,
        "Region B",
        Some(&format!("{}..{}", result.range_b.0 + 1, result.range_b.1)),
    );
    tree_item(false, "Length", Some(&result.len().to_string()));
    tree_item(false, "Gaps", Some(&result.gaps().to_string()));
    tree_item(
        true,
        "Identity",
        Some(&format!("{:.1}%", result.identity() * 100.0)),
    );
    println!();

    let match_line = result.match_line();
    for start in (0..result.len()).step_by(LINE_WIDTH) {
        let end = (start + LINE_WIDTH).min(result.len());
        println!("  {}", String::from_utf8_lossy(&result.aligned_a[start..end]));
        println!("  {}", String::from_utf8_lossy(&match_line[start..end]).dimmed());
        println!("  {}", String::from_utf8_lossy(&result.aligned_b[start..end]));
        println!();
    }

    Ok(())
}
