use crate::cli::commands::{resolve_matrix, MatrixInputArgs};
use crate::cli::output::{format_number, section_header, success, tree_item};
use crate::cli::Context;
use crate::core::extremes::{find_extremes, PairScore};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct MatrixArgs {
    #[command(flatten)]
    pub input: MatrixInputArgs,

    /// Also write the matrix as tab-separated text
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the matrix as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

pub fn run(ctx: Context, args: MatrixArgs) -> anyhow::Result<()> {
    let ctx = ctx.with_scoring(&args.input.scoring);
    let (sequences, matrix) = resolve_matrix(&ctx, &args.input)?;

    if let Some(path) = &args.output {
        matrix.write_tsv(path)?;
        success(&format!("Wrote similarity matrix to {}", path.display()));
    }

    if args.json {
        println!("{}", matrix.to_json()?);
        return Ok(());
    }

    section_header("Similarity Matrix");
    tree_item(false, "Sequences", Some(&format_number(sequences.len())));
    tree_item(
        matrix.size() < 2,
        "Matrix size",
        Some(&format!("{} x {}", matrix.size(), matrix.size())),
    );

    if matrix.size() >= 2 {
        let (closest, farthest) = find_extremes(&matrix)?;
        tree_item(false, "Closest sequences", Some(&describe_pair(&closest)));
        tree_item(true, "Farthest sequences", Some(&describe_pair(&farthest)));
    }

    Ok(())
}

/// 1-based pair description
pub fn describe_pair(pair: &PairScore) -> String {
    format!(
        "{} and {} with score {:.3}",
        pair.i + 1,
        pair.j + 1,
        pair.score
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_pair_is_one_based() {
        let pair = PairScore {
            i: 0,
            j: 4,
            score: 0.91234,
        };
        assert_eq!(describe_pair(&pair), "1 and 5 with score 0.912");
    }
}
