pub mod align;
pub mod extremes;
pub mod matrix;
pub mod tree;

use crate::bio::sequence::{load_sequences, Sequence};
use crate::cli::{Context, ScoringArgs};
use crate::core::cache::FileMatrixCache;
use crate::core::paths::{keyed_matrix_name, UNKEYED_MATRIX_NAME};
use crate::core::similarity::{SimilarityBuilder, SimilarityMatrix};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

/// Input options for commands that need a similarity matrix
#[derive(Args, Debug, Clone)]
pub struct MatrixInputArgs {
    /// Sequence file: one sequence per line, or FASTA
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Matrix file to reuse or create; an existing file is loaded as-is
    #[arg(long, value_name = "FILE")]
    pub cache: Option<PathBuf>,

    #[command(flatten)]
    pub scoring: ScoringArgs,
}

/// Load the sequences and the matching similarity matrix, computing it on a cache miss
pub fn resolve_matrix(
    ctx: &Context,
    args: &MatrixInputArgs,
) -> anyhow::Result<(Vec<Sequence>, SimilarityMatrix)> {
    let sequences = load_sequences(&args.input)?;
    info!("Loaded {} sequences", sequences.len());

    let scoring = ctx.substitution_matrix()?;
    let builder = SimilarityBuilder::from_config(&scoring, &ctx.config);

    let matrix = match &args.cache {
        Some(path) => builder.build_at(&sequences, path)?,
        None => {
            let key = if ctx.config.cache.keyed {
                keyed_matrix_name(&builder.cache_key(&sequences))
            } else {
                UNKEYED_MATRIX_NAME.to_string()
            };
            builder.build(&sequences, &FileMatrixCache::new(ctx.cache_dir()), &key)?
        }
    };

    if matrix.size() != sequences.len() {
        crate::cli::output::warning(&format!(
            "Cached matrix covers {} sequences but the input has {}",
            matrix.size(),
            sequences.len()
        ));
    }

    Ok((sequences, matrix))
}
