pub mod commands;
pub mod output;

use crate::bio::alignment::SubstitutionMatrix;
use crate::core::config::{load_config, Config};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "seqsim",
    version,
    about = "All-pairs local alignment similarity for protein sequences",
    long_about = "seqsim aligns every pair of sequences with Smith-Waterman, normalizes the \
                  scores by self-alignment into a similarity matrix, caches that matrix on disk, \
                  and derives closest/farthest pairs and a UPGMA tree from it."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Maximum worker threads (0 = use the configured cap)
    #[arg(short = 'j', long, default_value = "0", global = true)]
    pub threads: usize,

    /// Configuration file (TOML)
    #[arg(short = 'c', long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Hide progress bars
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build (or load) the similarity matrix for a set of sequences
    Matrix(commands::matrix::MatrixArgs),

    /// Locally align two sequences and show the alignment
    Align(commands::align::AlignArgs),

    /// Report the closest and farthest pair of a saved matrix
    Extremes(commands::extremes::ExtremesArgs),

    /// Cluster sequences with UPGMA and print the tree in Newick format
    Tree(commands::tree::TreeArgs),
}

/// Scoring options shared by every command that aligns
#[derive(Args, Debug, Clone, Default)]
pub struct ScoringArgs {
    /// Gap penalty added per gap column (e.g. -12)
    #[arg(short, long, allow_hyphen_values = true)]
    pub gap: Option<f32>,

    /// Substitution matrix file (default: bundled BLOSUM62)
    #[arg(short, long, value_name = "FILE")]
    pub matrix: Option<PathBuf>,
}

/// Global flags and config file merged into one configuration
pub struct Context {
    pub config: Config,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => load_config(path)?,
            None => Config::default(),
        };

        if cli.threads > 0 {
            config.performance.max_workers = cli.threads;
        }
        if cli.quiet {
            config.performance.show_progress = false;
        }

        Ok(Self { config })
    }

    /// Apply per-command scoring flags on top of the configuration
    pub fn with_scoring(mut self, scoring: &ScoringArgs) -> Self {
        if let Some(gap) = scoring.gap {
            self.config.alignment.gap_penalty = gap;
        }
        if let Some(matrix) = &scoring.matrix {
            self.config.alignment.matrix = Some(matrix.clone());
        }
        self
    }

    pub fn substitution_matrix(&self) -> crate::Result<SubstitutionMatrix> {
        let matrix = match &self.config.alignment.matrix {
            Some(path) => SubstitutionMatrix::load(path)?,
            None => SubstitutionMatrix::blosum62()?,
        };
        Ok(matrix.with_default_score(self.config.alignment.default_score))
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.config.cache_dir()
    }
}
