//! Command line argument parsing for Phalanx CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::hashing::HashAlgorithm;

/// Phalanx - descriptor hash search
#[derive(Parser, Debug, Clone)]
#[command(name = "phalanx")]
#[command(about = "Approximate nearest-neighbour search over image descriptors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct PhalanxArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE", env = "PHALANX_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl PhalanxArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate hash function resources
    Generate(GenerateArgs),

    /// Print the hash codes of a descriptor
    Hash(HashArgs),

    /// Index documents and run a descriptor query against them
    Search(SearchArgs),
}

/// Arguments for generating hash resources
#[derive(Parser, Debug, Clone)]
pub struct GenerateArgs {
    /// Directory to write the resource files to
    #[arg(short, long, value_name = "DIR")]
    pub out: PathBuf,

    /// Random seed (overrides the configured one)
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Overwrite existing resource files
    #[arg(long)]
    pub force: bool,
}

/// Arguments for hashing a descriptor
#[derive(Parser, Debug, Clone)]
pub struct HashArgs {
    /// Hash family (BIT_SAMPLING or LSH)
    #[arg(long = "hash", value_name = "ALGORITHM")]
    pub algorithm: HashAlgorithm,

    /// Comma-separated descriptor components
    #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    pub descriptor: Vec<f64>,
}

/// Arguments for searching
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Documents to index (JSONL, one document per line)
    #[arg(short, long, value_name = "DOCUMENT_FILE")]
    pub documents: PathBuf,

    /// Query file (JSON)
    #[arg(short = 'Q', long, value_name = "QUERY_FILE")]
    pub query: PathBuf,

    /// Maximum number of results to return
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Minimum score threshold for results
    #[arg(long)]
    pub min_score: Option<f32>,

    /// Documents per segment
    #[arg(short, long, default_value = "1000")]
    pub batch_size: usize,

    /// Include a score explanation for every hit
    #[arg(long)]
    pub explain: bool,
}

/// Output formats available in CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_args() {
        let args = PhalanxArgs::try_parse_from([
            "phalanx",
            "hash",
            "--hash",
            "bit_sampling",
            "--descriptor",
            "1,-2.5,3",
        ])
        .unwrap();

        match args.command {
            Command::Hash(hash) => {
                assert_eq!(hash.algorithm, HashAlgorithm::BitSampling);
                assert_eq!(hash.descriptor, vec![1.0, -2.5, 3.0]);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(args.output_format, OutputFormat::Human);
    }

    #[test]
    fn test_unknown_hash_is_rejected() {
        let result = PhalanxArgs::try_parse_from([
            "phalanx",
            "hash",
            "--hash",
            "CEDD",
            "--descriptor",
            "1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbosity() {
        let args =
            PhalanxArgs::try_parse_from(["phalanx", "-vv", "generate", "--out", "res"]).unwrap();
        assert_eq!(args.verbosity(), 2);

        let args = PhalanxArgs::try_parse_from(["phalanx", "generate", "--out", "res", "-q", "-v"])
            .unwrap();
        assert_eq!(args.verbosity(), 0);

        let args = PhalanxArgs::try_parse_from(["phalanx", "generate", "--out", "res"]).unwrap();
        assert_eq!(args.verbosity(), 1);
    }

    #[test]
    fn test_search_args() {
        let args = PhalanxArgs::try_parse_from([
            "phalanx",
            "--format",
            "json",
            "search",
            "--documents",
            "docs.jsonl",
            "--query",
            "q.json",
            "--limit",
            "5",
        ])
        .unwrap();

        assert_eq!(args.output_format, OutputFormat::Json);
        match args.command {
            Command::Search(search) => {
                assert_eq!(search.limit, Some(5));
                assert_eq!(search.batch_size, 1000);
                assert!(!search.explain);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
