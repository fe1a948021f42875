//! Output formatting for CLI commands.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, PhalanxArgs};
use crate::error::Result;
use crate::query::SearchResults;
use crate::query::scorer::Explanation;

/// One written hash resource.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResourceFile {
    pub hash: String,
    pub path: String,
    pub size_bytes: u64,
    pub num_functions: usize,
    pub dimension: usize,
}

/// Result structure for resource generation.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResult {
    pub seed: u64,
    pub files: Vec<ResourceFile>,
}

/// Result structure for hashing a descriptor.
#[derive(Debug, Serialize, Deserialize)]
pub struct HashResult {
    pub hash: String,
    pub dimension: usize,
    pub codes: Vec<i32>,
}

/// Result structure for search operations.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchOutput {
    pub query: String,
    pub documents_indexed: u64,
    pub segments: usize,
    pub duration_ms: u64,
    #[serde(flatten)]
    pub results: SearchResults,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub explanations: Vec<Explanation>,
}

impl fmt::Display for GenerationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Seed: {}", self.seed)?;
        for file in &self.files {
            writeln!(
                f,
                "{}: {} ({} functions, dimension {}, {})",
                file.hash,
                file.path,
                file.num_functions,
                file.dimension,
                format_bytes(file.size_bytes)
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for HashResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hash: {}", self.hash)?;
        writeln!(f, "Dimension: {}", self.dimension)?;
        let codes: Vec<String> = self.codes.iter().map(|c| c.to_string()).collect();
        writeln!(f, "Codes: {}", codes.join(" "))
    }
}

impl fmt::Display for SearchOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Search Results:")?;
        writeln!(f, "═══════════════")?;

        for (i, hit) in self.results.hits.iter().enumerate() {
            writeln!(f)?;
            writeln!(f, "Result {}: {} (Score: {:.6})", i + 1, hit.id, hit.score)?;
            if let Some(explanation) = self.explanations.get(i) {
                write_explanation(f, explanation, 1)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Query: {}", self.query)?;
        writeln!(
            f,
            "Total hits: {} of {} documents in {} segments",
            self.results.total_hits, self.documents_indexed, self.segments
        )?;
        writeln!(f, "Search time: {}ms", self.duration_ms)
    }
}

fn write_explanation(
    f: &mut fmt::Formatter<'_>,
    explanation: &Explanation,
    depth: usize,
) -> fmt::Result {
    writeln!(
        f,
        "{:indent$}{} = {}",
        "",
        explanation.value,
        explanation.description,
        indent = depth * 2
    )?;
    for detail in &explanation.details {
        write_explanation(f, detail, depth + 1)?;
    }
    Ok(())
}

/// Output a command result in the requested format.
pub fn output_result<T: Serialize + fmt::Display>(
    message: &str,
    result: &T,
    args: &PhalanxArgs,
) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

fn output_human<T: fmt::Display>(message: &str, result: &T, args: &PhalanxArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }
    print!("{result}");
    Ok(())
}

fn output_json<T: Serialize>(result: &T, args: &PhalanxArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format a byte count with a binary unit.
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SegmentId;
    use crate::query::SearchHit;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1048576), "1.0 MB");
    }

    #[test]
    fn test_hash_result_human() {
        let result = HashResult {
            hash: "LSH".to_string(),
            dimension: 3,
            codes: vec![4, -1, 0],
        };
        assert_eq!(result.to_string(), "Hash: LSH\nDimension: 3\nCodes: 4 -1 0\n");
    }

    #[test]
    fn test_search_output_json_is_flat() {
        let output = SearchOutput {
            query: "descriptor(d, hash=LSH, dims=2)".to_string(),
            documents_indexed: 3,
            segments: 1,
            duration_ms: 0,
            results: SearchResults {
                hits: vec![SearchHit {
                    segment: SegmentId(0),
                    doc_id: 1,
                    id: "img-1".to_string(),
                    score: 2.0,
                }],
                total_hits: 1,
                max_score: 2.0,
            },
            explanations: Vec::new(),
        };

        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["total_hits"], 1);
        assert_eq!(value["hits"][0]["id"], "img-1");
        assert!(value.get("explanations").is_none());

        let human = output.to_string();
        assert!(human.contains("Result 1: img-1 (Score: 2.000000)"));
        assert!(human.contains("Total hits: 1 of 3 documents in 1 segments"));
    }
}
