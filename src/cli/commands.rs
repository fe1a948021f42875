//! Command implementations for Phalanx CLI.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use log::{debug, info, warn};

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::{HashingConfig, PhalanxConfig};
use crate::error::{PhalanxError, Result};
use crate::hashing::{HashAlgorithm, HashFamilies};
use crate::index::{Document, IndexWriter};
use crate::query::{DescriptorQuery, DescriptorQueryRequest};
use crate::search::{SearchRequest, Searcher};

/// Execute a CLI command.
pub fn execute_command(args: PhalanxArgs) -> Result<()> {
    let config = load_config(&args)?;
    match &args.command {
        Command::Generate(generate_args) => {
            let result = generate_resources(generate_args, &config.hashing)?;
            output_result("Hash resources generated", &result, &args)
        }
        Command::Hash(hash_args) => {
            let result = hash_descriptor(hash_args, &config.hashing)?;
            output_result("Descriptor hashed", &result, &args)
        }
        Command::Search(search_args) => {
            let result = search_documents(search_args, &config)?;
            output_result("Search completed", &result, &args)
        }
    }
}

/// Load the configuration file named on the command line, or the defaults.
pub fn load_config(args: &PhalanxArgs) -> Result<PhalanxConfig> {
    let config = match &args.config {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            PhalanxConfig::from_file(path)?
        }
        None => PhalanxConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn resource_file(config: &HashingConfig, algorithm: HashAlgorithm) -> &str {
    match algorithm {
        HashAlgorithm::BitSampling => &config.bit_sampling_file,
        HashAlgorithm::Lsh => &config.lsh_file,
    }
}

/// Generate both hash families and write them as resource files.
pub fn generate_resources(args: &GenerateArgs, config: &HashingConfig) -> Result<GenerationResult> {
    let config = HashingConfig {
        seed: args.seed.unwrap_or(config.seed),
        ..config.clone()
    };

    for algorithm in HashAlgorithm::ALL {
        let path = args.out.join(resource_file(&config, algorithm));
        if path.exists() && !args.force {
            return Err(PhalanxError::invalid_argument(format!(
                "{} already exists. Use --force to overwrite.",
                path.display()
            )));
        }
    }
    fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;

    let families = HashFamilies::generate(&config);
    let mut files = Vec::new();
    for family in families.families() {
        let algorithm = family.algorithm();
        let path = args.out.join(resource_file(&config, algorithm));
        let bytes = family.to_bytes()?;
        fs::write(&path, &bytes).with_context(|| format!("writing {}", path.display()))?;
        info!("Wrote {algorithm} hash functions to {}", path.display());

        files.push(ResourceFile {
            hash: algorithm.name().to_string(),
            path: path.display().to_string(),
            size_bytes: bytes.len() as u64,
            num_functions: family.num_functions(),
            dimension: family.dimension(),
        });
    }

    Ok(GenerationResult {
        seed: config.seed,
        files,
    })
}

/// Hash one descriptor with the configured family.
pub fn hash_descriptor(args: &HashArgs, config: &HashingConfig) -> Result<HashResult> {
    let families = HashFamilies::load(config);
    let family = families.get(args.algorithm)?;
    let codes = family.generate_hashes(&args.descriptor)?;

    Ok(HashResult {
        hash: args.algorithm.name().to_string(),
        dimension: args.descriptor.len(),
        codes,
    })
}

/// Read a descriptor query from a JSON file.
pub fn read_query(path: &Path) -> Result<DescriptorQuery> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading query {}", path.display()))?;
    let request: DescriptorQueryRequest = serde_json::from_str(&text)?;
    DescriptorQuery::try_from(request)
}

/// Index a JSONL document file and run one query against it.
pub fn search_documents(args: &SearchArgs, config: &PhalanxConfig) -> Result<SearchOutput> {
    if args.batch_size == 0 {
        return Err(PhalanxError::invalid_argument(
            "batch size must be greater than zero",
        ));
    }

    // The query is validated before any document is read.
    let query = read_query(&args.query)?;
    let families = Arc::new(HashFamilies::load(&config.hashing));
    families.get(query.hash())?;

    let file = File::open(&args.documents)
        .with_context(|| format!("opening documents {}", args.documents.display()))?;
    let mut writer = IndexWriter::new(Arc::clone(&families));

    for (line_num, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let document: Document = match serde_json::from_str(&line) {
            Ok(document) => document,
            Err(e) => {
                warn!("Skipping line {}: {e}", line_num + 1);
                continue;
            }
        };
        let id = document.id.clone();
        if let Err(e) = writer.add_document(document) {
            warn!("Skipping document {id} on line {}: {e}", line_num + 1);
            continue;
        }

        if writer.pending_docs() >= args.batch_size {
            writer.commit();
        }
    }
    writer.commit();

    let searcher = Searcher::new(writer.reader(), families, config.search.clone())?;
    let mut request = SearchRequest::new(query.clone());
    if let Some(limit) = args.limit {
        request = request.limit(limit);
    }
    if let Some(min_score) = args.min_score {
        request = request.min_score(min_score);
    }

    let start_time = Instant::now();
    let results = searcher.execute(&request)?;
    let duration = start_time.elapsed();

    let explanations = if args.explain {
        results
            .hits
            .iter()
            .map(|hit| searcher.explain(&query, hit.segment, hit.doc_id))
            .collect::<Result<Vec<_>>>()?
    } else {
        Vec::new()
    };

    Ok(SearchOutput {
        query: query.to_string(),
        documents_indexed: searcher.reader().num_docs(),
        segments: searcher.reader().segments().len(),
        duration_ms: duration.as_millis() as u64,
        results,
        explanations,
    })
}
