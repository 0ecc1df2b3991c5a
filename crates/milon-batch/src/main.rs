use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use milon_batch::process_pairs;
use milon_core::normalize::strip_nikud;
use milon_core::Dictionary;
use milon_lookup::{LookupError, SenseLookup};
use milon_parser::{parse_lexical_index, parse_xref_index, XrefIndex};
use milon_vectors::{FileVectors, OllamaVectors, SenseVectors};

#[derive(Parser)]
#[command(
    name = "milon-batch",
    about = "Resolve Hebrew dictionary senses against English glosses, one pair or a CSV batch"
)]
struct Cli {
    /// Primary lexicon XML document
    #[arg(long, default_value = "LexicalIndex.xml")]
    lexicon: PathBuf,
    /// Secondary lexicon XML with gender-bearing pos annotations
    #[arg(long)]
    xref_index: Option<PathBuf>,
    /// Language section to index
    #[arg(long, default_value = "heb")]
    lang: String,

    // ── Vector backend ─────────────────────────────────────────────
    /// Path to a JSON sense-vectors file
    #[arg(long)]
    vectors: Option<PathBuf>,
    /// Use Ollama embeddings at this base URL instead of a vectors file
    #[arg(long)]
    ollama_url: Option<String>,
    /// Ollama embedding model name
    #[arg(long, default_value = "nomic-embed-text")]
    ollama_model: String,

    // ── Batch mode ─────────────────────────────────────────────────
    /// CSV input of (hebrew word, english gloss) pairs
    #[arg(long)]
    input: Option<PathBuf>,
    /// CSV output of resolved (normalized, surface, gloss) rows
    #[arg(long, default_value = "card_output.csv")]
    output: PathBuf,

    // ── Single pair mode ───────────────────────────────────────────
    /// One Hebrew word to resolve (requires --gloss)
    #[arg(long)]
    word: Option<String>,
    /// English gloss paired with --word
    #[arg(long)]
    gloss: Option<String>,

    /// Write the built dictionary as JSON and exit
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let xrefs = match &cli.xref_index {
        Some(path) => {
            let file = File::open(path).expect("Failed to open secondary lexicon file");
            parse_xref_index(BufReader::new(file), &cli.lang)
                .expect("Failed to parse secondary lexicon")
        }
        None => XrefIndex::empty(),
    };
    if !xrefs.is_empty() {
        tracing::info!("secondary index ready: {} entries", xrefs.len());
    }

    let file = File::open(&cli.lexicon).expect("Failed to open lexicon file");
    let (dictionary, report) = parse_lexical_index(BufReader::new(file), &cli.lang, &xrefs)
        .expect("Failed to parse lexicon");
    tracing::info!(
        "dictionary ready: {} entries under {} keys ({} incomplete, {} dropped)",
        dictionary.len(),
        dictionary.distinct_keys(),
        report.incomplete.len(),
        report.dropped_empty_key.len()
    );

    if let Some(path) = &cli.dump {
        let json = serde_json::to_string(&dictionary).expect("Dictionary JSON serialization failed");
        std::fs::write(path, json).expect("Failed to write dictionary dump");
        println!("Dictionary dumped to {:?}", path);
        return;
    }

    match (&cli.ollama_url, &cli.vectors) {
        (Some(url), _) => {
            let backend = OllamaVectors::new(url, &cli.ollama_model);
            backend.check_health().expect("Ollama backend unavailable");
            run(&cli, &dictionary, &backend);
            backend.log_stats();
        }
        (None, Some(path)) => {
            let backend = FileVectors::load(path).expect("Failed to load vectors file");
            run(&cli, &dictionary, &backend);
        }
        (None, None) => {
            eprintln!("No vector backend: pass --vectors or --ollama-url");
            std::process::exit(2);
        }
    }
}

/// Resolve either the single --word/--gloss pair or the whole --input CSV.
fn run(cli: &Cli, dictionary: &Dictionary, backend: &dyn SenseVectors) {
    tracing::info!("vector backend: {} ({} senses)", backend.name(), backend.len());
    let lookup = SenseLookup::new(dictionary, backend);

    // Single pair mode mirrors one batch row on stdout.
    if let (Some(word), Some(gloss)) = (&cli.word, &cli.gloss) {
        let key = strip_nikud(word);
        match lookup.select_best_sense(&key, gloss) {
            Ok(Some(entry)) => println!(
                "{}\t{}\t{}",
                entry.normalized.as_deref().unwrap_or(&key),
                entry.surface.as_deref().unwrap_or(""),
                entry.gloss.as_deref().unwrap_or("")
            ),
            Ok(None) => println!("No sense of '{}' matched '{}'", word, gloss),
            Err(LookupError::UnknownKey(k)) => {
                eprintln!("'{}' is not a known headword", k);
                std::process::exit(1);
            }
        }
        return;
    }

    let input = cli
        .input
        .as_ref()
        .expect("Pass --input for batch mode, or --word with --gloss for a single pair");
    let infile = File::open(input).expect("Failed to open input CSV");
    let outfile = File::create(&cli.output).expect("Failed to create output CSV");
    let summary = process_pairs(BufReader::new(infile), outfile, &lookup)
        .expect("Batch processing failed");

    println!(
        "{} pairs read, {} resolved, written to {:?}",
        summary.pairs_read, summary.pairs_resolved, cli.output
    );
}
