use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use epistolary::io::write_raw_mentions_csv;
use epistolary::{
    execute_metadata, execute_stage0, execute_stage1, execute_stage2, execute_stage3,
    find_orphans, parse_letters_file, read_letter_dir, read_mention_file, read_text_lossy,
    renumber, renumber_letter_dir, write_letters_file, AnthropicClient, AnthropicConfig,
    AnthropicExtractor, CorpusProfile, Letter, MetadataExtractor, RenderTargets, Segmenter,
    Stage1Config, Stage3Config, TableNormalizer,
};

#[derive(Parser)]
#[command(name = "epistolary")]
#[command(author, version, about = "Letter segmentation and entity-table repair for transcribed correspondence", long_about = None)]
struct Cli {
    /// Corpus profile (TOML) overriding the built-in word lists and patterns
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a transcript into numbered letters
    Split {
        /// Transcript text file
        #[arg(short, long)]
        input: PathBuf,

        /// Combined output file of `Letter N` records
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for one file per letter
        #[arg(long)]
        letter_dir: Option<PathBuf>,

        /// File name prefix for per-letter files
        #[arg(long, default_value = "BFPerry")]
        prefix: String,

        /// Also write per-letter metadata CSV
        #[arg(long)]
        metadata: Option<PathBuf>,
    },

    /// Renumber letters 1..N in a combined file or a per-letter directory
    Renumber {
        /// Combined letters file or per-letter directory
        path: PathBuf,

        /// File name prefix for per-letter files
        #[arg(long, default_value = "BFPerry")]
        prefix: String,
    },

    /// Extract person and place mentions from letters with the Anthropic API
    Extract {
        /// Combined letters file or per-letter directory
        #[arg(short, long)]
        input: PathBuf,

        /// Raw mention table to write
        #[arg(short, long)]
        output: PathBuf,

        /// File name prefix for per-letter files
        #[arg(long, default_value = "BFPerry")]
        prefix: String,

        /// Extra attempts per letter after a failed call
        #[arg(long, default_value = "2")]
        max_retries: u32,
    },

    /// Repair a raw mention table into a clean one
    Normalize {
        /// Raw mention table (CSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Clean mention table to write
        #[arg(short, long)]
        output: PathBuf,

        /// Manual-review report of rows that could not be fully repaired
        #[arg(long)]
        warnings: Option<PathBuf>,

        /// Letters (combined file or directory) to check letter numbers against
        #[arg(long)]
        letters: Option<PathBuf>,

        /// File name prefix for per-letter files
        #[arg(long, default_value = "BFPerry")]
        prefix: String,
    },

    /// Extract dates, senders and recipients from letters
    Metadata {
        /// Combined letters file or per-letter directory
        #[arg(short, long)]
        input: PathBuf,

        /// Metadata CSV to write
        #[arg(short, long)]
        output: PathBuf,

        /// File name prefix for per-letter files
        #[arg(long, default_value = "BFPerry")]
        prefix: String,
    },

    /// Analyze a transcript without writing anything
    Analyze {
        /// Transcript text file
        #[arg(short, long)]
        input: PathBuf,

        /// Raw mention table to dry-run through normalization
        #[arg(long)]
        mentions: Option<PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let profile =
        CorpusProfile::load(cli.profile.as_deref()).context("Failed to load corpus profile")?;
    if let Some(path) = &cli.profile {
        info!("Using corpus profile {:?}", path);
    }

    match cli.command {
        Commands::Split {
            input,
            output,
            letter_dir,
            prefix,
            metadata,
        } => split_transcript(&profile, input, output, letter_dir, prefix, metadata),
        Commands::Renumber { path, prefix } => renumber_letters(&path, &prefix),
        Commands::Extract {
            input,
            output,
            prefix,
            max_retries,
        } => extract_mentions(&input, &output, &prefix, max_retries).await,
        Commands::Normalize {
            input,
            output,
            warnings,
            letters,
            prefix,
        } => normalize_table(&profile, &input, output, warnings, letters.as_deref(), &prefix),
        Commands::Metadata {
            input,
            output,
            prefix,
        } => extract_metadata(&profile, &input, output, &prefix),
        Commands::Analyze {
            input,
            mentions,
            json,
        } => analyze_transcript(&profile, &input, mentions.as_deref(), json),
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

/// Read letters from a per-letter directory or a combined file
fn load_letters(path: &Path, prefix: &str) -> Result<Vec<Letter>> {
    if path.is_dir() {
        let letters = read_letter_dir(path, prefix)?;
        Ok(letters.into_iter().map(|(_, letter)| letter).collect())
    } else {
        let text = read_text_lossy(path)?;
        Ok(parse_letters_file(&text))
    }
}

fn split_transcript(
    profile: &CorpusProfile,
    input: PathBuf,
    output: Option<PathBuf>,
    letter_dir: Option<PathBuf>,
    prefix: String,
    metadata_path: Option<PathBuf>,
) -> Result<()> {
    if output.is_none() && letter_dir.is_none() {
        anyhow::bail!("Nothing to write: pass --output and/or --letter-dir");
    }

    info!("Loading transcript from {:?}", input);
    let text = read_text_lossy(&input)?;

    let segmenter = Segmenter::new(&profile.segmenter)?;
    let stage0 = execute_stage0(&segmenter, &text);

    let metadata = match &metadata_path {
        Some(_) => {
            let extractor = MetadataExtractor::new(&profile.metadata)?;
            execute_metadata(&stage0.letters, &extractor, &prefix)
        }
        None => Vec::new(),
    };

    let targets = RenderTargets {
        combined: output,
        letter_dir,
        metadata: metadata_path,
        ..Default::default()
    };
    let config = Stage3Config {
        file_prefix: prefix,
        ..Default::default()
    };
    let result = execute_stage3(&stage0.letters, None, &metadata, &targets, &config)?;

    info!(
        "Done: {} letters written ({} per-letter files)",
        stage0.letters.len(),
        result.letter_paths.len()
    );
    Ok(())
}

fn renumber_letters(path: &Path, prefix: &str) -> Result<()> {
    if path.is_dir() {
        renumber_letter_dir(path, prefix)?;
        return Ok(());
    }

    let text = read_text_lossy(path)?;
    let letters = renumber(parse_letters_file(&text));
    write_letters_file(path, &letters)?;
    info!("Renumbered {} letters in {:?}", letters.len(), path);
    Ok(())
}

async fn extract_mentions(input: &Path, output: &Path, prefix: &str, max_retries: u32) -> Result<()> {
    let letters = load_letters(input, prefix)?;
    info!("Loaded {} letters from {:?}", letters.len(), input);

    let config = AnthropicConfig::from_env()?;
    info!("Using model {}", config.model);
    let extractor = AnthropicExtractor::new(AnthropicClient::new(config));

    let stage1_config = Stage1Config {
        max_retries,
        ..Default::default()
    };
    let result = execute_stage1(&extractor, &letters, &stage1_config).await;

    write_raw_mentions_csv(output, &result.rows)?;
    info!("Wrote {} raw rows to {:?}", result.rows.len(), output);

    if !result.failures.is_empty() {
        warn!("Extraction failed for letters {:?}", result.failures);
    }
    Ok(())
}

fn normalize_table(
    profile: &CorpusProfile,
    input: &Path,
    output: PathBuf,
    warnings: Option<PathBuf>,
    letters: Option<&Path>,
    prefix: &str,
) -> Result<()> {
    info!("Loading mention table from {:?}", input);
    let rows = read_mention_file(input)?;

    let normalizer = TableNormalizer::new(&profile.normalizer);
    let mut stage2 = execute_stage2(&rows, &normalizer);

    if let Some(letters_path) = letters {
        let known: BTreeSet<u32> = load_letters(letters_path, prefix)?
            .iter()
            .map(|l| l.number)
            .collect();
        let orphans = find_orphans(&stage2.rows, &known);
        if !orphans.is_empty() {
            warn!("{} rows refer to letters not in {:?}", orphans.len(), letters_path);
        }
        stage2.warnings.extend(orphans);
    }

    let report = &stage2.report;
    info!(
        "Read {} rows: {} carried forward, {} retyped, {} duplicates, {} junk",
        report.rows_read,
        report.carried_forward,
        report.retyped_as_location,
        report.duplicates_removed,
        report.junk_removed
    );

    let warnings = warnings.or_else(|| {
        (!stage2.warnings.is_empty()).then(|| output.with_extension("warnings.csv"))
    });
    let targets = RenderTargets {
        mentions: Some(output),
        warnings,
        ..Default::default()
    };
    let result = execute_stage3(&[], Some(&stage2), &[], &targets, &Stage3Config::default())?;

    if let Some(path) = result.warnings_path {
        info!("{} rows need manual review, see {:?}", stage2.warnings.len(), path);
    }
    Ok(())
}

fn extract_metadata(profile: &CorpusProfile, input: &Path, output: PathBuf, prefix: &str) -> Result<()> {
    let letters = load_letters(input, prefix)?;
    let extractor = MetadataExtractor::new(&profile.metadata)?;
    let metadata = execute_metadata(&letters, &extractor, prefix);

    let targets = RenderTargets {
        metadata: Some(output),
        ..Default::default()
    };
    execute_stage3(&[], None, &metadata, &targets, &Stage3Config::default())?;
    Ok(())
}

fn analyze_transcript(
    profile: &CorpusProfile,
    input: &Path,
    mentions: Option<&Path>,
    json: bool,
) -> Result<()> {
    let text = read_text_lossy(input)?;
    let segmenter = Segmenter::new(&profile.segmenter)?;
    let stage0 = execute_stage0(&segmenter, &text);

    let table = match mentions {
        Some(path) => {
            let rows = read_mention_file(path)?;
            Some(execute_stage2(&rows, &TableNormalizer::new(&profile.normalizer)))
        }
        None => None,
    };

    if json {
        let letters: Vec<_> = stage0
            .letters
            .iter()
            .map(|l| {
                serde_json::json!({
                    "number": l.number,
                    "first_line": l.first_line,
                    "line_count": l.line_count,
                    "opening": l.content_lines().next().unwrap_or(""),
                })
            })
            .collect();
        let summary = serde_json::json!({
            "letters": letters,
            "sign_offs": stage0.end_markers,
            "date_headings": stage0.start_markers,
            "mentions": table.as_ref().map(|t| serde_json::json!({
                "rows_read": t.report.rows_read,
                "rows_clean": t.rows.len(),
                "rows_split": t.report.rows_split,
                "carried_forward": t.report.carried_forward,
                "retyped_as_location": t.report.retyped_as_location,
                "type_inferred": t.report.type_inferred,
                "duplicates_removed": t.report.duplicates_removed,
                "junk_removed": t.report.junk_removed,
                "warnings": t.warnings.len(),
            })),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("\n=== Transcript Analysis ===\n");
    println!("Lines: {}", text.lines().count());
    println!("Sign-off lines: {}", stage0.end_markers);
    println!("Date headings: {}", stage0.start_markers);
    println!("Letters: {}", stage0.letters.len());

    println!("\nLetters:");
    for letter in &stage0.letters {
        println!(
            "  Letter {:>4}: lines {:>6}-{:<6} {}",
            letter.number,
            letter.first_line + 1,
            letter.first_line + letter.line_count,
            letter.content_lines().next().unwrap_or("")
        );
    }

    if let Some(table) = table {
        let report = &table.report;
        println!("\n=== Mention Table ===\n");
        println!("Rows read: {}", report.rows_read);
        println!("Rows split from multi-line names: {}", report.rows_split);
        println!("Letter numbers carried forward: {}", report.carried_forward);
        println!("Retyped as LOCATION: {}", report.retyped_as_location);
        println!("Type defaulted to PERSON: {}", report.type_inferred);
        println!("Duplicates removed: {}", report.duplicates_removed);
        println!("Junk removed: {}", report.junk_removed);
        println!("Clean rows: {}", table.rows.len());
        println!("Needs review: {}", table.warnings.len());
        for warning in &table.warnings {
            println!("  {}", warning);
        }
    }

    Ok(())
}
