//! xmlsplit CLI - split a single-root XML export into per-record documents

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use xmlsplit::{CountingSink, DirectorySink, Document, ExtractConfig, Extractor, MemoryStats, Sink};

#[derive(Debug, Parser)]
#[command(name = "xmlsplit", version, about)]
struct Cli {
    /// XML document to split
    input: PathBuf,

    /// Directory receiving one file per record plus labels.tsv
    #[arg(short, long, value_name = "DIR", conflicts_with = "dry_run")]
    out: Option<PathBuf>,

    /// Count records without writing anything
    #[arg(long)]
    dry_run: bool,

    /// TOML file with element names and limits
    #[arg(short, long, value_name = "FILE", env = "XMLSPLIT_CONFIG")]
    config: Option<PathBuf>,

    /// Root element name
    #[arg(long, value_name = "NAME")]
    root: Option<String>,

    /// Header element name
    #[arg(long, value_name = "NAME")]
    header: Option<String>,

    /// Record element name
    #[arg(long, value_name = "NAME")]
    record: Option<String>,

    /// Label element name, read from inside each record
    #[arg(long, value_name = "NAME")]
    label: Option<String>,

    /// Upper bound for header plus record bytes
    #[arg(long, value_name = "BYTES")]
    max_buffer: Option<usize>,

    /// Log progress every N records (0 disables)
    #[arg(long, value_name = "N")]
    progress: Option<u64>,

    /// Enable debug output
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report errors
    #[arg(short, long)]
    quiet: bool,

    /// Print heap usage after the run (needs the memory_tracking feature)
    #[arg(long)]
    stats: bool,
}

impl Cli {
    fn extract_config(&self) -> Result<ExtractConfig> {
        let mut config = match &self.config {
            Some(path) => ExtractConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
            None => ExtractConfig::default(),
        };

        let names = &mut config.elements;
        for (flag, slot) in [
            (&self.root, &mut names.root),
            (&self.header, &mut names.header),
            (&self.record, &mut names.record),
            (&self.label, &mut names.label),
        ] {
            if let Some(name) = flag {
                slot.clone_from(name);
            }
        }
        if let Some(bytes) = self.max_buffer {
            config.max_buffer_capacity = bytes;
        }
        if let Some(unit) = self.progress {
            config.progress_unit = unit;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    initialize_logging(&cli)?;

    let config = cli.extract_config()?;
    let document = Document::load(&cli.input, config.max_document_size)?;
    // Peak from here on covers extraction only, not reading the input
    let loaded = MemoryStats::reset_peak();

    if cli.dry_run || cli.out.is_none() {
        let sink = run(config, &document, CountingSink::default())?;
        println!(
            "{} records, {} bytes, largest {} bytes",
            sink.records, sink.bytes, sink.largest
        );
    } else if let Some(dir) = &cli.out {
        let sink = run(config, &document, DirectorySink::new(dir))?;
        println!("wrote records to {}", sink.dir().display());
    }

    if cli.stats {
        print_stats(loaded);
    }
    Ok(())
}

fn run<S: Sink>(config: ExtractConfig, document: &Document, sink: S) -> Result<S> {
    let mut extractor = Extractor::new(config, sink);
    extractor
        .extract_document(document)
        .with_context(|| format!("splitting {}", document.name()))?;
    Ok(extractor.into_sink())
}

fn initialize_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn print_stats(loaded: MemoryStats) {
    if !MemoryStats::ENABLED {
        eprintln!("heap statistics unavailable: rebuild with --features memory_tracking");
        return;
    }
    let stats = MemoryStats::snapshot();
    eprintln!(
        "heap: {} bytes after load (peak {}), {} bytes peak during extraction, {} bytes live",
        loaded.current, loaded.peak, stats.peak, stats.current
    );
}
