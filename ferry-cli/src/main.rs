mod tui;
mod ui;

use std::fs::{self, File};
use std::io::{self, Write, stdout};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::bail};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ferry_core::config::{DEFAULT_CHUNK_SIZE, TIMES_CACHE_CHUNK, TIMES_CACHE_SIZE, TIMES_MIN_DISTANCE};
use ferry_core::{
    Counter, CopyEngine, FerryError, GnuplotPlotter, KeySource, Keyboard, NoKeys, SampleConfig,
    ScanConfig, Scanner, SizeTree, TransferConfig, TreeReader, Warning, format_count, format_size,
    parse_kmg, size_percentage,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use tui::{Mode, ScanStatus, ScanSummary, TerminalReporter};

/// Minimum time between two scan status lines
const STATUS_INTERVAL: Duration = Duration::from_millis(100);

/// FERRY - Resumable directory copy with live nested progress and ETA
#[derive(Parser, Debug)]
#[command(name = "ferry")]
#[command(about = "Copy or read directory trees with live nested progress and ETA")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Bytes read and written per chunk (K/M/G suffixes allowed)
    #[arg(long, global = true, env = "FERRY_CHUNK_SIZE", value_parser = parse_chunk_size,
          default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Time samples kept per progress level
    #[arg(long, global = true, env = "FERRY_TIMES_CACHE_SIZE", default_value_t = TIMES_CACHE_SIZE)]
    times_cache_size: usize,

    /// Samples dropped when a level's cache overflows
    #[arg(long, global = true, env = "FERRY_TIMES_CACHE_CHUNK", default_value_t = TIMES_CACHE_CHUNK)]
    times_cache_chunk: usize,

    /// Minimum seconds between two time samples
    #[arg(long, global = true, env = "FERRY_TIMES_MIN_DISTANCE", default_value_t = TIMES_MIN_DISTANCE)]
    times_min_distance: f64,

    /// Write logs to this file (filter from FERRY_LOG, default "info")
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copy SOURCE... into DEST, skipping files a previous run finished
    Cp {
        /// Follow symbolic links
        #[arg(short, long)]
        follow_symlinks: bool,

        /// Sources followed by the destination directory
        #[arg(required = true, num_args = 2.., value_name = "SOURCE... DEST")]
        paths: Vec<PathBuf>,
    },

    /// Read every file below PATH... without writing anything
    Read {
        /// Follow symbolic links
        #[arg(short, long)]
        follow_symlinks: bool,

        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Measure PATH... and print the totals
    Scan {
        /// Follow symbolic links
        #[arg(short, long)]
        follow_symlinks: bool,

        /// Print every entry as `files bytes path`
        #[arg(long)]
        tree: bool,

        /// Leave out entries already present below this directory
        #[arg(long)]
        destination: Option<PathBuf>,

        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

impl Args {
    fn transfer_config(&self, follow_symlinks: bool) -> Result<TransferConfig> {
        if self.times_cache_size < 3 {
            bail!("--times-cache-size must be at least 3");
        }
        if self.times_min_distance.is_nan() || self.times_min_distance < 0.0 {
            bail!("--times-min-distance must not be negative");
        }
        Ok(TransferConfig {
            chunk_size: self.chunk_size,
            follow_symlinks,
            samples: SampleConfig {
                cache_size: self.times_cache_size,
                cache_chunk: self.times_cache_chunk,
                min_distance: self.times_min_distance,
            },
            ..TransferConfig::default()
        })
    }
}

fn parse_chunk_size(text: &str) -> std::result::Result<usize, String> {
    let size = parse_kmg(text)?;
    if size == 0 {
        return Err("chunk size must be positive".to_string());
    }
    usize::try_from(size).map_err(|_| format!("chunk size too large: {text}"))
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    match &args.command {
        Command::Cp {
            follow_symlinks,
            paths,
        } => {
            let Some((destination, sources)) = paths.split_last() else {
                bail!("missing destination");
            };
            let config = args.transfer_config(*follow_symlinks)?;
            run_copy(sources, destination, config)
        }
        Command::Read {
            follow_symlinks,
            paths,
        } => {
            let config = args.transfer_config(*follow_symlinks)?;
            run_read(paths, config)
        }
        Command::Scan {
            follow_symlinks,
            tree,
            destination,
            paths,
        } => run_scan(paths, *follow_symlinks, destination.as_deref(), *tree),
    }
}

/// Route `tracing` output to `path`; the terminal belongs to the live display
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_env("FERRY_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn check_sources(paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        if fs::symlink_metadata(path).is_err() {
            return Err(FerryError::SourceMissing(path.clone()).into());
        }
    }
    Ok(())
}

/// Scan with a live status line; returns the tree and what it left out
fn scan_with_status(
    paths: &[PathBuf],
    follow_symlinks: bool,
    destination: Option<&Path>,
) -> Result<(SizeTree, ScanSummary)> {
    check_sources(paths)?;

    let scanner = Scanner::new(ScanConfig {
        follow_symlinks,
        destination: destination.map(Path::to_path_buf),
    });
    let mut status = ScanStatus::new(stdout(), STATUS_INTERVAL);
    let tree = scanner.scan_with(paths, |message| {
        if let Err(e) = status.observe(message) {
            debug!(error = %e, "scan: status line failed");
        }
    });
    let summary = status.into_summary();
    info!(
        files = tree.counter.files,
        bytes = tree.counter.bytes,
        errors = summary.errors,
        "scan: finished"
    );
    Ok((tree, summary))
}

/// Run `transfer` on the alternate screen, then restore the terminal
fn with_terminal<T>(
    mode: Mode,
    transfer: impl FnOnce(Box<dyn KeySource>, &mut TerminalReporter, &mut GnuplotPlotter) -> T,
) -> Result<T> {
    let keys: Box<dyn KeySource> = match Keyboard::open_tty() {
        Ok(keyboard) => Box::new(keyboard),
        Err(e) => {
            debug!(error = %e, "no terminal for keys, running unattended");
            Box::new(NoKeys)
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut reporter = TerminalReporter::new(terminal, mode);
    let mut plotter = GnuplotPlotter::new();
    let result = transfer(keys, &mut reporter, &mut plotter);

    // Restore terminal
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;

    Ok(result)
}

fn run_copy(sources: &[PathBuf], destination: &Path, config: TransferConfig) -> Result<()> {
    if destination.exists() && !destination.is_dir() {
        return Err(FerryError::DestinationNotDirectory(destination.to_path_buf()).into());
    }

    let (tree, summary) = scan_with_status(sources, config.follow_symlinks, Some(destination))?;
    let engine = CopyEngine::new(destination, config);
    let mode = Mode::Copy {
        destination: destination.to_path_buf(),
    };
    let report = with_terminal(mode, |keys, reporter, plotter| {
        engine.run(&tree, keys, reporter, plotter)
    })??;

    print_scan_summary(&summary)?;
    print_counter("copied", report.copied);
    print_counter("skipped", report.skipped);
    print_counter("total", report.total());
    if report.interrupted {
        println!(
            "interrupted at {:.1}% of {}",
            size_percentage(report.total().bytes, tree.counter.bytes),
            format_size(tree.counter.bytes)
        );
    }
    print_warnings(&report.warnings);
    Ok(())
}

fn run_read(paths: &[PathBuf], config: TransferConfig) -> Result<()> {
    let (tree, summary) = scan_with_status(paths, config.follow_symlinks, None)?;
    let reader = TreeReader::new(config);
    let report = with_terminal(Mode::Read, |keys, reporter, plotter| {
        reader.run(&tree, keys, reporter, plotter)
    })??;

    print_scan_summary(&summary)?;
    print_counter("read", report.read);
    if report.interrupted {
        println!(
            "interrupted at {:.1}% of {}",
            size_percentage(report.read.bytes, tree.counter.bytes),
            format_size(tree.counter.bytes)
        );
    }
    print_warnings(&report.warnings);
    Ok(())
}

fn run_scan(
    paths: &[PathBuf],
    follow_symlinks: bool,
    destination: Option<&Path>,
    dump: bool,
) -> Result<()> {
    let (tree, summary) = scan_with_status(paths, follow_symlinks, destination)?;
    write_scan(&mut stdout().lock(), &tree, &summary, dump)?;
    Ok(())
}

/// Optional listing, then what the scan left out, then the total
fn write_scan<W: Write>(
    out: &mut W,
    tree: &SizeTree,
    summary: &ScanSummary,
    dump: bool,
) -> io::Result<()> {
    if dump {
        writeln!(out, "{tree}")?;
    }
    write_scan_summary(out, summary)?;
    writeln!(out, "{}", counter_line("total", tree.counter))
}

fn write_scan_summary<W: Write>(out: &mut W, summary: &ScanSummary) -> io::Result<()> {
    for path in &summary.skipped {
        writeln!(out, "skipped existing: {}", path.display())?;
    }
    if summary.errors > 0 {
        writeln!(out, "unreadable: {} entries left out", format_count(summary.errors))?;
    }
    Ok(())
}

fn print_scan_summary(summary: &ScanSummary) -> io::Result<()> {
    write_scan_summary(&mut stdout().lock(), summary)
}

fn counter_line(label: &str, counter: Counter) -> String {
    format!(
        "{label:<8} {:>10} files  {:>10}",
        format_count(counter.files),
        format_size(counter.bytes)
    )
}

fn print_counter(label: &str, counter: Counter) {
    println!("{}", counter_line(label, counter));
}

fn print_warnings(warnings: &[Warning]) {
    if warnings.is_empty() {
        return;
    }
    eprintln!("{} warning(s):", warnings.len());
    for warning in warnings {
        eprintln!("  {warning}");
    }
}
