//! lectio - verse selection and readings calendar tools

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use lectio::dom::parse_html_bytes;
use lectio::export::{Clipboard, ClipboardError, Step};
use lectio::readings::{self, ReadingStore, SiteDir};
use lectio::{Error, ExportConfig, ExportOrder, MarkupConventions, ReadingSession, VerseId};

#[derive(Parser)]
#[command(name = "lectio")]
#[command(version, about = "Verse selection and readings calendar tools", long_about = None)]
#[command(after_help = "EXAMPLES:
    lectio verses reading.html                  List verses with their clean text
    lectio copy reading.html v43003016 v43003017  Format a selection for the clipboard
    lectio search --site _site \"john 3\"          Find readings by passage")]
struct Cli {
    /// Log progress to stderr (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the content markup with verse wrappers applied
    Annotate {
        /// Reading fragment or page (HTML)
        input: PathBuf,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the verses of a reading
    Verses {
        input: PathBuf,
        /// Print JSON instead of one line per verse
        #[arg(long)]
        json: bool,
    },
    /// Format selected verses the way the copy button does
    Copy {
        input: PathBuf,
        /// Canonical verse ids, e.g. v43003016
        #[arg(required = true)]
        verses: Vec<VerseId>,
        /// Put the reference before the text
        #[arg(long)]
        reference_first: bool,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the whole passage as shareable text
    Share {
        input: PathBuf,
        /// Passage name appended as attribution
        #[arg(long)]
        passage: String,
    },
    /// List footnotes and cross-references as JSON
    Notes { input: PathBuf },
    /// Show the reading of one day from a built site
    Day {
        #[arg(long)]
        site: PathBuf,
        /// ISO date, e.g. 2025-03-05
        date: String,
    },
    /// Search readings by passage across years
    Search {
        #[arg(long)]
        site: PathBuf,
        #[arg(long, default_value_t = 2020)]
        from: i32,
        #[arg(long, default_value_t = 2030)]
        to: i32,
        query: String,
    },
    /// List the collections that have readings in a year
    Collections {
        #[arg(long)]
        site: PathBuf,
        year: i32,
    },
}

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: u8) {
    // Only fails if a logger is already installed.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    });
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> lectio::Result<ExitCode> {
    match command {
        Command::Annotate { input, output } => {
            let session = open_session(&input, ExportConfig::default())?;
            emit(output.as_deref(), &session.annotated_html())?;
        }
        Command::Verses { input, json } => {
            let session = open_session(&input, ExportConfig::default())?;
            if json {
                let units: Vec<_> = session
                    .index()
                    .iter()
                    .map(|u| {
                        serde_json::json!({
                            "id": u.id,
                            "book": u.book,
                            "chapter": u.chapter,
                            "verse": u.verse,
                            "text": session.verse_text(&u.id),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&units)?);
            } else {
                for unit in session.index() {
                    let text = session.verse_text(&unit.id).unwrap_or_default();
                    println!("{}\t{} {}:{}\t{text}", unit.id, unit.book, unit.chapter, unit.verse);
                }
            }
        }
        Command::Copy {
            input,
            verses,
            reference_first,
            output,
        } => {
            let order = if reference_first {
                ExportOrder::ReferenceFirst
            } else {
                ExportOrder::TextFirst
            };
            let mut session = open_session(&input, ExportConfig::new().with_order(order))?;
            for id in verses {
                if !session.index().contains(&id) {
                    log::warn!("{id} is not on this page");
                }
                session.toggle(id);
            }
            return Ok(copy(&mut session, output));
        }
        Command::Share { input, passage } => {
            let session = open_session(&input, ExportConfig::default())?;
            println!("{}", session.passage_text(&passage));
        }
        Command::Notes { input } => {
            let session = open_session(&input, ExportConfig::default())?;
            let notes = serde_json::json!({
                "footnotes": session.footnotes(),
                "crossrefs": session.crossrefs(),
            });
            println!("{}", serde_json::to_string_pretty(&notes)?);
        }
        Command::Day { site, date } => {
            let date = readings::parse_date(&date)?;
            let site = SiteDir::new(site);
            let fragment = site.fragment(date)?;
            let mut store = ReadingStore::new(site);
            let Some(reading) = store.reading_on(date) else {
                return Err(Error::MissingContent(format!("no reading scheduled for {date}")));
            };

            println!("{}: {}", reading.date, reading.passage);
            if let Some(theme) = &reading.theme {
                println!("Theme: {theme}");
            }
            if let Some(collection) = &reading.collection {
                println!("Collection: {collection}");
            }
            let (prev, next) = readings::neighbors(date);
            if let Some(prev) = prev {
                println!("Previous: {prev}");
            }
            if let Some(next) = next {
                println!("Next: {next}");
            }
            match fragment {
                Some(html) => {
                    let session = ReadingSession::from_html(&html);
                    println!("Verses: {}", session.index().len());
                }
                None => log::warn!("no rendered fragment for {date}"),
            }
        }
        Command::Search {
            site,
            from,
            to,
            query,
        } => {
            let mut store = ReadingStore::new(SiteDir::new(site));
            store.fetch_years(from..=to);
            let results = store.search(&query);
            if results.is_empty() {
                println!("No readings found for \"{}\"", query.trim());
            }
            for reading in results {
                println!("{}\t{}", reading.date, reading.passage);
            }
        }
        Command::Collections { site, year } => {
            let mut store = ReadingStore::new(SiteDir::new(site));
            // A collection may start in the previous year or end in the next.
            store.fetch_years(year - 1..=year + 1);
            for summary in store.collections_for_year(year) {
                println!(
                    "{}\t{}\t{} readings",
                    summary.collection.name,
                    summary.date_range(),
                    summary.readings.len()
                );
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn open_session(path: &Path, config: ExportConfig) -> lectio::Result<ReadingSession> {
    let bytes = fs::read(path)?;
    let session = ReadingSession::from_dom(parse_html_bytes(&bytes), MarkupConventions::default(), config);
    log::debug!("{}: {} verses", path.display(), session.index().len());
    Ok(session)
}

fn emit(output: Option<&Path>, text: &str) -> lectio::Result<()> {
    match output {
        Some(path) => fs::write(path, text)?,
        None => println!("{text}"),
    }
    Ok(())
}

/// Writes exported text to a file.
struct FileClipboard(PathBuf);

impl Clipboard for FileClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        fs::write(&self.0, text).map_err(|e| ClipboardError(format!("{}: {e}", self.0.display())))
    }
}

/// Writes exported text to stdout.
struct StdoutClipboard;

impl Clipboard for StdoutClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        println!("{text}");
        Ok(())
    }
}

fn copy(session: &mut ReadingSession, output: Option<PathBuf>) -> ExitCode {
    let step = match output {
        Some(path) => session.copy_selection(&mut FileClipboard(path), &mut StdoutClipboard),
        None => session.copy_selection(&mut StdoutClipboard, &mut StdoutClipboard),
    };
    match step {
        Some(Step::Confirm { notice, .. }) => {
            eprintln!("{notice}");
            ExitCode::SUCCESS
        }
        Some(Step::Failed { notice }) => {
            eprintln!("error: {notice}");
            ExitCode::FAILURE
        }
        _ => {
            eprintln!("error: no verses selected");
            ExitCode::FAILURE
        }
    }
}
