use clap::{Parser, Subcommand};
use flatnote::classify::Listing;
use flatnote::config::{self, ArchiveConfig};
use flatnote::page::{Page, PageError};
use flatnote::{archive, output};
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Parser)]
#[command(name = "flatnote")]
#[command(about = "Resolve and inspect pages of a flat-file archive")]
#[command(long_about = "\
Resolve and inspect pages of a flat-file archive

Pages are text, markdown or HTML files. A directory named like a page holds
its children, figures and documents; .meta sidecars hold its metadata.

Archive structure:

  archive/
  ├── config.toml                  # Archive config (optional)
  ├── index.md                     # Root page (address \"\")
  ├── notes.md                     # Page (address \"notes\")
  ├── notes.meta                   # Its metadata: DC.Title, sort, ...
  └── notes/                       # Its paired directory
      ├── field_trip.md            # Child page (address \"notes/field_trip\")
      ├── meta/field_trip.meta     # Sidecar in a meta/ directory
      └── field_trip/
          ├── cliffs.jpg           # Figure, shown with [[cliffs.jpg caption]]
          └── map.pdf              # Document

Page file resolution (first found wins):
  <address>.txt → .md → .mkd → .markdown → .html → .htm → .xhtml
  → the parent directory's index page

Run 'flatnote gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Archive root directory
    #[arg(long, default_value = ".", global = true)]
    docroot: PathBuf,

    /// URL prefix for page links (overrides config.toml)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// URL prefix for figures and documents (overrides config.toml)
    #[arg(long, global = true)]
    static_root: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show a resolved page: title, links, figures, headings, warnings
    Show {
        /// Page address, e.g. notes/field_trip (empty for the root page)
        #[arg(default_value = "")]
        address: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the rendered HTML content of a page
    Content {
        #[arg(default_value = "")]
        address: String,
    },
    /// Classify the entries of a directory under the docroot
    Ls {
        #[arg(default_value = "")]
        dir: String,
    },
    /// Print the metadata record of a page
    Meta {
        #[arg(default_value = "")]
        address: String,
    },
    /// Resolve every page of the archive and report problems
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    if !cli.docroot.is_dir() {
        return Err(not_an_archive(&cli.docroot).into());
    }
    let config = Rc::new(load_effective_config(&cli)?);

    match &cli.command {
        Command::Show { address, json } => {
            let page = open(&cli.docroot, address, &config)?;
            if *json {
                let summary = output::PageSummary::from_page(&page);
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                output::print_page(&page);
            }
        }
        Command::Content { address } => {
            let page = open(&cli.docroot, address, &config)?;
            println!("{}", page.content());
        }
        Command::Ls { dir } => {
            let listing = Listing::read(&cli.docroot.join(dir), config.sort_listings)?;
            output::print_listing(&listing);
        }
        Command::Meta { address } => {
            let page = open(&cli.docroot, address, &config)?;
            match page.metadata() {
                Some(metadata) => {
                    if let Some(metafile) = metadata.metafile() {
                        println!("# {}", metafile.display());
                    }
                    output::print_record(metadata.record());
                }
                None => println!("No page file for '{}'", page.address()),
            }
        }
        Command::Check => {
            println!("==> Checking {}", cli.docroot.display());
            let reports = archive::check(&cli.docroot, Rc::clone(&config))?;
            output::print_check(&reports);
        }
        Command::GenConfig => unreachable!("handled above"),
    }

    Ok(())
}

/// `config.toml` from the docroot with command-line URL prefixes on top.
fn load_effective_config(cli: &Cli) -> Result<ArchiveConfig, config::ConfigError> {
    let mut config = config::load_config(&cli.docroot)?;
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(static_root) = &cli.static_root {
        config.static_root = static_root.clone();
    }
    config.validate()?;
    Ok(config)
}

fn open(docroot: &Path, address: &str, config: &Rc<ArchiveConfig>) -> Result<Page, String> {
    Page::with_config(docroot, address, Rc::clone(config)).map_err(|e| match e {
        PageError::DocrootNotFound(path) => not_an_archive(&path),
        other => other.to_string(),
    })
}

fn not_an_archive(path: &Path) -> String {
    format!(
        "{} is not an archive: no such directory. Pass --docroot to point at one.",
        path.display()
    )
}
