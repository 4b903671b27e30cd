mod logger;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use logger::StderrLogger;
use page_grid::{GridError, GridOptions, GridPipeline, GridReport};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pgrid",
    about = "Merge PDF and slide-deck pages into grid pages",
    version
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Composite pages of the input files into grid pages
    Merge {
        /// Input files (PDF, PPT, PPTX, PPS, PPSX, ODP) - can specify multiple
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Grid rows [default: 2]
        #[arg(long)]
        rows: Option<usize>,

        /// Grid columns [default: 2]
        #[arg(long)]
        cols: Option<usize>,

        /// Output format [default: png]
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Rasterization density for PNG output [default: 72]
        #[arg(long)]
        dpi: Option<f32>,

        /// Path to the LibreOffice binary used for slide decks
        #[arg(long)]
        soffice: Option<PathBuf>,

        /// Directory containing the pdfium shared library
        #[arg(long)]
        pdfium_lib: Option<PathBuf>,

        /// JSON options file; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Show statistics only, don't write output
        #[arg(long)]
        stats_only: bool,
    },

    /// Write the default options as JSON
    InitConfig {
        /// Output JSON file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    /// One PNG image per grid page
    Png,
    /// One PDF with a page per grid, source pages kept as vectors
    Pdf,
}

impl From<FormatArg> for page_grid::OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => Self::Png,
            FormatArg::Pdf => Self::Pdf,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    StderrLogger::new(StderrLogger::level_for(cli.verbose))
        .init()
        .context("Failed to install logger")?;

    match cli.command {
        Commands::Merge {
            input,
            output,
            rows,
            cols,
            format,
            dpi,
            soffice,
            pdfium_lib,
            config,
            stats_only,
        } => {
            let mut options = match &config {
                Some(path) => GridOptions::load(path)
                    .await
                    .with_context(|| format!("Failed to load {}", path.display()))?,
                None => GridOptions::default(),
            };

            // Flags override the config file
            if let Some(rows) = rows {
                options.grid_rows = rows;
            }
            if let Some(cols) = cols {
                options.grid_cols = cols;
            }
            if let Some(format) = format {
                options.output_format = format.into();
            }
            if let Some(dpi) = dpi {
                options.render_dpi = dpi;
            }
            if soffice.is_some() {
                options.soffice_path = soffice;
            }
            if pdfium_lib.is_some() {
                options.pdfium_library_path = pdfium_lib;
            }

            let pipeline = GridPipeline::new(options)?;
            let documents = page_grid::load_sources(&input).await?;

            let result = if stats_only {
                pipeline.statistics(documents).await
            } else {
                pipeline.run(documents).await
            };

            let report = match result {
                Ok(report) => report,
                Err(GridError::EmptyInput { failures }) => {
                    for failure in &failures {
                        eprintln!("  Skipped {}: {}", failure.filename, failure.error);
                    }
                    anyhow::bail!("No pages could be extracted from the input files");
                }
                Err(e) => return Err(e.into()),
            };

            print_report(&report);

            if stats_only {
                return Ok(());
            }

            let written = page_grid::save_outputs(&report.files, &output).await?;
            for path in &written {
                println!("Merged → {}", path.display());
            }
        }

        Commands::InitConfig { output } => {
            GridOptions::default().save(&output).await?;
            println!("Default options → {}", output.display());
        }
    }

    Ok(())
}

fn print_report(report: &GridReport) {
    let stats = &report.statistics;
    println!("Grid Statistics:");
    println!("  Source pages: {}", stats.source_pages);
    println!("  Grid pages: {}", stats.composite_pages);
    println!("  Cells per page: {}", stats.cells_per_page);
    println!("  Blank cells added: {}", stats.filler_pages);

    if !report.failures.is_empty() {
        println!("Skipped files:");
        for failure in &report.failures {
            println!("  {}: {}", failure.filename, failure.error);
        }
    }
}
