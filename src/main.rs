//! cleaner-invoice – preview and export cleaning-service invoices.
//!
//! Usage:
//!   cleaner-invoice preview [--form form.json | --sample NAME] [--set name=value]... [--json]
//!   cleaner-invoice export  [--form form.json | --sample NAME] [--set name=value]... [--out-dir DIR]
//!   cleaner-invoice fields
//!
//! Set `RUST_LOG=debug` to trace recomputation, layout, and pagination.

use std::{fs, path::PathBuf, process};

use clap::{Args, Parser, Subcommand};

use cleaner_invoice::error::{ExportError, Result};
use cleaner_invoice::export::{compute_region, export_pdf_blocking, ExportConfig, ExportedPdf};
use cleaner_invoice::fonts::FontManager;
use cleaner_invoice::form::{InvoiceFormState, FIELD_NAMES};
use cleaner_invoice::layout::BusinessProfile;
use cleaner_invoice::pagination::TrailingPage;
use cleaner_invoice::preview::{Presenter, TextPresenter};
use cleaner_invoice::raster::{LayoutRasterizer, StaticRasterizer};
use cleaner_invoice::samples;
use cleaner_invoice::session::InvoiceSession;

#[derive(Parser, Debug)]
#[command(name = "cleaner-invoice", version, about = "Preview and export cleaning-service invoices")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the invoice as it would appear in the preview
    Preview {
        #[command(flatten)]
        form: FormArgs,

        /// Print the rendered view as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Export the invoice to Invoice_<customer>.pdf
    Export {
        #[command(flatten)]
        form: FormArgs,

        /// Directory the PDF is written into
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Regular TrueType font (default: look up installed fonts)
        #[arg(long)]
        font: Option<PathBuf>,

        /// Bold TrueType font
        #[arg(long)]
        bold_font: Option<PathBuf>,

        /// Use an existing screenshot (PNG/JPEG) of the invoice instead of rasterizing
        #[arg(long)]
        raster: Option<PathBuf>,

        /// Export config JSON
        #[arg(long)]
        config: Option<PathBuf>,

        /// Business profile JSON (name, details, footer)
        #[arg(long)]
        business: Option<PathBuf>,

        /// Add a blank trailing page when the invoice height is an exact page multiple
        #[arg(long)]
        keep_trailing_page: bool,

        /// Also write the computed invoice layout as JSON
        #[arg(long)]
        layout_json: Option<PathBuf>,

        /// Document title in PDF metadata (default: filename stem)
        #[arg(long)]
        title: Option<String>,
    },

    /// List form field names and built-in samples
    Fields,
}

#[derive(Args, Debug)]
struct FormArgs {
    /// Form state JSON file
    #[arg(long)]
    form: Option<PathBuf>,

    /// Start from a built-in sample form
    #[arg(long, conflicts_with = "form")]
    sample: Option<String>,

    /// Field override, applied after the form is loaded (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,
}

impl FormArgs {
    fn load(&self) -> Result<InvoiceFormState> {
        let mut state = match (&self.form, &self.sample) {
            (Some(path), _) => InvoiceFormState::from_json(&fs::read_to_string(path)?)?,
            (None, Some(name)) => samples::by_name(name).ok_or_else(|| {
                ExportError::Config(format!(
                    "unknown sample '{name}' (expected one of: {})",
                    samples::SAMPLE_NAMES.join(", ")
                ))
            })?,
            (None, None) => InvoiceFormState::default(),
        };
        for assignment in &self.set {
            state.apply_assignment(assignment)?;
        }
        Ok(state)
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Preview { form, json } => {
            let session = InvoiceSession::new(form.load()?);
            if json {
                println!("{}", session.view().to_json());
            } else {
                print!("{}", TextPresenter::default().present(session.view()));
            }
            Ok(())
        }
        Command::Export {
            form,
            out_dir,
            font,
            bold_font,
            raster,
            config,
            business,
            keep_trailing_page,
            layout_json,
            title,
        } => {
            let mut config = match config {
                Some(path) => ExportConfig::from_path(&path)?,
                None => ExportConfig::default(),
            };
            if let Some(path) = business {
                config.business = serde_json::from_str::<BusinessProfile>(&fs::read_to_string(&path)?)
                    .map_err(|e| ExportError::Config(format!("{}: {e}", path.display())))?;
            }
            if keep_trailing_page {
                config.trailing_page = TrailingPage::Preserve;
            }
            if title.is_some() {
                config.title = title;
            }

            let mut fonts = if font.is_some() {
                FontManager::new()
            } else {
                FontManager::discover_system_fonts()
            };
            if let Some(path) = font {
                fonts.load_font_file(&path, false)?;
            }
            if let Some(path) = bold_font {
                fonts.load_font_file(&path, true)?;
            }

            let mut session = InvoiceSession::new(form.load()?);

            if let Some(path) = layout_json {
                let region = compute_region(session.view(), &fonts, &config)?;
                fs::write(&path, region.to_json())?;
                eprintln!("Wrote layout '{}'", path.display());
            }

            let exported = match raster {
                Some(path) => {
                    let rasterizer = StaticRasterizer::from_path(&path)?;
                    export_pdf_blocking(&mut session, &fonts, &rasterizer, &config)?
                }
                None => {
                    let rasterizer = LayoutRasterizer::new(&fonts);
                    export_pdf_blocking(&mut session, &fonts, &rasterizer, &config)?
                }
            };
            report(&exported, exported.save_into(&out_dir)?);
            Ok(())
        }
        Command::Fields => {
            println!("Fields:");
            for name in FIELD_NAMES {
                println!("  {name}");
            }
            println!("Samples:");
            for name in samples::SAMPLE_NAMES {
                println!("  {name}");
            }
            Ok(())
        }
    }
}

fn report(exported: &ExportedPdf, path: PathBuf) {
    let pages = exported.page_count();
    eprintln!(
        "Wrote '{}' ({} bytes, {} page{})",
        path.display(),
        exported.bytes.len(),
        pages,
        if pages == 1 { "" } else { "s" }
    );
}
