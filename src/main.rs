use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use docxide_format::{FormattingSettings, assemble_formatting};

/// Roll up the effective formatting of a DOCX file into direct formatting.
#[derive(Debug, Clone, Parser)]
#[command(version)]
struct Args {
    /// Input .docx file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output .docx file (defaults to INPUT with a `.formatted.docx` suffix)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Log every part and style lookup
    #[arg(short, long)]
    verbose: bool,

    /// Keep w:pStyle and w:rStyle references in the resolved properties
    #[arg(long)]
    keep_style_names: bool,

    /// Leave style definitions in word/styles.xml untouched
    #[arg(long)]
    keep_styles: bool,

    /// Do not reorder property children into schema order
    #[arg(long)]
    no_order: bool,

    /// Do not tag runs with their resolved font name
    #[arg(long)]
    no_font_names: bool,

    /// Accept any list numbering format
    #[arg(long)]
    allow_all_numbering_formats: bool,

    /// Accept East Asian and complex script runs
    #[arg(long)]
    allow_all_languages: bool,
}

impl Args {
    fn settings(&self) -> FormattingSettings {
        FormattingSettings {
            remove_style_names: !self.keep_style_names,
            clear_styles: !self.keep_styles,
            order_elements: !self.no_order,
            tag_font_names: !self.no_font_names,
            restrict_numbering_formats: !self.allow_all_numbering_formats,
            restrict_languages: !self.allow_all_languages,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("formatted.docx"));

    match assemble_formatting(&args.input, &output, &args.settings()) {
        Ok(()) => {
            log::info!("Wrote {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
