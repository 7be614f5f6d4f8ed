//! Invoice renderer CLI.
//!
//! Examples:
//!   invoice render order.json -o invoice.pdf --date 2023-09-28
//!   invoice render - --http < order.json > response.http
//!   invoice totals order.json

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use invoice_core::calculator::{order_total, RenderedRow};
use invoice_core::render::write_http_error;
use invoice_core::{InvoiceRequest, LogoSource, Renderer, RendererConfig};
use log::{error, info};

#[derive(Parser)]
#[command(name = "invoice", version, about = "Render invoice PDFs from JSON orders")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a JSON invoice request to PDF.
    Render(RenderArgs),
    /// Print rows and the order total as JSON without rendering.
    Totals {
        /// JSON request file, or `-` for stdin.
        input: PathBuf,
    },
}

#[derive(Args)]
struct RenderArgs {
    /// JSON request file, or `-` for stdin.
    input: PathBuf,

    /// Output file. Defaults to the configured filename.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Logo image (PNG or JPEG). Overrides INVOICE_LOGO_PATH.
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Invoice date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Write a complete HTTP response (headers, then body) to stdout.
    #[arg(long)]
    http: bool,

    /// Leave page content uncompressed.
    #[arg(long)]
    no_compress: bool,

    /// Print the response headers after writing the file.
    #[arg(long)]
    print_headers: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Render(args) => render(args),
        Command::Totals { input } => totals(&input),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf).context("reading request from stdin")?;
        Ok(buf)
    } else {
        fs::read(path).with_context(|| format!("reading request {}", path.display()))
    }
}

fn render(args: RenderArgs) -> Result<()> {
    let mut config = RendererConfig::from_env()?;
    if let Some(logo) = args.logo {
        config.logo = LogoSource::Path(logo);
    }
    if args.no_compress {
        config.compress = false;
    }
    let renderer = Renderer::new(config)?;

    let payload = read_input(&args.input)?;
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());

    if args.http {
        let stdout = io::stdout().lock();
        return match renderer.render_json(&payload, date) {
            Ok(invoice) => invoice.write_http(stdout).context("writing response"),
            Err(err) => {
                error!("render failed: {}", err);
                write_http_error(&err, stdout).context("writing error response")?;
                Err(err.into())
            }
        };
    }

    let invoice = renderer.render_json(&payload, date)?;
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(&renderer.config().filename));
    fs::write(&output, &invoice.body)
        .with_context(|| format!("writing {}", output.display()))?;
    info!("wrote {} ({} bytes)", output.display(), invoice.body.len());
    if args.print_headers {
        for (name, value) in invoice.headers.pairs() {
            println!("{}: {}", name, value);
        }
    }
    println!("{} total {}", output.display(), invoice.totals.display());
    Ok(())
}

fn totals(input: &Path) -> Result<()> {
    let request = InvoiceRequest::from_json(&read_input(input)?)?;
    let rows: Vec<RenderedRow> = request.items.iter().map(RenderedRow::from_item).collect();
    let totals = order_total(&request.items);
    let summary = serde_json::json!({
        "rows": rows,
        "total": totals.formatted(),
        "minorUnits": totals.minor_units(),
    });
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &summary)?;
    writeln!(stdout)?;
    Ok(())
}
