//! invoicepdf
//!
//! Converts every `{invoice_nr}-{date}.xlsx` in a directory into a PDF
//! invoice. Settings come from an optional TOML file; command-line flags
//! override it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use invoicepdf_core::{InvoiceRenderer, RenderConfig};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "invoicepdf")]
#[command(version, about = "Batch-convert spreadsheet invoices into PDF documents")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory containing the .xlsx invoices
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory receiving the generated PDFs
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Logo image placed next to the company name
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Company name printed at the bottom of each invoice
    #[arg(long)]
    company: Option<String>,

    /// Column shown in the first table column
    #[arg(long)]
    product_id: Option<String>,

    /// Column shown in the second table column
    #[arg(long)]
    product_name: Option<String>,

    /// Column shown in the third table column
    #[arg(long)]
    amount_purchased: Option<String>,

    /// Column shown in the fourth table column
    #[arg(long)]
    price_per_unit: Option<String>,

    /// Column shown in the fifth table column
    #[arg(long)]
    total_price: Option<String>,

    /// Worksheet holding the line items
    #[arg(long)]
    sheet: Option<String>,

    /// Column summed into the totals row
    #[arg(long)]
    sum_column: Option<String>,

    /// Stop at the first invoice that fails
    #[arg(long)]
    fail_fast: bool,

    /// Print the batch report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Merge the config file (if any) with command-line overrides
    fn resolve(&self) -> Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => RenderConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => RenderConfig::new(
                self.input.clone().context("--input is required without --config")?,
                self.output.clone().context("--output is required without --config")?,
                self.logo.clone().context("--logo is required without --config")?,
                self.company.clone().context("--company is required without --config")?,
            ),
        };

        override_with(&mut config.input_dir, &self.input);
        override_with(&mut config.output_dir, &self.output);
        override_with(&mut config.logo, &self.logo);
        override_with(&mut config.company_name, &self.company);
        override_with(&mut config.columns.identifier, &self.product_id);
        override_with(&mut config.columns.description, &self.product_name);
        override_with(&mut config.columns.quantity, &self.amount_purchased);
        override_with(&mut config.columns.unit_price, &self.price_per_unit);
        override_with(&mut config.columns.total, &self.total_price);
        override_with(&mut config.sheet, &self.sheet);
        override_with(&mut config.sum_column, &self.sum_column);
        config.fail_fast |= self.fail_fast;

        Ok(config)
    }
}

fn override_with<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    // stdout carries the report, logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = args.resolve()?;
    info!(
        "Converting {} -> {}",
        config.input_dir.display(),
        config.output_dir.display()
    );

    let report = InvoiceRenderer::new(config)
        .run()
        .context("invoice batch aborted")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serializing report")?
        );
    } else {
        println!("{}", report.summary());
        for failure in &report.failures {
            println!("  {}: {}", failure.path.display(), failure.error);
        }
    }

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
