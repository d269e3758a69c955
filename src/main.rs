use anyhow::{Context, Result};
use clap::Parser;
use clusterhet::cli::{Cli, OutputFormat};
use clusterhet::csv_output::CsvOutput;
use clusterhet::input::{AnalysisInput, Label};
use clusterhet::json_output::JsonReport;
use clusterhet::{presenter, HeterogeneityEngine, ResultTable};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Print the result table in the requested format
fn print_table(table: &ResultTable<Label, Label>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", table.to_report_string()),
        OutputFormat::Json => println!("{}", JsonReport::new(table).to_json()?),
        OutputFormat::Csv => print!("{}", CsvOutput::from_table(table).to_csv()),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = args.analysis_config()?;
    let (clusters, conditions, distances) = AnalysisInput::from_path(&args.input)?.into_parts()?;

    tracing::debug!(
        input = %args.input.display(),
        observations = clusters.len(),
        "Loaded analysis input"
    );

    let table = HeterogeneityEngine::new(config)
        .analyze(&clusters, &conditions, &distances)
        .context("Heterogeneity analysis failed")?;

    print_table(&table, args.format)?;

    if let Some(path) = &args.plot {
        let chart = presenter::render(&table, &args.title)?;
        chart.save(path)?;
        if !chart.excluded().is_empty() {
            eprintln!(
                "Note: {} cluster(s) not plotted: {}",
                chart.excluded().len(),
                chart.excluded().join(", ")
            );
        }
    }

    Ok(())
}
