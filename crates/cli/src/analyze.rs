use std::path::{Path, PathBuf};

use colored::Colorize;
use formscan::{AnalysisReport, AnalyzerConfig, FieldRecord};

use crate::prelude::{eprintln, println, *};

#[derive(Debug, Clone, Copy, clap::ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyArg {
    /// Only the document's own interactive widgets
    Native,
    /// Only the drawing and text heuristics
    Heuristic,
    /// Widgets first, then every heuristic
    Full,
}

impl From<StrategyArg> for formscan::Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Native => formscan::Strategy::Native,
            StrategyArg::Heuristic => formscan::Strategy::Heuristic,
            StrategyArg::Full => formscan::Strategy::Full,
        }
    }
}

#[derive(Debug, clap::Args)]
pub struct AnalyzeOptions {
    /// PDF files to analyze
    #[arg(value_name = "PDF", required = true)]
    pub paths: Vec<PathBuf>,

    /// TOML file with analyzer settings
    #[arg(long, env = "FORMSCAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Which detectors to run
    #[arg(long, value_enum, env = "FORMSCAN_STRATEGY")]
    pub strategy: Option<StrategyArg>,

    /// Drop fields below this confidence
    #[arg(long, env = "FORMSCAN_MIN_CONFIDENCE")]
    pub min_confidence: Option<f32>,

    /// Drop fields whose position is only a placeholder
    #[arg(long, env = "FORMSCAN_NO_PLACEHOLDERS")]
    pub no_placeholders: bool,

    /// Shorten native names to their last component
    #[arg(long, env = "FORMSCAN_SHORT_NAMES")]
    pub short_names: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, serde::Serialize)]
struct DocumentReport<'a> {
    path: String,
    #[serde(flatten)]
    report: &'a AnalysisReport,
}

/// The file's settings, if any, overridden by the flags that were given.
fn load_config(options: &AnalyzeOptions) -> Result<AnalyzerConfig> {
    let mut config = match &options.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| f!("reading config {}", path.display()))?;
            AnalyzerConfig::from_toml_str(&text).map_err(|e| Error::Config(e.to_string()))?
        }
        None => AnalyzerConfig::default(),
    };

    if let Some(strategy) = options.strategy {
        config.strategy = strategy.into();
    }
    if let Some(min_confidence) = options.min_confidence {
        config.min_confidence = min_confidence;
    }
    config.drop_placeholders |= options.no_placeholders;
    config.short_names |= options.short_names;

    config
        .validate()
        .map_err(|e| Error::Config(e.to_string()))?;
    Ok(config)
}

pub fn run(options: AnalyzeOptions, global: crate::Global) -> Result<()> {
    let config = load_config(&options)?;
    if global.verbose {
        eprintln!("Strategy: {:?}", config.strategy);
    }

    let reports: Vec<(String, AnalysisReport)> = options
        .paths
        .iter()
        .map(|path| (path.display().to_string(), analyze_path(path, &config)))
        .collect();

    if options.json {
        output_json(&reports)?;
    } else {
        for (path, report) in &reports {
            println!("{}", format_report(path, report));
        }
        if reports.len() > 1 {
            print_batch_summary(&reports);
        }
    }

    let failed = reports.iter().filter(|(_, r)| !r.success).count();
    if failed > 0 {
        return Err(Error::AnalysisFailed {
            failed,
            total: reports.len(),
        }
        .into());
    }
    Ok(())
}

fn analyze_path(path: &Path, config: &AnalyzerConfig) -> AnalysisReport {
    log::debug!("analyzing {}", path.display());
    formscan::analyze_file(path, config)
}

fn output_json(reports: &[(String, AnalysisReport)]) -> Result<()> {
    let json = match reports {
        [(_, report)] => serde_json::to_string_pretty(report),
        _ => serde_json::to_string_pretty(
            &reports
                .iter()
                .map(|(path, report)| DocumentReport {
                    path: path.clone(),
                    report,
                })
                .collect::<Vec<_>>(),
        ),
    }
    .map_err(|e| eyre!("JSON serialization failed: {}", e))?;
    println!("{}", json);
    Ok(())
}

fn colored_confidence(confidence: f32) -> colored::ColoredString {
    let text = f!("{confidence:.2}");
    if confidence >= 0.9 {
        text.green()
    } else if confidence >= 0.6 {
        text.yellow()
    } else {
        text.red()
    }
}

fn field_row(field: &FieldRecord) -> prettytable::Row {
    prettytable::row![
        field.page,
        &field.name,
        field.field_type,
        format_rect(&field.rect),
        field.detection_method,
        colored_confidence(field.confidence)
    ]
}

/// Header, message and field table for one document.
fn format_report(path: &str, report: &AnalysisReport) -> String {
    let mut result = String::new();

    result.push_str(&f!("\n{}\n", "=".repeat(80).bright_cyan()));
    result.push_str(&f!("{}\n", path.bold()));
    result.push_str(&f!("{}\n", "=".repeat(80).bright_cyan()));

    if !report.success {
        result.push_str(&f!(
            "{} {}\n",
            report.message.red(),
            report.error.as_deref().unwrap_or_default()
        ));
        return result;
    }

    if let Some(document_type) = &report.document_type {
        result.push_str(&f!("{}\n", document_type.bright_yellow()));
    }
    result.push_str(&f!("{}\n\n", report.message));
    if !report.fields.is_empty() {
        let mut table = new_table();
        table.add_row(prettytable::row![
            "Page",
            "Name",
            "Type",
            "Rect",
            "Method",
            "Confidence"
        ]);
        for field in &report.fields {
            table.add_row(field_row(field));
        }
        result.push_str(&table.to_string());
    }

    for d in &report.diagnostics {
        result.push_str(&f!(
            "{} page {} {}: {}\n",
            "warning:".yellow(),
            d.page,
            d.detector,
            d.message
        ));
    }
    result
}

fn print_batch_summary(reports: &[(String, AnalysisReport)]) {
    println!("\n{}", "SUMMARY".bold());
    let mut table = new_table();
    table.add_row(prettytable::row![
        "File",
        "Pages",
        "Fields",
        "Interactive",
        "Visual",
        "Status"
    ]);
    for (path, report) in reports {
        let status = if report.success {
            "ok".green()
        } else {
            "failed".red()
        };
        table.add_row(prettytable::row![
            path,
            report.page_count,
            report.field_count,
            report.interactive_field_count,
            report.visual_field_count,
            status
        ]);
    }
    table.printstd();

    let total: usize = reports.iter().map(|(_, r)| r.field_count).sum();
    println!("{} fields in {} documents", total, reports.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, clap::Parser)]
    struct TestApp {
        #[command(flatten)]
        options: AnalyzeOptions,
    }

    fn options(args: &[&str]) -> AnalyzeOptions {
        let mut argv = vec!["formscan"];
        argv.extend_from_slice(args);
        TestApp::parse_from(argv).options
    }

    #[test]
    fn flags_override_defaults() {
        let config = load_config(&options(&[
            "a.pdf",
            "--strategy",
            "native",
            "--min-confidence",
            "0.5",
            "--no-placeholders",
        ]))
        .unwrap();
        assert_eq!(config.strategy, formscan::Strategy::Native);
        assert_eq!(config.min_confidence, 0.5);
        assert!(config.drop_placeholders);
        assert!(!config.short_names);
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        assert!(load_config(&options(&["a.pdf", "--min-confidence", "1.5"])).is_err());
    }

    #[test]
    fn failed_report_shows_the_error() {
        let report = AnalysisReport::failure("Document is empty");
        let text = format_report("empty.pdf", &report);
        assert!(text.contains("empty.pdf"));
        assert!(text.contains("Document is empty"));
    }
}
