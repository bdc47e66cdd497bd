mod bootstrap;

use anyhow::{Context, Result};
use audit_core::settings::Settings;
use audit_data::analysis::{analyze_audits, ReportOptions};
use audit_ui::app::App;

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(
        &settings.log_level,
        settings.log_file.as_deref(),
        !settings.json_output(),
    )?;

    tracing::info!("Provider Audit v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "View: {}, Output: {}, Theme: {}",
        settings.view,
        settings.output,
        settings.theme
    );

    settings.validate()?;
    let view = settings.analysis_view()?;
    let input = settings
        .input
        .as_deref()
        .context("no input given; pass --input <CSV file or directory>")?;

    let options = ReportOptions::from(&settings);
    let result = analyze_audits(input, view, &options)
        .with_context(|| format!("Failed to analyse {}", input.display()))?;

    if settings.json_output() {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        App::new(&settings.theme).run(&result)?;
    }

    Ok(())
}
