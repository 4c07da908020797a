//! One-shot probe of every configured page.

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::*;

use crate::core::config::LoadedConfig;
use crate::core::monitor::{MonitorRuntime, Sample, StatusLevel};
use crate::core::probe::{probe_or_sentinel, HttpProber};

fn colorize_status(sample: &Sample) -> ColoredString {
    let text = if sample.is_unreachable() {
        "unreachable".to_string()
    } else {
        sample.status_code.to_string()
    };

    match StatusLevel::from_status(sample.status_code) {
        StatusLevel::Healthy => text.green(),
        StatusLevel::Warning => text.yellow(),
        StatusLevel::Critical => text.red().bold(),
    }
}

/// Execute the check command
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let sources = super::config_sources(matches);
    let loaded = LoadedConfig::load(&sources).context("Failed to load configuration")?;
    let config = loaded.monitor;

    let runtime = MonitorRuntime::new().context("Failed to start async runtime")?;
    let prober = HttpProber::new(loaded.request_timeout)?;

    let results = runtime.block_on(async {
        let mut results = Vec::with_capacity(config.pages.len());
        for page in &config.pages {
            let url = config.page_url(page);
            let sample = probe_or_sentinel(&prober, &url, &page.selector).await;
            results.push((url, page.selector.as_str(), sample));
        }
        results
    });

    let url_width = results
        .iter()
        .map(|(url, _, _)| url.chars().count())
        .max()
        .unwrap_or(0);

    println!(
        "   {:<width$}  {:>11}  {}",
        "URL".bold(),
        "STATUS".bold(),
        "BLOCKS".bold(),
        width = url_width
    );
    for (url, selector, sample) in &results {
        println!(
            "{} {:<width$}  {:>11}  {} {}",
            StatusLevel::from_status(sample.status_code).emoji(),
            url,
            colorize_status(sample),
            sample.element_count.to_string().cyan(),
            format!("(.{})", selector).dimmed(),
            width = url_width
        );
    }

    let failing = results
        .iter()
        .filter(|(_, _, sample)| StatusLevel::from_status(sample.status_code) != StatusLevel::Healthy)
        .count();
    if failing > 0 {
        println!("\n{} {} of {} pages not healthy", "⚠".yellow(), failing, results.len());
    } else {
        println!("\n{} all {} pages healthy", "✓".green(), results.len());
    }

    Ok(())
}
