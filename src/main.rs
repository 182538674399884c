use anyhow::{anyhow, bail, Context, Result};
use std::path::Path;

use policy_decoder_lib::models::{AlertSeverity, PolicyAnalysis, UserProfile};
use policy_decoder_lib::services::risk::tables::DISEASE_CATALOG;
use policy_decoder_lib::services::{format_inr, AppConfig, ConfigStore, LlmOracle, PolicyPipeline};

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_arg_values(args: &[String], key: &str) -> Vec<String> {
    args.iter()
        .enumerate()
        .filter(|(_, a)| *a == key)
        .filter_map(|(i, _)| args.get(i + 1))
        .flat_map(|v| v.split(','))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

fn required<T: std::str::FromStr>(args: &[String], key: &str) -> Result<T> {
    let raw = parse_arg_value(args, key).ok_or_else(|| anyhow!("missing required argument {}", key))?;
    raw.replace('_', "")
        .parse()
        .map_err(|_| anyhow!("invalid value for {}: {}", key, raw))
}

fn usage() {
    let diseases: Vec<&str> = DISEASE_CATALOG.iter().map(|d| d.name).collect();
    eprintln!(
        "Usage:\n  policy-decoder <policy.pdf|.docx|.txt> --age <18-80> --income <annual> --sum-insured <amount> [--disease <name>]... [--min-score <f>] [--provider <name[:model]>] [--json] [--out <json_path>]\n\nSum insured tiers: 200000, 300000, 500000, 1000000, 1500000, 2500000, 5000000\nKnown diseases: {}",
        diseases.join(", ")
    );
}

fn print_report(analysis: &PolicyAnalysis) {
    let report = &analysis.report;
    let stats = &analysis.filter;

    println!("Analysis: {}", analysis.analysis_id);
    println!(
        "Filter: {} of {} paragraphs kept, {} -> {} chars ({}% reduction)",
        stats.selected_paragraphs, stats.total_paragraphs, stats.total_chars, stats.filtered_chars, stats.reduction_pct
    );
    println!();
    println!("Risk score: {}/100  {}", report.final_score, report.risk_tier_label);
    println!("  {}", report.risk_tier_detail);
    println!();
    println!("Expected out-of-pocket (5 yrs): {}", format_inr(report.expected_oop_5yr));
    println!("Claim rejection probability:    {}%", report.rejection_probability_pct);
    println!("Financial exposure ratio:       {}%", report.financial_exposure_ratio_pct);
    println!("Exclusion density:              {}", report.exclusion_density_score);
    if report.catastrophic_expenditure_warning {
        println!();
        println!(
            "WARNING: {} over 5 years would exceed 40% of your disposable income (catastrophic health expenditure).",
            format_inr(report.expected_oop_5yr)
        );
    }

    match &analysis.facts {
        Some(facts) => {
            let counts = facts.counts();
            println!();
            println!(
                "Extracted: {} exclusions, {} waiting periods, {} co-payments, {} hidden limits",
                counts.exclusions, counts.waiting_periods, counts.copayments, counts.hidden_limits
            );
            let mut alerts: Vec<_> = facts.danger_alerts.iter().collect();
            alerts.sort_by_key(|a| a.severity().unwrap_or(AlertSeverity::Medium));
            for alert in alerts {
                let severity = alert.text("severity").unwrap_or_else(|| "Alert".to_string());
                let message = alert.text_or_value("message").unwrap_or_default();
                println!("  [{}] {}", severity, message);
            }
        }
        None => {
            println!();
            println!("No clauses could be extracted; the score uses a neutral model signal.");
        }
    }

    println!();
    println!("Per-condition exposure:");
    for (disease, d) in &report.disease_breakdown {
        if d.expected_oop_5yr <= 0.0 && !d.in_waiting_period && !d.pre_existing {
            continue;
        }
        println!(
            "  {:<20} p={:<5} cost={:<12} oop_5yr={:<12}{}{}",
            disease,
            d.annual_probability,
            format_inr(d.treatment_cost),
            format_inr(d.expected_oop_5yr),
            if d.in_waiting_period { " waiting" } else { "" },
            if d.pre_existing { " declared" } else { "" }
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || has_flag(&args, "--help") {
        usage();
        return Ok(());
    }

    policy_decoder_lib::init_logging();

    let path = args[1].clone();
    let mut config: AppConfig = match ConfigStore::from_env_or_default() {
        Some(store) => store.load().map_err(|e| anyhow!(e))?,
        None => AppConfig::default(),
    };
    if let Some(min_score) = parse_arg_value(&args, "--min-score") {
        config.filter.min_score = min_score
            .parse()
            .with_context(|| format!("invalid --min-score {}", min_score))?;
    }
    if let Some(provider) = parse_arg_value(&args, "--provider") {
        config.oracle.provider = provider;
    }

    let user = UserProfile::new(
        required::<u32>(&args, "--age")?,
        required::<f64>(&args, "--income")?,
        required::<f64>(&args, "--sum-insured")?,
        parse_arg_values(&args, "--disease"),
    )?;

    if !Path::new(&path).exists() {
        bail!("file not found: {}", path);
    }

    let oracle = LlmOracle::from_config(&config.oracle, config.proxy.as_ref())
        .context("failed to set up the extraction model")?;
    let pipeline = PolicyPipeline::new(oracle, &config);
    let analysis = pipeline
        .analyze_file(Path::new(&path), &user)
        .await
        .with_context(|| format!("analysis of {} failed", path))?;

    if has_flag(&args, "--json") {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print_report(&analysis);
    }

    if let Some(out_path) = parse_arg_value(&args, "--out") {
        let json = serde_json::to_string_pretty(&analysis)?;
        std::fs::write(&out_path, json).with_context(|| format!("write {} failed", out_path))?;
        eprintln!("Wrote JSON: {}", out_path);
    }

    Ok(())
}
