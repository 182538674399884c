use policy_decoder_lib::models::FilterStats;
use policy_decoder_lib::services::filter::{analyze_paragraphs, extract_relevant_text_with_threshold};
use policy_decoder_lib::services::text_processor::preview;
use policy_decoder_lib::services::{load_document_text, ConfigStore, FilterConfig};
use serde::Serialize;

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ParagraphDump {
    index: usize,
    score: f64,
    is_header: bool,
    selected: bool,
    chars: usize,
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Output {
    file: String,
    min_score: f64,
    used_fallback: bool,
    stats: FilterStats,
    paragraphs: Vec<ParagraphDump>,
    filtered_text: String,
}

fn main() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage:\n  cargo run --bin filter_policy -- <policy.pdf|.docx|.txt> [--min-score <f>] [--paragraphs <n>] [--text] [--out <json_path>]\n\nNotes:\n  - Filter constants come from the config file (POLICY_DECODER_CONFIG_DIR); --min-score overrides the threshold.\n  - `--text` prints the filtered text that would be sent to the extraction model."
        );
        return Ok(());
    }

    let path = args[1].clone();
    let config: FilterConfig = ConfigStore::from_env_or_default()
        .and_then(|store| store.load().ok())
        .map(|c| c.filter)
        .unwrap_or_default();
    let min_score: f64 = parse_arg_value(&args, "--min-score")
        .and_then(|s| s.parse().ok())
        .unwrap_or(config.min_score);
    let paragraphs_n: usize = parse_arg_value(&args, "--paragraphs")
        .and_then(|s| s.parse().ok())
        .unwrap_or(40);
    let print_text = has_flag(&args, "--text");
    let out_path = parse_arg_value(&args, "--out");

    let text = load_document_text(std::path::Path::new(&path)).map_err(|e| e.to_string())?;

    let selection = analyze_paragraphs(&text, min_score, &config);
    let result = extract_relevant_text_with_threshold(&text, min_score, &config);
    let stats = result.stats;

    println!("File: {}", path);
    println!("Extracted: {} chars ({} bytes)", text.chars().count(), text.len());
    println!("Threshold: {}", min_score);
    println!(
        "Paragraphs: {} total, {} selected{}",
        stats.total_paragraphs,
        stats.selected_paragraphs,
        if result.used_fallback { " (safety net)" } else { "" }
    );
    println!(
        "Chars: {} -> {} ({}% reduction)",
        stats.total_chars, stats.filtered_chars, stats.reduction_pct
    );
    println!();

    for (i, (p, &selected)) in selection
        .paragraphs
        .iter()
        .zip(selection.include.iter())
        .enumerate()
        .take(paragraphs_n)
    {
        println!(
            "[P{:04}] {} score={:>5.1}{}  {}",
            i,
            if selected { "+" } else { " " },
            p.score,
            if p.is_header { " H" } else { "  " },
            preview(&p.text, 120)
        );
    }
    if selection.paragraphs.len() > paragraphs_n {
        println!("... ({} more paragraphs)", selection.paragraphs.len() - paragraphs_n);
    }

    if print_text {
        println!();
        println!("{}", result.text);
    }

    if let Some(out_path) = out_path {
        let paragraphs = selection
            .paragraphs
            .iter()
            .zip(selection.include.iter())
            .enumerate()
            .map(|(index, (p, &selected))| ParagraphDump {
                index,
                score: p.score,
                is_header: p.is_header,
                selected,
                chars: p.text.chars().count(),
                text: p.text.clone(),
            })
            .collect();

        let out = Output {
            file: path.clone(),
            min_score,
            used_fallback: result.used_fallback,
            stats,
            paragraphs,
            filtered_text: result.text,
        };

        let json = serde_json::to_string_pretty(&out).map_err(|e| e.to_string())?;
        std::fs::write(&out_path, json).map_err(|e| format!("write out failed: {}", e))?;
        println!();
        println!("Wrote JSON: {}", out_path);
    }

    Ok(())
}
