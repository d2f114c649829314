use std::env;

use typelapse_core::analysis::{LatencyAnalyzer, DEFAULT_HIGHLIGHT_THRESHOLD_MS};
use typelapse_core::format;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Usage: analyze_session <session.json> [threshold_ms]");
        return;
    }

    let path = &args[1];
    let threshold_ms = args
        .get(2)
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(DEFAULT_HIGHLIGHT_THRESHOLD_MS);

    let log = match format::read_json_file(path) {
        Ok(log) => log,
        Err(e) => {
            eprintln!("Failed to load session: {}", e);
            std::process::exit(1);
        }
    };

    println!("Session: {}", path);
    println!("Events: {}", log.len());
    println!("Span: {:.1}s", log.span_ms() as f64 / 1000.0);
    println!("Ordered timestamps: {}", log.is_ordered());

    let analyzer = LatencyAnalyzer::new(threshold_ms);
    let slow = analyzer.highlight_indices(&log);
    println!("\nGaps over {}ms: {}", threshold_ms, slow.len());

    let events = log.events();
    for index in slow {
        let gap = events[index].timestamp - events[index - 1].timestamp;
        let tail: String = events[index].value.chars().rev().take(20).collect();
        let preview: String = tail.chars().rev().collect();
        println!("  #{:<4} +{}ms  ...{}", index, gap, preview);
    }
}
