use std::env;
use std::io::{self, Write};

use typelapse_core::analysis::LatencyAnalyzer;
use typelapse_core::demo::SessionSimulator;
use typelapse_core::format;
use typelapse_core::playback::{ReplayEvent, ReplayScheduler};

const SNIPPET: &str = "let total = items.iter().map(|i| i.price).sum::<u32>();";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // Simulate someone typing the snippet, then export the session.
    let mut sim = SessionSimulator::new();
    let log = sim.type_text(SNIPPET, 0);
    println!(
        "Simulated session: {} events over {:.1}s",
        log.len(),
        log.span_ms() as f64 / 1000.0
    );

    let path = env::temp_dir().join(format::DEFAULT_SESSION_FILENAME);
    format::write_json_file(&path, &log)?;
    println!("Exported to {}", path.display());

    // Read it back and replay at 2x, showing the countdown next to the
    // replayed text.
    let log = format::read_json_file(&path)?;
    let (mut scheduler, mut events) = ReplayScheduler::new();
    scheduler.play(log, 2.0);

    let mut line = String::new();
    let mut left = scheduler.remaining_estimate_secs();
    while let Some(event) = events.recv().await {
        match event {
            ReplayEvent::Frame { value, .. } => line = value,
            ReplayEvent::TimeLeft { seconds } => left = seconds,
            ReplayEvent::Finished => {
                println!();
                break;
            }
        }
        print!("\r[{left:>4.1}s] > {line}");
        io::stdout().flush()?;
    }

    // Show where the typist hesitated.
    let analyzer = LatencyAnalyzer::default();
    let log = scheduler.take_log().unwrap_or_default();
    let slow = analyzer.highlight_indices(&log);
    if slow.is_empty() {
        println!("No pauses over {}ms", analyzer.threshold_ms());
    } else {
        println!(
            "Pauses over {}ms before events: {:?}",
            analyzer.threshold_ms(),
            slow
        );
    }

    Ok(())
}
