use anyhow::Context;
use clap::Parser;
use soma_actor::{
    BufferedRecorder, FrameInput, PhysiologicalActor, SampleBatch, Stimulus, StimulusKind,
    TelemetrySink,
};
use soma_core::{Accuracy, SomaConfig};
use std::path::PathBuf;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Frames a scripted threat stays in view.
const THREAT_FRAMES: usize = 30;
/// Unread telemetry batches before the recorder starts dropping.
const TELEMETRY_CHANNEL: usize = 16;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Run the Soma physiological pipeline headless", long_about = None)]
struct Args {
    /// Path to the TOML configuration
    #[arg(short, long, env = "SOMA_CONFIG", default_value = "soma.toml")]
    config: PathBuf,

    /// Frames to simulate
    #[arg(short, long, default_value_t = 600)]
    frames: usize,

    /// Seconds per frame
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Frame at which a sudden threat appears
    #[arg(long)]
    threat_frame: Option<usize>,

    /// Write JSON-lines telemetry to this file
    #[arg(long)]
    telemetry: Option<PathBuf>,

    /// Override the configured accuracy tier (realtime, standard, high, extreme)
    #[arg(long)]
    accuracy: Option<Accuracy>,

    /// Frames between progress summaries
    #[arg(long, default_value_t = 60)]
    report_every: usize,
}

fn init_logging() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(d) = "soma_cli=info".parse() {
        filter = filter.add_directive(d);
    }
    if let Ok(d) = "soma_actor=info".parse() {
        filter = filter.add_directive(d);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[derive(Debug)]
struct Summary {
    frames: usize,
    simulated_secs: f64,
    fatigue: f32,
    perceived_exertion: f32,
    peak_stress: f32,
    accuracy: Accuracy,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();

    let mut config = SomaConfig::load_or_default(&args.config);
    if let Some(tier) = args.accuracy {
        config.accuracy = tier;
    }
    let actor = PhysiologicalActor::new(config).context("Invalid configuration")?;

    let (recorder, writer) = match &args.telemetry {
        Some(path) => {
            let file = tokio::fs::File::create(path)
                .await
                .with_context(|| format!("Failed to create telemetry file {}", path.display()))?;
            let (recorder, rx) = BufferedRecorder::new(TELEMETRY_CHANNEL);
            info!("Recording telemetry to {}", path.display());
            (Some(recorder), Some(tokio::spawn(write_telemetry(file, rx))))
        }
        None => (None, None),
    };

    let run_args = args.clone();
    let summary = tokio::task::spawn_blocking(move || run(actor, recorder, &run_args))
        .await
        .context("Simulation task panicked")?;

    if let Some(writer) = writer {
        let written = writer.await.context("Telemetry writer panicked")??;
        info!("Wrote {} telemetry samples", written);
    }

    println!(
        "Simulated {} frames ({:.1} s) at {:?}: fatigue {:.3}, RPE {:.1}, peak stress {:.3}",
        summary.frames,
        summary.simulated_secs,
        summary.accuracy,
        summary.fatigue,
        summary.perceived_exertion,
        summary.peak_stress,
    );
    Ok(())
}

/// Scripted scenario: phase-shifted sinusoidal reaching on every segment,
/// plus a sudden threat for [`THREAT_FRAMES`] frames if requested.
fn scenario(frame: usize, segments: usize, args: &Args) -> FrameInput {
    let t = frame as f32 * args.dt;
    let torques = (0..segments)
        .map(|s| 0.6 * (1.3 * t + 0.4 * s as f32).sin())
        .collect();
    let mut input = FrameInput::new(torques, args.dt);
    if let Some(start) = args.threat_frame {
        if (start..start + THREAT_FRAMES).contains(&frame) {
            input = input.with_stimulus(
                Stimulus::new(StimulusKind::Threat, 1.0, 1.0)
                    .with_familiarity(0.0)
                    .with_predictability(0.0),
            );
        }
    }
    input
}

fn run(mut actor: PhysiologicalActor, mut recorder: Option<BufferedRecorder>, args: &Args) -> Summary {
    let segments = actor.cord().len();
    let report_every = args.report_every.max(1);
    let mut peak_stress: f32 = 0.0;

    for frame in 0..args.frames {
        let input = scenario(frame, segments, args);
        let sink = recorder.as_mut().map(|r| r as &mut dyn TelemetrySink);
        actor.step(&input, sink);
        peak_stress = peak_stress.max(actor.mood().stress());

        if (frame + 1) % report_every == 0 {
            let out = actor.output();
            info!(
                "frame {:>6}: fatigue {:.3}, RPE {:.1}, fear {:.2}, stress {:.3}, {:?}, {:.2} ms",
                frame + 1,
                out.fatigue,
                out.perceived_exertion,
                actor.emotion().primary.fear,
                actor.mood().stress(),
                actor.accuracy(),
                actor.last_frame_ms(),
            );
        }
    }

    if let Some(recorder) = recorder.as_mut() {
        if let Err(e) = recorder.flush() {
            warn!("Final telemetry flush failed: {}", e);
        }
        if recorder.dropped() > 0 {
            warn!("{} telemetry samples dropped under backpressure", recorder.dropped());
        }
    }

    let out = actor.output();
    Summary {
        frames: args.frames,
        simulated_secs: actor.time(),
        fatigue: out.fatigue,
        perceived_exertion: out.perceived_exertion,
        peak_stress,
        accuracy: actor.accuracy(),
    }
}

/// Drain telemetry batches into a JSON-lines file: one header line, then one
/// line per frame sample. Returns the number of samples written.
async fn write_telemetry(
    file: tokio::fs::File,
    mut rx: mpsc::Receiver<SampleBatch>,
) -> anyhow::Result<usize> {
    let mut out = BufWriter::new(file);
    let header = serde_json::json!({
        "format": "soma-frames",
        "version": 1,
        "started": chrono::Utc::now().to_rfc3339(),
    });
    out.write_all(format!("{}\n", header).as_bytes()).await?;

    let mut written = 0;
    while let Some(batch) = rx.recv().await {
        for sample in &batch {
            let line = serde_json::to_string(sample).context("Failed to encode frame sample")?;
            out.write_all(line.as_bytes()).await?;
            out.write_all(b"\n").await?;
        }
        written += batch.len();
    }
    out.flush().await?;
    Ok(written)
}
