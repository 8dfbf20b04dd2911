use std::fs;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use mic_capture_core::processing::wav_format;
use mic_capture_core::storage::metadata;
use mic_capture_core::{
    create_backend, AudioFormat, BackendOptions, DispatchQueue, EngineAudioTap, GeneratorConfig, GeneratorTap,
    MixerConfig, Platform, RecorderSink, RecordingController, RecordingMetadata,
};

/// Main-loop tick, in the spirit of a game engine frame.
const TICK: Duration = Duration::from_millis(10);

#[derive(Parser)]
#[command(name = "mic-capture", version, about = "Record the microphone to WAV")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record from the software generator backend.
    Record(RecordArgs),
    /// Print the header of a WAV file.
    Inspect {
        /// WAV file to inspect.
        file: PathBuf,
    },
}

#[derive(clap::Args)]
struct RecordArgs {
    /// Directory recordings are written to.
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Recording length in seconds.
    #[arg(short, long, default_value_t = 3.0)]
    duration: f64,

    #[arg(long, default_value_t = 48000)]
    sample_rate: u32,

    #[arg(long, default_value_t = 1)]
    channels: u16,

    /// Microphone tone frequency in Hz; 0 records silence.
    #[arg(long, default_value_t = 440.0)]
    frequency: f32,

    #[arg(long, default_value_t = 0.25)]
    amplitude: f32,

    /// Mix a generated engine tone into the recording.
    #[arg(long)]
    overlay: bool,

    /// Engine tone frequency in Hz for --overlay.
    #[arg(long, default_value_t = 220.0)]
    overlay_frequency: f32,

    /// Mixer block size in frames for --overlay.
    #[arg(long, default_value_t = 512)]
    block_size: usize,

    /// Write a JSON metadata sidecar next to the recording.
    #[arg(long)]
    metadata: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Command::Record(args) => record(args),
        Command::Inspect { file } => inspect(file),
    }
}

fn record(args: RecordArgs) -> Result<()> {
    if !args.duration.is_finite() || args.duration <= 0.0 {
        bail!("duration must be positive");
    }
    fs::create_dir_all(&args.output).with_context(|| format!("creating {}", args.output.display()))?;

    let options = BackendOptions {
        recording_path: args.output.clone(),
        generator: GeneratorConfig {
            frequency_hz: args.frequency,
            amplitude: args.amplitude,
            ..Default::default()
        },
    };
    let mut controller = RecordingController::new(create_backend(Platform::Generator, options)).with_mixer_config(
        MixerConfig {
            block_size: args.block_size,
            ..Default::default()
        },
    );

    let queue = DispatchQueue::new();
    let (done_tx, done_rx) = mpsc::channel();
    let sink = RecorderSink::new(controller.recording_path(), queue.clone(), move |path| {
        let _ = done_tx.send(path);
    });

    let format = AudioFormat::new(args.sample_rate, args.channels);
    let tap: Option<Arc<dyn EngineAudioTap>> = if args.overlay {
        let tap: Arc<dyn EngineAudioTap> = Arc::new(GeneratorTap::new(
            format,
            GeneratorConfig {
                frequency_hz: args.overlay_frequency,
                amplitude: args.amplitude,
                ..Default::default()
            },
        ));
        controller.start_recording_with_overlay(Arc::downgrade(&tap), format, Some(sink.callback()))?;
        Some(tap)
    } else {
        controller.start_recording(format, Some(sink.callback()))?;
        None
    };
    println!("Recording {} for {:.1}s", format, args.duration);

    let deadline = Instant::now() + Duration::from_secs_f64(args.duration);
    while Instant::now() < deadline {
        queue.drain();
        thread::sleep(TICK);
    }
    if let Some(stats) = controller.mixer_stats() {
        log::info!(
            "Mixed {} blocks, {} starved ticks, {} samples realigned",
            stats.mix_cycles,
            stats.starved_ticks,
            stats.realigned_samples
        );
    }
    controller.stop_recording()?;

    // An overlay mixer finalizes on its own thread after stop.
    let deadline = Instant::now() + Duration::from_secs(5);
    let path = loop {
        queue.drain();
        if let Ok(path) = done_rx.try_recv() {
            break path;
        }
        if Instant::now() >= deadline {
            return Err(anyhow!("recording did not finalize"));
        }
        thread::sleep(TICK);
    };
    drop(tap);

    let result = sink
        .last_result()
        .ok_or_else(|| anyhow!("no recording result for {}", path.display()))?;
    println!(
        "Saved {} ({} samples, {:.3}s, sha256 {})",
        path.display(),
        result.total_samples,
        result.duration_secs,
        result.checksum
    );

    if args.metadata {
        let sidecar = metadata::write_metadata(&RecordingMetadata::from_result(&result), &path)?;
        println!("Metadata written to {}", sidecar.display());
    }
    Ok(())
}

fn inspect(file: PathBuf) -> Result<()> {
    let bytes = fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
    let header = wav_format::parse_wav_header(&bytes)?;

    println!("{}", file.display());
    println!("  format:      {}", header.format);
    println!("  byte rate:   {}", header.byte_rate);
    println!("  block align: {}", header.block_align);
    println!("  bits:        {}", header.bits_per_sample);
    println!("  data size:   {}", header.data_size);
    println!("  samples:     {}", header.total_samples());
    println!("  duration:    {:.3}s", header.duration_secs());
    Ok(())
}
