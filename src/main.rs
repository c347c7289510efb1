//! Command-line renderer and player for packed chiptune songs

use std::env;
use std::fs;
use std::process;

use anyhow::{bail, Context, Result};

use quadtune::Engine;

/// Native engine sample rate in Hz
const SAMPLE_RATE: u32 = 8_000;

/// Hard cap on rendered length, in seconds
const MAX_RENDER_SECONDS: u32 = 600;

struct Args {
    song_path: String,
    wav_path: Option<String>,
    seconds: Option<u32>,
    play: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = env::args().skip(1);
    let mut song_path = None;
    let mut wav_path = None;
    let mut seconds = None;
    let mut play = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-o" | "--output" => {
                wav_path = Some(args.next().context("missing value for --output")?);
            }
            "--seconds" => {
                let value = args.next().context("missing value for --seconds")?;
                seconds = Some(value.parse().context("--seconds expects a number")?);
            }
            "--play" => play = true,
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            other if song_path.is_none() => song_path = Some(other.to_string()),
            other => bail!("unexpected argument: {other}"),
        }
    }

    Ok(Args {
        song_path: song_path.context("missing song file argument")?,
        wav_path,
        seconds,
        play,
    })
}

fn print_usage() {
    println!("Usage: quadtune <song.bin> [options]");
    println!();
    println!("Options:");
    println!("  -o, --output <file>   Render to a WAV file (default: out.wav)");
    println!("  --seconds <n>         Limit the rendered/played length");
    println!("  --play                Play in real time (requires the \"streaming\" feature)");
}

fn main() -> Result<()> {
    let args = parse_args()?;

    let blob = fs::read(&args.song_path)
        .with_context(|| format!("failed to read song file '{}'", args.song_path))?;
    let engine = Engine::new(blob).context("song failed validation")?;

    if args.play {
        play(engine, args.seconds)
    } else {
        let path = args.wav_path.as_deref().unwrap_or("out.wav");
        render_wav(engine, path, args.seconds)
    }
}

/// Render the song offline into a 16-bit stereo WAV file
fn render_wav(mut engine: Engine, path: &str, seconds: Option<u32>) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer =
        hound::WavWriter::create(path, spec).with_context(|| format!("cannot create '{path}'"))?;

    let limit = seconds.unwrap_or(MAX_RENDER_SECONDS).min(MAX_RENDER_SECONDS) as u64;
    let max_samples = limit * SAMPLE_RATE as u64;

    let mut produced = 0u64;
    while produced < max_samples && engine.is_playing() {
        // Derive the tick clock from the sample clock: 8 samples per ms
        let now_ms = (produced / (SAMPLE_RATE as u64 / 1000)) as u32;
        engine.advance_sequencer(now_ms);

        let sample = engine.produce_sample();
        let signed = (sample as i32 - 0x8000) as i16;
        writer.write_sample(signed)?;
        writer.write_sample(signed)?;
        produced += 1;
    }

    writer.finalize()?;
    println!(
        "Rendered {:.2}s to {path}",
        produced as f64 / SAMPLE_RATE as f64
    );
    Ok(())
}

#[cfg(feature = "streaming")]
fn play(engine: Engine, seconds: Option<u32>) -> Result<()> {
    use quadtune::streaming::{AudioDevice, StreamConfig};
    use quadtune::TICK_INTERVAL_MS;
    use std::thread;
    use std::time::{Duration, Instant};

    let mut engine = engine;
    let _device = AudioDevice::new(StreamConfig::new(), engine.output_buffer())
        .context("failed to open audio output")?;

    let start = Instant::now();
    let limit = seconds.map(|s| Duration::from_secs(s as u64));
    let mut produced = 0u64;

    while engine.is_playing() {
        let elapsed = start.elapsed();
        if limit.is_some_and(|l| elapsed >= l) {
            break;
        }

        let now_ms = elapsed.as_millis() as u32;
        engine.advance_sequencer(now_ms);

        // Pace production against the wall clock
        let target = elapsed.as_micros() as u64 * SAMPLE_RATE as u64 / 1_000_000;
        while produced < target {
            engine.produce_sample();
            produced += 1;
        }

        thread::sleep(Duration::from_millis(TICK_INTERVAL_MS as u64 / 4));
    }

    // Let the device drain the tail of the buffer
    thread::sleep(Duration::from_millis(100));
    println!("Played {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

#[cfg(not(feature = "streaming"))]
fn play(_engine: Engine, _seconds: Option<u32>) -> Result<()> {
    bail!("--play requires the \"streaming\" feature; rebuild with `--features streaming`")
}
