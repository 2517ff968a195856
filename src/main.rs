use karaoke::config::PlaybackConfig;
use karaoke::playback::SequencePlayer;
use karaoke::{KaraokeError, LyricBroadcaster, LyricSink};
use log::{info, LevelFilter};
use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

const USAGE: &str = "Usage: karaoke [--config FILE] [--midi FILE] [--dump] <piece.abc>";

/// Logging is controlled with KARAOKE_LOG using env_logger filter syntax.
/// If KARAOKE_LOG is not set, only warnings and errors are shown.
fn log_builder(filters: Option<&str>) -> env_logger::Builder {
    let mut log_builder = env_logger::builder();
    match filters {
        Some(filters) => log_builder.parse_filters(filters),
        None => log_builder.filter_level(LevelFilter::Warn),
    };
    log_builder
}

fn init_logging() {
    let filters = env::var("KARAOKE_LOG").ok();
    log_builder(filters.as_deref()).init();
}

struct Options {
    input: PathBuf,
    config: Option<PathBuf>,
    midi: Option<PathBuf>,
    dump: bool,
}

fn parse_args(args: &[String]) -> Option<Options> {
    let mut input = None;
    let mut config = None;
    let mut midi = None;
    let mut dump = false;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(iter.next()?)),
            "--midi" => midi = Some(PathBuf::from(iter.next()?)),
            "--dump" => dump = true,
            flag if flag.starts_with("--") => return None,
            path if input.is_none() => input = Some(PathBuf::from(path)),
            _ => return None,
        }
    }

    Some(Options {
        input: input?,
        config,
        midi,
        dump,
    })
}

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let options = match parse_args(&args) {
        Some(options) => options,
        None => {
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    if let Err(e) = run(options) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(options: Options) -> Result<(), KaraokeError> {
    let config = match &options.config {
        Some(path) => PlaybackConfig::load(path)?,
        None => PlaybackConfig::default(),
    };

    let source = fs::read_to_string(&options.input)?;
    let piece = karaoke::compile(&source)?;
    let header = piece.header();
    println!("{}", header.title());
    println!("by {}", header.composer());

    let broadcaster = Arc::new(LyricBroadcaster::new());
    let voices: Vec<String> = if !config.voices.is_empty() {
        config.voices.clone()
    } else {
        piece.voices().into_iter().collect()
    };
    for voice in &voices {
        broadcaster.add_writer(Box::new(io::stdout()), voice);
    }

    let lyrics: Arc<dyn LyricSink> = broadcaster;
    let mut sequence = piece.sequence(config.ticks_per_beat, &lyrics)?;
    let end = piece.music().duration();
    sequence.add_event(end, Box::new(|beat| info!("Finished at beat {}", beat)));

    if let Some(path) = options.midi.as_ref().or(config.midi_output.as_ref()) {
        sequence.write_midi(path)?;
        eprintln!("Wrote MIDI to {}", path.display());
    }
    if options.dump {
        let yaml = serde_yaml::to_string(&sequence.data())
            .map_err(|e| KaraokeError::Config(e.to_string()))?;
        println!("{}", yaml);
    }

    println!("Showing lyrics for: {}", voices.join(", "));
    print!("Type 'play' to start: ");
    io::stdout().flush()?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        match line?.trim() {
            "play" => {
                sequence.play()?;
                return sequence.wait();
            }
            "" => return Ok(()),
            other => {
                print!("Unknown command '{}'. Type 'play' to start: ", other);
                io::stdout().flush()?;
            }
        }
    }
    Ok(())
}
