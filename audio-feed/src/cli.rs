//! Command-line interface for audio-feed
//!
//! Handles argument normalization, parsing and logging configuration.
//! Flags are accepted in the single-dash form (`-samples 32`) as well as
//! the usual `--samples 32`; anything unrecognized is ignored.

use std::time::Duration;

use audio_feed_core::{FeedConfiguration, OutputMode};
use clap::Parser;
use log::LevelFilter;

/// Flags that take a value.
const VALUE_FLAGS: &[&str] = &["samples", "interval"];
/// Flags that stand alone.
const SWITCH_FLAGS: &[&str] = &["compress", "verbose", "help", "version"];

/// Streams desktop loopback audio as line-delimited JSON
#[derive(Parser, Debug)]
#[command(name = "audio-feed")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Maximum samples per record, both channels combined
    #[arg(
        long,
        default_value_t = 64,
        allow_negative_numbers = true,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub samples: u32,

    /// Milliseconds to sleep between polls
    #[arg(
        long,
        default_value_t = 15,
        allow_negative_numbers = true,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval: u64,

    /// Emit spectrally compressed left/right series instead of amplitudes
    #[arg(long)]
    pub compress: bool,

    /// Increase logging verbosity (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn feed_configuration(&self) -> FeedConfiguration {
        FeedConfiguration {
            max_samples: self.samples as usize,
            interval: Duration::from_millis(self.interval),
            mode: if self.compress {
                OutputMode::Compressed
            } else {
                OutputMode::Amplitude
            },
        }
    }

    /// Get the log level filter based on verbosity flags
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Raw arguments rewritten into the form clap expects.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct NormalizedArgs {
    pub args: Vec<String>,
    /// Arguments that were dropped, for logging once logging is up.
    pub ignored: Vec<String>,
}

/// Rewrite single-dash long flags to double-dash and drop unknown arguments.
///
/// The first argument is the program name and is kept as is. A value flag
/// consumes the following argument whatever it looks like, so a missing or
/// malformed value still reaches clap and fails there.
pub fn normalize_args<I>(raw: I) -> NormalizedArgs
where
    I: IntoIterator<Item = String>,
{
    let mut raw = raw.into_iter();
    let mut out = NormalizedArgs {
        args: raw.next().into_iter().collect(),
        ignored: Vec::new(),
    };

    while let Some(arg) = raw.next() {
        if !arg.starts_with('-') {
            out.ignored.push(arg);
            continue;
        }

        let name = arg.trim_start_matches('-');
        let (flag, inline_value) = match name.split_once('=') {
            Some((flag, value)) => (flag, Some(value)),
            None => (name, None),
        };

        if VALUE_FLAGS.contains(&flag) {
            match inline_value {
                Some(value) => out.args.push(format!("--{}={}", flag, value)),
                None => {
                    out.args.push(format!("--{}", flag));
                    out.args.extend(raw.next());
                }
            }
        } else if SWITCH_FLAGS.contains(&flag) && inline_value.is_none() {
            out.args.push(format!("--{}", flag));
        } else if is_short_cluster(&arg) {
            out.args.push(arg);
        } else {
            out.ignored.push(arg);
        }
    }

    out
}

/// `-v`, `-vv`, `-h`, `-V`: short forms clap already understands.
fn is_short_cluster(arg: &str) -> bool {
    let Some(rest) = arg.strip_prefix('-') else {
        return false;
    };
    if rest.starts_with('-') || rest.is_empty() {
        return false;
    }
    rest.chars().all(|c| c == 'v') || rest == "h" || rest == "V"
}

/// Initialize the logging system based on CLI arguments.
///
/// Everything goes to standard error; standard output carries records only.
pub fn init_logging(args: &Args) {
    let mut builder = env_logger::Builder::new();

    // Base level for all modules - keep at warn to suppress noisy deps
    builder.filter_level(LevelFilter::Warn);

    for module in ["audio_feed", "audio_feed_core", "audio_feed_windows"] {
        builder.filter_module(module, args.log_level());
    }

    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }

    builder.target(env_logger::Target::Stderr);
    builder.init();
}
