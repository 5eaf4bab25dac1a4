use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, error, info};
use midi_mml::{
    Args, Conversion, ConvertError, EncoderConfig, ErrorBody, OutputFormat, build_timeline, decode_midi,
    import_midi_file, parse_format, read_midi_file, resolve_durations, select_tracks,
};
use std::fs;

fn main() -> Result<()> {
    let args = Args::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if args.verbose {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    let config = args.encoder_config();
    let format = parse_format(&args.format);
    debug!("Encoder config: {:?}", config);

    if args.dry_run {
        return match preview(&args, &config) {
            Ok(()) => Ok(()),
            Err(e) => fail(&args, format, e),
        };
    }

    info!("Converting MIDI file: '{}'...", args.midi.display());
    match import_midi_file(&args.midi, &config) {
        Ok(conversion) => {
            write_output(&args, &render_conversion(&conversion, format, args.pretty)?)?;
            info!("Conversion finished..!");
            Ok(())
        }
        Err(e) => fail(&args, format, e),
    }
}

fn render_conversion(conversion: &Conversion, format: OutputFormat, pretty: bool) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => conversion.to_text(),
        OutputFormat::Json if pretty => serde_json::to_string_pretty(conversion)? + "\n",
        OutputFormat::Json => serde_json::to_string(conversion)? + "\n",
    })
}

fn write_output(args: &Args, content: &str) -> Result<()> {
    match &args.output {
        Some(path) => {
            fs::write(path, content)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            info!("Wrote result to '{}'..!", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

/// Reports a failed conversion in the `{"error": ..}` shape and exits with the matching code.
fn fail(args: &Args, format: OutputFormat, e: ConvertError) -> Result<()> {
    error!("{} (status {})", e, e.status());

    let body = ErrorBody { error: e.to_string() };
    let content = match format {
        OutputFormat::Text => format!("error: {}\n", body.error),
        OutputFormat::Json => serde_json::to_string(&body)? + "\n",
    };
    write_output(args, &content)?;

    std::process::exit(e.exit_code());
}

/// Logs the track ranking and the first events of every selected track without encoding anything.
fn preview(args: &Args, config: &EncoderConfig) -> Result<(), ConvertError> {
    let bytes = read_midi_file(&args.midi, config.max_upload_bytes)?;
    let midi = decode_midi(&bytes)?;
    let timeline = build_timeline(&midi)?;

    info!(
        "{} track(s) with notes, {} tempo change(s), starting at {} bpm..!",
        timeline.tracks.len(),
        timeline.tempos.len(),
        timeline.initial_bpm()
    );

    for (label, track) in select_tracks(&timeline.tracks) {
        let Some(track) = track else {
            info!("{}: <empty>", label);
            continue;
        };

        info!(
            "{}: track {} with {} note-on(s), previewing at most {} events..!",
            label,
            track.index,
            track.note_on_count(),
            args.dry_run_max
        );

        let durations = resolve_durations(track, timeline.ticks_per_beat);
        for (i, ev) in track.events.iter().enumerate().take(args.dry_run_max) {
            info!(
                "Event {}: {:?} pitch={} vel={} tick={} dur={}",
                i,
                ev.kind,
                ev.pitch,
                ev.velocity,
                ev.time,
                durations[i].map(|d| d.to_string()).unwrap_or_else(|| "-".into())
            );
        }
    }

    Ok(())
}
