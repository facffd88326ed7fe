// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command-line interface implementation

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use spriteanim_core::glam::Vec2;
use spriteanim_core::{ContentError, ContentRoot, DrawItem, DrawSource, LoopMode, Millis, Playback};
use std::io::Write;
use std::path::PathBuf;

/// Errors reported by the command-line driver
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Content directory could not be opened
    #[error(transparent)]
    Content(#[from] ContentError),
    /// No clip with that name
    #[error("Unknown clip '{0}'")]
    UnknownClip(String),
    /// Playback step must be positive
    #[error("Step must be positive, got {0}")]
    InvalidStep(Millis),
    /// Writing output failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON encoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// spriteanim - evaluate sprite animation clips
#[derive(Parser, Debug)]
#[command(name = "spriteanim")]
#[command(about = "Evaluate sprite animation clips and print their draw lists")]
#[command(version)]
pub struct Cli {
    /// Content directory holding spriteanim.ron and the libraries
    #[arg(long, short, default_value = ".")]
    pub content: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List clips, clip sets and atlases
    List,

    /// Evaluate one clip at a single time
    Eval {
        /// Clip name or `set:clip` key
        clip: String,

        /// Time in milliseconds
        #[arg(long, short, default_value_t = 0, allow_negative_numbers = true)]
        time: Millis,

        /// Print the draw list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Step a clip through time and print each frame
    Play {
        /// Clip name or `set:clip` key
        clip: String,

        /// Start time in milliseconds
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        from: Millis,

        /// End time in milliseconds (defaults to the clip duration)
        #[arg(long, allow_negative_numbers = true)]
        to: Option<Millis>,

        /// Time step in milliseconds (defaults to the settings file)
        #[arg(long)]
        step: Option<Millis>,

        /// End-of-clip behavior (defaults to the settings file)
        #[arg(long, value_enum)]
        loop_mode: Option<LoopArg>,

        /// Print one JSON object per frame
        #[arg(long)]
        json: bool,
    },
}

/// Loop mode as accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LoopArg {
    /// Stop at the end
    Once,
    /// Wrap around
    Repeat,
    /// Bounce between the ends
    PingPong,
}

impl From<LoopArg> for LoopMode {
    fn from(arg: LoopArg) -> Self {
        match arg {
            LoopArg::Once => LoopMode::Once,
            LoopArg::Repeat => LoopMode::Repeat,
            LoopArg::PingPong => LoopMode::PingPong,
        }
    }
}

#[derive(Serialize)]
struct Frame<'a> {
    clip: &'a str,
    time: Millis,
    items: &'a [DrawItem],
}

/// Run a parsed command, writing results to `out`
pub fn run(cli: Cli, out: &mut impl Write) -> Result<(), CliError> {
    let mut root = ContentRoot::open(&cli.content)?;

    match cli.command {
        Commands::List => list(&root, out),
        Commands::Eval { clip, time, json } => {
            let items = root
                .evaluate(&clip, time)
                .ok_or_else(|| CliError::UnknownClip(clip.clone()))?;
            write_frame(out, &Frame { clip: &clip, time, items: &items }, json)
        }
        Commands::Play {
            clip,
            from,
            to,
            step,
            loop_mode,
            json,
        } => {
            let duration = root
                .clips
                .find(&clip)
                .map(|c| c.duration_ms)
                .ok_or_else(|| CliError::UnknownClip(clip.clone()))?;
            let step = step.unwrap_or(root.settings.frame_step_ms);
            if step <= 0 {
                return Err(CliError::InvalidStep(step));
            }
            let mode = loop_mode.map(LoopMode::from).unwrap_or(root.settings.loop_mode);
            let to = to.unwrap_or(duration);

            let mut playback = Playback::new(clip.as_str()).with_mode(mode);
            playback.seek(from);
            playback.play();

            let frames = to.saturating_sub(playback.time).max(0) / step + 1;
            tracing::debug!("Playing '{}' for {} frames, {:?}", clip, frames, mode);
            for frame in 0..frames {
                if frame > 0 {
                    playback.advance(step, duration);
                }
                let time = playback.time;
                let items = root
                    .evaluate(&clip, time)
                    .ok_or_else(|| CliError::UnknownClip(clip.clone()))?;
                write_frame(out, &Frame { clip: &clip, time, items: &items }, json)?;
                if !playback.is_playing() {
                    break;
                }
            }
            Ok(())
        }
    }
}

fn list(root: &ContentRoot, out: &mut impl Write) -> Result<(), CliError> {
    writeln!(out, "Clips:")?;
    for clip in root.clips.iter() {
        writeln!(
            out,
            "  {} ({} ms, {} tracks)",
            clip.name,
            clip.duration_ms,
            clip.track_count()
        )?;
    }
    writeln!(out, "Sets:")?;
    for set in root.clips.sets() {
        writeln!(out, "  {}: {}", set.name, set.clips().join(", "))?;
    }
    writeln!(out, "Atlases:")?;
    for atlas in root.atlases.iter() {
        writeln!(
            out,
            "  {} [{}] ({} images)",
            atlas.name,
            atlas.source_file,
            atlas.images().len()
        )?;
    }
    Ok(())
}

fn write_frame(out: &mut impl Write, frame: &Frame<'_>, json: bool) -> Result<(), CliError> {
    if json {
        serde_json::to_writer(&mut *out, frame)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "{} @ {} ms", frame.clip, frame.time)?;
    for item in frame.items {
        writeln!(out, "  {}", describe(item))?;
    }
    Ok(())
}

fn describe(item: &DrawItem) -> String {
    let origin = item.transform.transform_point2(Vec2::ZERO);
    let source = match &item.source {
        DrawSource::Region { atlas, rect } => format!(
            "{}[{},{} {}x{}]",
            atlas, rect.x, rect.y, rect.width, rect.height
        ),
        DrawSource::Missing => "<missing>".to_string(),
    };
    let [r, g, b, a] = item.tint.to_array();
    format!(
        "{} at ({:.2}, {:.2}) {} tint #{:02x}{:02x}{:02x}{:02x} opacity {:.2}",
        item.name, origin.x, origin.y, source, r, g, b, a, item.opacity
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use spriteanim_core::{Atlas, Clip, ClipSet, ImageRegion, Keyframe, Track};

    fn content() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let mut root = ContentRoot::new(dir.path());
        root.atlases.add(
            Atlas::new("hero", "hero.png").with_region(ImageRegion::new("run", 0, 0, 400, 200)),
        );
        let mut clip = Clip::new("run").with_duration(400);
        clip.add_root(
            Track::new("body")
                .with_image("hero:run")
                .with_sheet(4, 1)
                .with_keyframes([
                    Keyframe::new(0).with_frame(0.0),
                    Keyframe::new(400).with_position(40.0, 0.0).with_frame(4.0),
                ]),
        );
        root.clips.add(clip);
        root.clips.add_set(ClipSet::new("hero").with_clip("run"));
        root.save().unwrap();
        dir
    }

    fn run_args(args: &[&str]) -> Result<String, CliError> {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut out = Vec::new();
        run(cli, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_list() {
        let dir = content();
        let path = dir.path().to_str().unwrap();
        let output = run_args(&["spriteanim", "--content", path, "list"]).unwrap();
        assert!(output.contains("run (400 ms, 1 tracks)"));
        assert!(output.contains("hero: run"));
        assert!(output.contains("hero [hero.png] (1 images)"));
    }

    #[test]
    fn test_eval_text() {
        let dir = content();
        let path = dir.path().to_str().unwrap();
        let output = run_args(&["spriteanim", "--content", path, "eval", "run", "--time", "200"]).unwrap();
        assert!(output.starts_with("run @ 200 ms"));
        assert!(output.contains("body at (20.00, 0.00) hero[200,0 100x200]"));
    }

    #[test]
    fn test_eval_set_key() {
        let dir = content();
        let path = dir.path().to_str().unwrap();
        let output = run_args(&["spriteanim", "--content", path, "eval", "hero:run", "--time", "200"]).unwrap();
        assert!(output.starts_with("hero:run @ 200 ms"));
        assert!(output.contains("hero[200,0 100x200]"));
    }

    #[test]
    fn test_eval_json() {
        let dir = content();
        let path = dir.path().to_str().unwrap();
        let output =
            run_args(&["spriteanim", "--content", path, "eval", "run", "--time", "100", "--json"]).unwrap();
        let value: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(value["time"], 100);
        assert_eq!(value["items"][0]["name"], "body");
        assert_eq!(value["items"][0]["source"]["Region"]["rect"]["x"], 100);
    }

    #[test]
    fn test_play_once_stops_at_end() {
        let dir = content();
        let path = dir.path().to_str().unwrap();
        let output = run_args(&[
            "spriteanim", "--content", path, "play", "run", "--from", "200", "--to", "1000", "--step",
            "100", "--loop-mode", "once",
        ])
        .unwrap();
        let times: Vec<_> = output.lines().filter(|l| l.starts_with("run @")).collect();
        assert_eq!(times, ["run @ 200 ms", "run @ 300 ms", "run @ 400 ms"]);
    }

    #[test]
    fn test_play_repeat_wraps() {
        let dir = content();
        let path = dir.path().to_str().unwrap();
        let output = run_args(&[
            "spriteanim", "--content", path, "play", "run", "--from", "300", "--to", "500", "--step",
            "100", "--loop-mode", "repeat",
        ])
        .unwrap();
        let times: Vec<_> = output.lines().filter(|l| l.starts_with("run @")).collect();
        assert_eq!(times, ["run @ 300 ms", "run @ 0 ms", "run @ 100 ms"]);
    }

    #[test]
    fn test_play_extreme_range_is_clamped() {
        let dir = content();
        let path = dir.path().to_str().unwrap();
        let output = run_args(&[
            "spriteanim", "--content", path, "play", "run", "--from=-2147483648", "--to",
            "2147483647", "--step", "100", "--loop-mode", "once",
        ])
        .unwrap();
        let times: Vec<_> = output.lines().filter(|l| l.starts_with("run @")).collect();
        assert_eq!(
            times,
            ["run @ 0 ms", "run @ 100 ms", "run @ 200 ms", "run @ 300 ms", "run @ 400 ms"]
        );
    }

    #[test]
    fn test_errors() {
        let dir = content();
        let path = dir.path().to_str().unwrap();
        assert!(matches!(
            run_args(&["spriteanim", "--content", path, "eval", "nope"]),
            Err(CliError::UnknownClip(name)) if name == "nope"
        ));
        assert!(matches!(
            run_args(&["spriteanim", "--content", path, "play", "run", "--step", "0"]),
            Err(CliError::InvalidStep(0))
        ));
    }
}
