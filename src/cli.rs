use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print failures as a JSON body ({"error": ...}) on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract mono 16 kHz WAV audio from a video file
    Extract {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output audio file
        #[arg(short, long, default_value = "audio.wav")]
        output: PathBuf,
    },

    /// Generate captions from an audio file
    Transcribe {
        /// Input audio file
        #[arg(short, long)]
        input: PathBuf,

        /// Output caption file
        #[arg(short, long, default_value = "subtitles_en.srt")]
        output: PathBuf,

        /// Spoken language (defaults to the configured one)
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Translate a caption file
    Translate {
        /// Input caption file
        #[arg(short, long)]
        input: PathBuf,

        /// Output caption file (defaults to subtitles_<target>.srt)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Burn captions into a video file
    Embed {
        /// Input video file
        #[arg(long)]
        video: PathBuf,

        /// Caption file
        #[arg(short, long)]
        subtitles: PathBuf,

        /// Output video file
        #[arg(short, long, default_value = "video_with_subtitles.mp4")]
        output: PathBuf,
    },

    /// Run extraction, transcription, translation and burn-in on one video
    Process {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output video file
        #[arg(short, long, default_value = "video_with_subtitles.mp4")]
        output: PathBuf,

        /// Copy intermediate audio and caption files into this directory
        #[arg(long)]
        keep_intermediates: Option<PathBuf>,
    },

    /// Check that ffmpeg, whisper and the translation model are available
    Check,

    /// Write the default configuration to a file
    InitConfig {
        #[arg(short, long, default_value = "subrelay.toml")]
        output: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_translate_defaults() {
        let args = Args::try_parse_from(["subrelay", "translate", "-i", "in.srt", "--json-errors"]).unwrap();
        assert!(args.json_errors);
        match args.command {
            Commands::Translate { input, output } => {
                assert_eq!(input, PathBuf::from("in.srt"));
                assert!(output.is_none());
            }
            _ => panic!("expected translate"),
        }
    }
}
