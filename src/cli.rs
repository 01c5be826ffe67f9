use clap::Parser;
use std::path::PathBuf;

use wavethumb::{BarStyle, ChannelMix, Palette};

#[derive(Parser, Debug)]
#[command(name = "wavethumb", about = "Render a waveform/spectrum thumbnail for an audio file")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG, AAC)
    pub input: PathBuf,

    /// Output PNG file [default: input with .png extension]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Image width in pixels, one column per time window
    #[arg(long)]
    pub width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Color palette
    #[arg(short, long, value_enum)]
    pub palette: Option<Palette>,

    /// Bar shape
    #[arg(short, long, value_enum)]
    pub style: Option<BarStyle>,

    /// Channel handling: average, sum, or a zero-based channel index
    #[arg(long, value_parser = parse_mix)]
    pub mix: Option<ChannelMix>,

    /// Only analyze the first N seconds
    #[arg(long)]
    pub max_duration: Option<f64>,

    /// Give up after N seconds of processing (0 = no limit) [default: 30]
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Scale so the loudest column reaches full height
    #[arg(long)]
    pub normalize: bool,

    /// Draw a faint zero line through the middle row
    #[arg(long)]
    pub center_line: bool,

    /// Config file (TOML) [default: ./wavethumb.toml or the user config dir]
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Also write per-column features and run stats as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,
}

fn parse_mix(value: &str) -> Result<ChannelMix, String> {
    match value {
        "average" | "avg" | "mean" => Ok(ChannelMix::Average),
        "sum" => Ok(ChannelMix::SumClamped),
        "left" => Ok(ChannelMix::Channel(0)),
        "right" => Ok(ChannelMix::Channel(1)),
        other => other
            .parse::<usize>()
            .map(ChannelMix::Channel)
            .map_err(|_| format!("expected average, sum, left, right or a channel index, got '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mix_names() {
        assert_eq!(parse_mix("average"), Ok(ChannelMix::Average));
        assert_eq!(parse_mix("sum"), Ok(ChannelMix::SumClamped));
        assert_eq!(parse_mix("right"), Ok(ChannelMix::Channel(1)));
        assert_eq!(parse_mix("3"), Ok(ChannelMix::Channel(3)));
        assert!(parse_mix("loudest").is_err());
    }

    #[test]
    fn parses_full_command_line() {
        let cli = Cli::try_parse_from([
            "wavethumb",
            "in.wav",
            "--width",
            "120",
            "--palette",
            "muted-rainbow",
            "--style",
            "envelope",
            "--mix",
            "left",
            "--normalize",
        ])
        .unwrap();
        assert_eq!(cli.width, Some(120));
        assert_eq!(cli.palette, Some(Palette::MutedRainbow));
        assert_eq!(cli.style, Some(BarStyle::Envelope));
        assert_eq!(cli.mix, Some(ChannelMix::Channel(0)));
        assert!(cli.normalize);
        assert!(cli.output.is_none());
    }
}
