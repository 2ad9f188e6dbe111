use std::path::PathBuf;

use clap::Parser;
use renderer::BackendPreference;

#[derive(Parser, Debug)]
#[command(
    name = "neurawall",
    author,
    version,
    about = "Animated neural wallpaper",
    arg_required_else_help = false
)]
pub struct Cli {
    /// Render resolution (e.g. `1280x720`).
    #[arg(
        long,
        value_name = "WIDTHxHEIGHT",
        value_parser = parse_dimensions,
        default_value = "800x600"
    )]
    pub size: (u32, u32),

    /// Backend selection: `auto`, `gpu`, or `cpu`.
    #[arg(
        long,
        value_name = "MODE",
        value_parser = parse_backend,
        default_value = "auto"
    )]
    pub backend: BackendPreference,

    /// Working-buffer scale for the software backend (0 < scale <= 1).
    #[arg(long, value_name = "SCALE", value_parser = parse_cpu_scale)]
    pub cpu_scale: Option<f64>,

    /// Optional FPS cap for the animation (0=uncapped).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Pin the animation clock to a fixed timestamp.
    #[arg(long, value_name = "SECONDS", value_parser = parse_still_time)]
    pub still: Option<f64>,

    /// Render a single full-resolution frame to the provided PNG path then exit.
    #[arg(long, value_name = "PATH", value_parser = parse_export_path)]
    pub export: Option<PathBuf>,

    /// Window title.
    #[arg(long, value_name = "TITLE", default_value = "Neurawall")]
    pub title: String,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_backend(value: &str) -> Result<BackendPreference, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("backend must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "default" => Ok(BackendPreference::Auto),
        "gpu" | "hardware" => Ok(BackendPreference::ForceGpu),
        "cpu" | "software" => Ok(BackendPreference::ForceCpu),
        other => Err(format!(
            "unknown backend '{other}'; expected auto, gpu, or cpu"
        )),
    }
}

pub fn parse_cpu_scale(value: &str) -> Result<f64, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("cpu scale must not be empty".to_string());
    }

    let scale = trimmed
        .parse::<f64>()
        .map_err(|_| format!("invalid cpu scale '{trimmed}'; expected a number in (0, 1]"))?;
    if !(scale > 0.0 && scale <= 1.0) {
        return Err(format!(
            "cpu scale {scale} out of range; expected a number in (0, 1]"
        ));
    }
    Ok(scale)
}

pub fn parse_still_time(value: &str) -> Result<f64, String> {
    let trimmed = value.trim();
    let seconds = trimmed
        .parse::<f64>()
        .map_err(|_| format!("invalid timestamp '{trimmed}'; expected seconds"))?;
    if !(seconds.is_finite() && seconds >= 0.0) {
        return Err(format!(
            "timestamp {seconds} out of range; expected finite seconds >= 0"
        ));
    }
    Ok(seconds)
}

pub fn parse_export_path(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value.trim());
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => Ok(path),
        None => Err("export path has no extension; expected .png".to_string()),
        Some(other) => Err(format!(
            "unsupported export format '.{other}'; expected .png"
        )),
    }
}

fn parse_dimensions(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid width".to_string())?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid height".to_string())?;
    if width == 0 || height == 0 {
        return Err("dimensions must be greater than zero".into());
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dimension_pairs() {
        assert_eq!(parse_dimensions("800x600").unwrap(), (800, 600));
        assert_eq!(parse_dimensions("1920X1080").unwrap(), (1920, 1080));
        assert_eq!(parse_dimensions(" 640 x 480 ").unwrap(), (640, 480));
        assert!(parse_dimensions("800").is_err());
        assert!(parse_dimensions("0x600").is_err());
        assert!(parse_dimensions("800xtall").is_err());
    }

    #[test]
    fn parses_backend_words() {
        assert_eq!(parse_backend("auto").unwrap(), BackendPreference::Auto);
        assert_eq!(parse_backend(" GPU ").unwrap(), BackendPreference::ForceGpu);
        assert_eq!(
            parse_backend("software").unwrap(),
            BackendPreference::ForceCpu
        );
        assert!(parse_backend("metal").is_err());
        assert!(parse_backend("").is_err());
    }

    #[test]
    fn cpu_scale_stays_inside_the_unit_interval() {
        assert_eq!(parse_cpu_scale("0.15").unwrap(), 0.15);
        assert_eq!(parse_cpu_scale("1").unwrap(), 1.0);
        assert!(parse_cpu_scale("0").is_err());
        assert!(parse_cpu_scale("1.5").is_err());
        assert!(parse_cpu_scale("NaN").is_err());
    }

    #[test]
    fn still_timestamps_must_be_finite_and_nonnegative() {
        assert_eq!(parse_still_time("2.5").unwrap(), 2.5);
        assert_eq!(parse_still_time("0").unwrap(), 0.0);
        assert!(parse_still_time("inf").is_err());
        assert!(parse_still_time("NaN").is_err());
        assert!(parse_still_time("-1").is_err());
        assert!(parse_still_time("-0.25").is_err());
        assert!(parse_still_time("later").is_err());
    }

    #[test]
    fn export_paths_must_end_in_png() {
        assert_eq!(
            parse_export_path("out.png").unwrap(),
            PathBuf::from("out.png")
        );
        assert_eq!(
            parse_export_path("shots/frame.PNG").unwrap(),
            PathBuf::from("shots/frame.PNG")
        );
        assert!(parse_export_path("out.jpg").is_err());
        assert!(parse_export_path("out").is_err());
    }
}
