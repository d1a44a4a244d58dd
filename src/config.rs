// Run configuration.
//
// Settings come from a TOML file (`ledz.toml` by default) with one key per option,
// then from the command line, where every `key=value`, `--key=value` or bare `--flag`
// overrides one key:
//
// ledz panel.toml text="HELLO" --playcount=3 --preview

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Error;
use crate::fill::ColorSpec;
use crate::types::{DisplayGeometry, FirstLed};

pub const DEFAULT_CONFIG_FILE: &str = "ledz.toml";

/// Horizontal squeeze/stretch factors that still give a canvas of sane width.
const COMPRESS_RANGE: std::ops::RangeInclusive<f64> = 0.01..=100.0;

/// Keys whose value is always taken as text on the command line.
const STRING_KEYS: [&str; 9] =
    ["text", "font", "foreground", "background", "spidev", "spiset", "canvas", "output", "input"];

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    // --- hardware: describing the LED array hookup
    pub width: Option<u32>,  // LEDs per row (required)
    pub height: Option<u32>, // rows (required)
    pub firstled: FirstLed,
    pub flippedrows: Option<Vec<u32>>,
    pub spidev: PathBuf,
    pub spispeed: u32, // bits per second
    pub spiset: PathBuf,

    // --- create: rendering the text scroll
    #[serde(rename = "virtual")]
    pub virtual_scale: u32,
    pub font: String,
    pub fontsize: u32,
    pub fontbase: i32,
    pub foreground: String,
    pub background: String,
    pub verticalsmooth: bool,
    pub noleadin: bool,
    pub noleadout: bool,
    pub compress: f64,
    pub text: Option<String>,
    pub tobecontinued: bool,
    pub continued: bool,
    pub canvas: PathBuf,
    pub output: Option<PathBuf>,
    pub header: bool,

    // --- play: showing on the LED display
    pub input: Option<PathBuf>,
    pub brightness: f64,
    pub playcount: u32, // 0 = loop forever
    pub fps: Option<f64>,
    pub preview: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            firstled: FirstLed::TopLeft,
            flippedrows: None,
            spidev: PathBuf::from("/dev/spidev0.0"),
            spispeed: 8_000_000,
            spiset: PathBuf::from("./spiset"),
            virtual_scale: 1,
            font: "6x10".into(),
            fontsize: 1,
            fontbase: 0,
            foreground: "white".into(),
            background: "black".into(),
            verticalsmooth: false,
            noleadin: false,
            noleadout: false,
            compress: 1.0,
            text: Some("TESTING ledz".into()),
            tobecontinued: false,
            continued: false,
            canvas: PathBuf::from("canvas.png"),
            output: None,
            header: false,
            input: None,
            brightness: 1.0,
            playcount: 0,
            fps: None,
            preview: false,
        }
    }
}

impl Config {
    /// Read the config file (if any) and apply command line overrides.
    pub fn load<I>(args: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = String>,
    {
        let mut file = None;
        let mut overrides = Vec::new();
        for arg in args {
            if arg.starts_with("--") || arg.contains('=') {
                overrides.push(arg);
            } else if file.is_none() {
                file = Some(PathBuf::from(arg));
            } else {
                return Err(Error::Config(format!("unexpected argument '{arg}'")));
            }
        }

        let mut table = match file {
            Some(path) => read_table(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => read_table(Path::new(DEFAULT_CONFIG_FILE))?,
            None => toml::Table::new(),
        };
        for arg in &overrides {
            let (key, value) = parse_override(arg)?;
            table.insert(key, value);
        }
        Self::from_table(table)
    }

    pub fn from_table(table: toml::Table) -> Result<Self, Error> {
        toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| Error::Config(e.message().to_string()))
    }

    /// Everything that can be wrong with the settings, checked before any work starts.
    pub fn validate(&self) -> Result<(), Error> {
        let bad = |msg: &str| Err(Error::Config(msg.to_string()));

        self.geometry()?;
        if self.virtual_scale == 0 {
            return bad("virtual must be at least 1");
        }
        if self.fontsize == 0 {
            return bad("fontsize must be at least 1");
        }
        if !(COMPRESS_RANGE.contains(&self.compress)) {
            return bad("compress must be between 0.01 and 100");
        }
        if !(self.brightness >= 0.0) {
            return bad("brightness cannot be negative");
        }
        if self.fps.is_some_and(|fps| !(fps > 0.0)) {
            return bad("fps must be greater than 0");
        }
        if self.spispeed == 0 {
            return bad("spispeed must be greater than 0");
        }
        if self.input.is_some() && self.output.is_some() {
            return bad(
                "Cannot simultaneously read from movie file and write output to movie file, as this would only copy a file.",
            );
        }
        if self.input.is_none() && self.text.as_deref().is_none_or(str::is_empty) {
            return bad("Either a text to be displayed or a movie to be played must be specified.");
        }
        if self.input.is_none() {
            ColorSpec::parse(&self.foreground)?;
            ColorSpec::parse(&self.background)?;
        }
        Ok(())
    }

    pub fn geometry(&self) -> Result<DisplayGeometry, Error> {
        let (Some(width), Some(height)) = (self.width, self.height) else {
            return Err(Error::Config("both width and height must be given".into()));
        };
        let flipped = self
            .flippedrows
            .as_ref()
            .map(|rows| rows.iter().map(|&r| r as usize).collect());
        DisplayGeometry::new(width as usize, height as usize, self.firstled, flipped)
    }

    /// Default playback rate scales with the virtual screen (virtual 4 -> 80 fps).
    pub fn frame_rate(&self) -> f64 {
        self.fps.unwrap_or(20.0 * f64::from(self.virtual_scale))
    }

    /// Frames will go out over SPI (not to a file, a checkpoint, or the preview).
    pub fn uses_bus(&self) -> bool {
        self.output.is_none() && !self.tobecontinued && !self.preview
    }
}

fn read_table(path: &Path) -> Result<toml::Table, Error> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    toml::from_str(&text).map_err(|e| Error::Config(format!("{}: {}", path.display(), e.message())))
}

// "--key=value" / "key=value" / "--flag" -> (key, value)
fn parse_override(arg: &str) -> Result<(String, toml::Value), Error> {
    let arg = arg.trim_start_matches("--");
    let Some((key, raw)) = arg.split_once('=') else {
        if arg.is_empty() {
            return Err(Error::Config("empty option".into()));
        }
        return Ok((arg.to_string(), toml::Value::Boolean(true)));
    };
    let key = key.trim().to_string();
    // Try the value as TOML (numbers, booleans, arrays, quoted strings), else take it literally.
    let value = toml::from_str::<toml::Table>(&format!("v = {raw}"))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()));
    // text=2024 is still text
    let value = match value {
        toml::Value::Integer(_) | toml::Value::Float(_) | toml::Value::Boolean(_) | toml::Value::Datetime(_)
            if STRING_KEYS.contains(&key.as_str()) =>
        {
            toml::Value::String(raw.trim().to_string())
        }
        other => other,
    };
    Ok((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn file_keys_and_overrides_combine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.toml");
        std::fs::write(
            &path,
            "width = 32\nheight = 8\nfirstled = \"bottomright\"\nvirtual = 4\ntext = \"from file\"\n",
        )
        .unwrap();

        let config = Config::load(args(&[
            path.to_str().unwrap(),
            "text=HELLO world",
            "--playcount=3",
            "--preview",
            "flippedrows=[0, 2]",
        ]))
        .unwrap();

        assert_eq!(config.width, Some(32));
        assert_eq!(config.firstled, FirstLed::BottomRight);
        assert_eq!(config.virtual_scale, 4);
        assert_eq!(config.text.as_deref(), Some("HELLO world"));
        assert_eq!(config.playcount, 3);
        assert!(config.preview);
        assert_eq!(config.flippedrows, Some(vec![0, 2]));
        assert_eq!(config.frame_rate(), 80.0);
        config.validate().unwrap();
    }

    #[rstest]
    #[case("text=2024", "2024")]
    #[case("--text=3.50", "3.50")]
    #[case("text=true", "true")]
    #[case("text=\"quoted 7\"", "quoted 7")]
    fn text_override_is_never_a_number(#[case] arg: &str, #[case] expected: &str) {
        let config = Config::load(args(&["width=8", "height=4", arg])).unwrap();
        assert_eq!(config.text.as_deref(), Some(expected));
    }

    #[test]
    fn numeric_path_overrides_stay_paths() {
        let config = Config::load(args(&["output=2024", "input=7"])).unwrap();
        assert_eq!(config.output, Some(PathBuf::from("2024")));
        assert_eq!(config.input, Some(PathBuf::from("7")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = Config::load(args(&["width=8", "height=4", "colour=red"]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn missing_size_is_a_configuration_error() {
        let config = Config::load(args(&["width=8"])).unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[rstest]
    #[case(&["width=8", "height=4", "compress=0"])]
    #[case(&["width=8", "height=4", "compress=1e10"])]
    #[case(&["width=8", "height=4", "brightness=-1"])]
    #[case(&["width=8", "height=4", "virtual=0"])]
    #[case(&["width=8", "height=4", "fps=0"])]
    #[case(&["width=8", "height=4", "foreground=chartreuse-ish"])]
    #[case(&["width=8", "height=4", "input=a.movie", "output=b.movie"])]
    #[case(&["width=8", "height=4", "text=\"\""])]
    #[case(&["width=8", "height=4", "flippedrows=[4]"])]
    fn invalid_settings_fail_validation(#[case] list: &[&str]) {
        let config = Config::load(args(list)).unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn missing_config_file_reports_path() {
        let err = Config::load(args(&["/nonexistent/ledz.toml"])).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/ledz.toml"));
    }

    #[test]
    fn only_bus_runs_need_the_bus() {
        let base = Config { width: Some(8), height: Some(4), ..Config::default() };
        assert!(base.uses_bus());
        assert!(!Config { preview: true, ..base.clone() }.uses_bus());
        assert!(!Config { tobecontinued: true, ..base.clone() }.uses_bus());
        assert!(!Config { output: Some("m".into()), ..base }.uses_bus());
    }
}
