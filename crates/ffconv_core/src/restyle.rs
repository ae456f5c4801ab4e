//! ASS subtitle restyling.
//!
//! Works on the extracted `.ass` text: rescales the script resolution to
//! the actual video dimensions, rewrites `Style:` fields per the subtitle
//! preset, and drops styles no dialogue line references.

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::command::{RunnerError, ToolRunner};
use crate::models::StreamRecord;
use crate::presets::{StylePreset, StyleRule};

pub const FFPROBE: &str = "ffprobe";

#[derive(Error, Debug)]
pub enum RestyleError {
    #[error(transparent)]
    Probe(#[from] RunnerError),

    /// ffprobe output did not contain a parsable video stream entry.
    #[error("Could not read video dimensions for `{file}`: {reason}")]
    Resolution { file: String, reason: String },

    /// No subtitle stream matches the language override.
    #[error("No subtitle stream with language `{0}`")]
    NoLanguageMatch(String),

    /// Only text subtitle codecs can be restyled.
    #[error("Cannot restyle subtitle codec `{0}`")]
    UnsupportedCodec(String),

    /// The document has no `[V4+ Styles]` section with a format line.
    #[error("ASS document has no styles format line")]
    MissingStylesFormat,

    /// A preset rule names a field the format line does not declare.
    #[error("Style field `{0}` does not exist in the ASS format line")]
    UnknownStyleField(String),

    /// A scale rule hit a field that is not numeric.
    #[error("Style field `{field}` has non-numeric value `{value}`")]
    NonNumericField { field: String, value: String },
}

pub type RestyleResult<T> = Result<T, RestyleError>;

/// How the subtitle stream for restyling is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StreamSelect {
    /// No override: prompt (or take the first stream).
    #[default]
    Auto,
    /// Global track id.
    Id(u32),
    /// ISO 639-2 language code.
    Language(String),
}

impl FromStr for StreamSelect {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<u32>() {
            Ok(id) => Ok(StreamSelect::Id(id)),
            Err(_) => Ok(StreamSelect::Language(s.to_string())),
        }
    }
}

impl StreamSelect {
    /// Resolve an explicit override against the subtitle candidates.
    /// `Auto` returns `None`: the caller decides interactively.
    pub fn resolve(&self, candidates: &[StreamRecord]) -> RestyleResult<Option<u32>> {
        match self {
            StreamSelect::Auto => Ok(None),
            StreamSelect::Id(id) => Ok(Some(*id)),
            StreamSelect::Language(lang) => candidates
                .iter()
                .find(|r| r.props.language.as_deref() == Some(lang.as_str()))
                .map(|r| Some(r.id))
                .ok_or_else(|| RestyleError::NoLanguageMatch(lang.clone())),
        }
    }
}

/// File suffix for an extractable text subtitle codec.
pub fn subtitle_extension(codec_id: &str) -> RestyleResult<&'static str> {
    match codec_id.to_ascii_lowercase().as_str() {
        "s_text/ass" | "s_text/ssa" => Ok("ass"),
        "s_text/utf8" | "text/plain" => Ok("srt"),
        other => Err(RestyleError::UnsupportedCodec(other.to_string())),
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeDoc {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// Probe the first video stream's dimensions.
pub fn video_resolution(runner: &dyn ToolRunner, file: &Path) -> RestyleResult<(u32, u32)> {
    let args: Vec<String> = vec![
        "-v".into(),
        "error".into(),
        "-select_streams".into(),
        "v:0".into(),
        "-show_entries".into(),
        "stream=width,height".into(),
        "-of".into(),
        "json".into(),
        file.display().to_string(),
    ];
    let output = runner.run(FFPROBE, &args)?;
    let doc: FfprobeDoc =
        serde_json::from_str(&output.stdout).map_err(|e| RestyleError::Resolution {
            file: file.display().to_string(),
            reason: e.to_string(),
        })?;
    let stream = doc.streams.first().ok_or_else(|| RestyleError::Resolution {
        file: file.display().to_string(),
        reason: "no video stream reported".into(),
    })?;
    match (stream.width, stream.height) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(RestyleError::Resolution {
            file: file.display().to_string(),
            reason: "stream entry lacks width/height".into(),
        }),
    }
}

/// An ASS script held as lines, edited in place and re-serialized.
#[derive(Debug, Clone)]
pub struct AssDocument {
    lines: Vec<String>,
}

impl AssDocument {
    pub fn parse(content: &str) -> Self {
        Self {
            lines: content.lines().map(|l| l.to_string()).collect(),
        }
    }

    pub fn to_string(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    /// Current script resolution, if declared.
    pub fn play_res(&self) -> Option<(u32, u32)> {
        let x = self.scalar("PlayResX")?.parse().ok()?;
        let y = self.scalar("PlayResY")?.parse().ok()?;
        Some((x, y))
    }

    /// Set (or insert) the script resolution.
    pub fn set_play_res(&mut self, width: u32, height: u32) {
        self.set_scalar("PlayResX", &width.to_string());
        self.set_scalar("PlayResY", &height.to_string());
    }

    /// Script Info fields rendering depends on; set unconditionally so the
    /// burned/remuxed result matches what the styling assumed.
    pub fn set_render_defaults(&mut self) {
        self.set_scalar("WrapStyle", "0");
        self.set_scalar("ScaledBorderAndShadow", "yes");
        self.set_scalar("YCbCr Matrix", "TV.709");
    }

    /// Apply preset rules to every `Style:` line.
    pub fn apply_style_rules(&mut self, preset: &StylePreset) -> RestyleResult<()> {
        let format = self.style_format()?;

        for rule_field in preset.rules.keys() {
            if !format.iter().any(|f| f.eq_ignore_ascii_case(rule_field)) {
                return Err(RestyleError::UnknownStyleField(rule_field.clone()));
            }
        }

        for line in self.lines.iter_mut() {
            let Some(rest) = line.strip_prefix("Style:") else {
                continue;
            };
            let mut values: Vec<String> =
                rest.trim_start().split(',').map(|v| v.to_string()).collect();
            for (field, rule) in &preset.rules {
                let Some(pos) = format.iter().position(|f| f.eq_ignore_ascii_case(field))
                else {
                    continue;
                };
                if pos >= values.len() {
                    continue;
                }
                values[pos] = apply_rule(field, &values[pos], rule)?;
            }
            *line = format!("Style: {}", values.join(","));
        }
        Ok(())
    }

    /// Drop `Style:` lines whose name no dialogue or comment line uses.
    pub fn prune_unused_styles(&mut self) {
        let used: Vec<String> = self
            .lines
            .iter()
            .filter_map(|l| {
                let rest = l
                    .strip_prefix("Dialogue:")
                    .or_else(|| l.strip_prefix("Comment:"))?;
                // Event format: Layer, Start, End, Style, ...
                rest.split(',').nth(3).map(|s| s.trim().to_string())
            })
            .collect();

        self.lines.retain(|l| {
            let Some(rest) = l.strip_prefix("Style:") else {
                return true;
            };
            let name = rest.split(',').next().unwrap_or("").trim();
            let keep = used.iter().any(|u| u == name);
            if !keep {
                debug!("Dropping unused style `{name}`");
            }
            keep
        });
    }

    /// Field names from the `[V4+ Styles]` format line.
    fn style_format(&self) -> RestyleResult<Vec<String>> {
        let mut in_styles = false;
        for line in &self.lines {
            let trimmed = line.trim();
            if trimmed.starts_with('[') {
                in_styles = trimmed.eq_ignore_ascii_case("[V4+ Styles]")
                    || trimmed.eq_ignore_ascii_case("[V4 Styles]");
                continue;
            }
            if !in_styles {
                continue;
            }
            if let Some(rest) = trimmed.strip_prefix("Format:") {
                return Ok(rest.split(',').map(|f| f.trim().to_string()).collect());
            }
        }
        Err(RestyleError::MissingStylesFormat)
    }

    fn scalar(&self, key: &str) -> Option<&str> {
        let prefix = format!("{key}:");
        self.lines
            .iter()
            .find_map(|l| l.strip_prefix(&prefix))
            .map(|v| v.trim())
    }

    fn set_scalar(&mut self, key: &str, value: &str) {
        let prefix = format!("{key}:");
        let rendered = format!("{key}: {value}");
        if let Some(line) = self.lines.iter_mut().find(|l| l.starts_with(&prefix)) {
            *line = rendered;
            return;
        }
        // Insert right after the [Script Info] header when present.
        let at = self
            .lines
            .iter()
            .position(|l| l.trim().eq_ignore_ascii_case("[Script Info]"))
            .map(|i| i + 1)
            .unwrap_or(0);
        self.lines.insert(at, rendered);
    }
}

fn apply_rule(field: &str, value: &str, rule: &StyleRule) -> RestyleResult<String> {
    match rule {
        StyleRule::Set(replacement) => Ok(replacement.clone()),
        StyleRule::Scale { factor, round } => {
            let numeric: f64 =
                value
                    .trim()
                    .parse()
                    .map_err(|_| RestyleError::NonNumericField {
                        field: field.to_string(),
                        value: value.to_string(),
                    })?;
            let scaled = numeric * factor;
            if *round {
                Ok(format!("{}", scaled.round() as i64))
            } else {
                Ok(format!("{scaled}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StreamProps;
    use std::collections::BTreeMap;

    const SCRIPT: &str = "\
[Script Info]
Title: test
PlayResX: 1280
PlayResY: 720

[V4+ Styles]
Format: Name, Fontname, Fontsize, Outline
Style: Default,Open Sans,48,2
Style: Signs,Other Font,36,1.5
Style: Unused,Arial,20,1

[Events]
Format: Layer, Start, End, Style, Name, Text
Dialogue: 0,0:00:00.00,0:00:05.00,Default,,Hello
Comment: 0,0:00:05.00,0:00:06.00,Signs,,Sign text
";

    #[test]
    fn stream_select_parses_id_and_language() {
        assert_eq!("3".parse::<StreamSelect>().unwrap(), StreamSelect::Id(3));
        assert_eq!(
            "eng".parse::<StreamSelect>().unwrap(),
            StreamSelect::Language("eng".into())
        );
    }

    #[test]
    fn language_select_resolves_against_candidates() {
        let candidates = vec![
            StreamRecord::new(3, StreamProps::new("S_TEXT/ASS").with_language("eng")),
            StreamRecord::new(4, StreamProps::new("S_TEXT/ASS").with_language("enm")),
        ];
        let select = StreamSelect::Language("enm".into());
        assert_eq!(select.resolve(&candidates).unwrap(), Some(4));
        assert!(matches!(
            StreamSelect::Language("ger".into()).resolve(&candidates),
            Err(RestyleError::NoLanguageMatch(_))
        ));
        assert_eq!(StreamSelect::Auto.resolve(&candidates).unwrap(), None);
    }

    #[test]
    fn subtitle_extension_table() {
        assert_eq!(subtitle_extension("S_TEXT/ASS").unwrap(), "ass");
        assert_eq!(subtitle_extension("S_TEXT/UTF8").unwrap(), "srt");
        assert!(matches!(
            subtitle_extension("S_HDMV/PGS"),
            Err(RestyleError::UnsupportedCodec(_))
        ));
    }

    #[test]
    fn play_res_roundtrip() {
        let mut doc = AssDocument::parse(SCRIPT);
        assert_eq!(doc.play_res(), Some((1280, 720)));
        doc.set_play_res(1920, 1080);
        assert_eq!(doc.play_res(), Some((1920, 1080)));
    }

    #[test]
    fn scale_rule_rescales_numeric_fields() {
        let mut doc = AssDocument::parse(SCRIPT);
        let mut rules = BTreeMap::new();
        rules.insert(
            "Fontsize".to_string(),
            StyleRule::Scale {
                factor: 1.5,
                round: true,
            },
        );
        doc.apply_style_rules(&StylePreset { rules }).unwrap();
        let text = doc.to_string();
        assert!(text.contains("Style: Default,Open Sans,72,2"));
        assert!(text.contains("Style: Signs,Other Font,54,1.5"));
    }

    #[test]
    fn set_rule_replaces_verbatim() {
        let mut doc = AssDocument::parse(SCRIPT);
        let mut rules = BTreeMap::new();
        rules.insert("Fontname".to_string(), StyleRule::Set("Lato".into()));
        doc.apply_style_rules(&StylePreset { rules }).unwrap();
        assert!(doc.to_string().contains("Style: Default,Lato,48,2"));
    }

    #[test]
    fn unknown_rule_field_is_rejected() {
        let mut doc = AssDocument::parse(SCRIPT);
        let mut rules = BTreeMap::new();
        rules.insert("Kerning".to_string(), StyleRule::Set("1".into()));
        assert!(matches!(
            doc.apply_style_rules(&StylePreset { rules }),
            Err(RestyleError::UnknownStyleField(_))
        ));
    }

    #[test]
    fn scale_on_text_field_is_rejected() {
        let mut doc = AssDocument::parse(SCRIPT);
        let mut rules = BTreeMap::new();
        rules.insert(
            "Fontname".to_string(),
            StyleRule::Scale {
                factor: 2.0,
                round: false,
            },
        );
        assert!(matches!(
            doc.apply_style_rules(&StylePreset { rules }),
            Err(RestyleError::NonNumericField { .. })
        ));
    }

    #[test]
    fn unused_styles_are_pruned() {
        let mut doc = AssDocument::parse(SCRIPT);
        doc.prune_unused_styles();
        let text = doc.to_string();
        assert!(text.contains("Style: Default,"));
        assert!(text.contains("Style: Signs,"));
        assert!(!text.contains("Style: Unused,"));
    }

    #[test]
    fn render_defaults_are_inserted_into_script_info() {
        let mut doc = AssDocument::parse(SCRIPT);
        doc.set_render_defaults();
        let text = doc.to_string();
        assert!(text.contains("WrapStyle: 0"));
        assert!(text.contains("ScaledBorderAndShadow: yes"));
        assert!(text.contains("YCbCr Matrix: TV.709"));
        // Inserted inside [Script Info], before the styles section.
        let info_pos = text.find("[V4+ Styles]").unwrap();
        assert!(text.find("WrapStyle: 0").unwrap() < info_pos);
    }
}
