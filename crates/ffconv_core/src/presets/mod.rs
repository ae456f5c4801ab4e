//! JSON preset documents.
//!
//! Presets are flat JSON objects mapping ffmpeg flags to values, e.g.
//! `{"-c:v": "libx264", "-crf": "18"}`. Known keys are typed; unknown keys
//! pass through verbatim to the tool argument list, provided they look
//! like flags. Null or empty values are dropped.
//!
//! The subtitle styling preset uses a different shape: style field name to
//! either an absolute replacement value or a `{factor, round}` scale rule.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while loading or validating preset documents.
#[derive(Error, Debug)]
pub enum PresetError {
    #[error("Failed to read preset `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse preset `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Pass-through keys must look like tool flags.
    #[error("Preset key `{key}` is not a valid flag (expected a leading `-`)")]
    InvalidKey { key: String },

    /// Pass-through values must be scalar.
    #[error("Preset key `{key}` has a non-scalar value")]
    InvalidValue { key: String },
}

/// Result type for preset operations.
pub type PresetResult<T> = Result<T, PresetError>;

/// Video encoding preset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoPreset {
    #[serde(rename = "-c:v", default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(rename = "-pix_fmt", default, skip_serializing_if = "Option::is_none")]
    pub pix_fmt: Option<String>,
    #[serde(rename = "-crf", default, skip_serializing_if = "Option::is_none")]
    pub crf: Option<String>,
    #[serde(rename = "-preset", default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,
    #[serde(rename = "-profile:v", default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(rename = "-level:v", default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Unknown flags passed through verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl VideoPreset {
    /// Baseline H.264 preset used when no video preset is supplied.
    pub fn default_h264() -> Self {
        Self {
            codec: Some("libx264".into()),
            pix_fmt: Some("yuv420p".into()),
            crf: Some("18".into()),
            speed: Some("slow".into()),
            profile: Some("high".into()),
            level: Some("4.0".into()),
            extra: BTreeMap::new(),
        }
    }

    /// Flatten into an ordered ffmpeg argument list.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        push_flag(&mut args, "-c:v", &self.codec);
        push_flag(&mut args, "-pix_fmt", &self.pix_fmt);
        push_flag(&mut args, "-crf", &self.crf);
        push_flag(&mut args, "-preset", &self.speed);
        push_flag(&mut args, "-profile:v", &self.profile);
        push_flag(&mut args, "-level:v", &self.level);
        push_extras(&mut args, &self.extra);
        args
    }
}

/// Audio encoding preset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioPreset {
    #[serde(rename = "-c:a", default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(rename = "-strict", default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<String>,
    #[serde(rename = "-ab", default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<String>,
    #[serde(rename = "-ac", default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl AudioPreset {
    /// Baseline AAC re-encode preset.
    pub fn default_aac() -> Self {
        Self {
            codec: Some("aac".into()),
            strict: Some("2".into()),
            bitrate: Some("192k".into()),
            channels: Some("2".into()),
            extra: BTreeMap::new(),
        }
    }

    /// Passthrough preset for sources that are already AAC.
    pub fn aac_copy() -> Self {
        Self {
            codec: Some("copy".into()),
            ..Default::default()
        }
    }

    /// Flatten into an ordered ffmpeg argument list.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        push_flag(&mut args, "-c:a", &self.codec);
        push_flag(&mut args, "-strict", &self.strict);
        push_flag(&mut args, "-ab", &self.bitrate);
        push_flag(&mut args, "-ac", &self.channels);
        push_extras(&mut args, &self.extra);
        args
    }
}

/// How the audio arguments for a batch are decided.
///
/// With no user preset the decision is deferred until the mapped audio
/// codec is known: already-AAC sources are copied, everything else is
/// re-encoded with the baseline preset.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioPolicy {
    /// Pick passthrough or re-encode from the mapped stream's codec.
    Auto,
    /// Use the user-supplied preset unconditionally.
    Preset(AudioPreset),
}

impl AudioPolicy {
    /// Resolve the policy against the selected audio stream's codec id.
    pub fn resolve(&self, codec_id: &str) -> AudioPreset {
        match self {
            AudioPolicy::Preset(p) => p.clone(),
            AudioPolicy::Auto => {
                if codec_id.starts_with("A_AAC") {
                    AudioPreset::aac_copy()
                } else {
                    AudioPreset::default_aac()
                }
            }
        }
    }
}

/// Filter fragments placed around the subtitles filter core.
///
/// Used for colour-space correction when subtitles assume BT.709.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterPreset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

impl FilterPreset {
    /// Fragment to prepend, trimmed of whitespace and trailing commas.
    pub fn before_fragment(&self) -> Option<String> {
        trim_fragment(self.before.as_deref(), true)
    }

    /// Fragment to append, trimmed of whitespace and leading commas.
    pub fn after_fragment(&self) -> Option<String> {
        trim_fragment(self.after.as_deref(), false)
    }
}

fn trim_fragment(raw: Option<&str>, trailing: bool) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    let cleaned = if trailing {
        trimmed.trim_end_matches(',')
    } else {
        trimmed.trim_start_matches(',')
    };
    Some(cleaned.to_string())
}

/// A single styling rule in a subtitle preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleRule {
    /// Multiply the numeric field by `factor`, optionally rounding.
    Scale {
        factor: f64,
        #[serde(default)]
        round: bool,
    },
    /// Replace the field verbatim.
    Set(String),
}

/// Subtitle styling preset: ASS style field name to rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StylePreset {
    pub rules: BTreeMap<String, StyleRule>,
}

/// Load and validate a video preset document.
pub fn load_video_preset(path: &Path) -> PresetResult<VideoPreset> {
    let preset: VideoPreset = load_json(path)?;
    validate_extras(&preset.extra)?;
    Ok(preset)
}

/// Load and validate an audio preset document.
pub fn load_audio_preset(path: &Path) -> PresetResult<AudioPreset> {
    let preset: AudioPreset = load_json(path)?;
    validate_extras(&preset.extra)?;
    Ok(preset)
}

/// Load a filter-fragment preset document.
pub fn load_filter_preset(path: &Path) -> PresetResult<FilterPreset> {
    load_json(path)
}

/// Load a subtitle styling preset document.
pub fn load_style_preset(path: &Path) -> PresetResult<StylePreset> {
    load_json(path)
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> PresetResult<T> {
    let content = fs::read_to_string(path).map_err(|e| PresetError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| PresetError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

fn validate_extras(extra: &BTreeMap<String, Value>) -> PresetResult<()> {
    for (key, value) in extra {
        if !key.starts_with('-') {
            return Err(PresetError::InvalidKey { key: key.clone() });
        }
        if !matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null) {
            return Err(PresetError::InvalidValue { key: key.clone() });
        }
    }
    Ok(())
}

fn push_flag(args: &mut Vec<String>, flag: &str, value: &Option<String>) {
    if let Some(v) = value {
        if !v.is_empty() {
            args.push(flag.to_string());
            args.push(v.clone());
        }
    }
}

fn push_extras(args: &mut Vec<String>, extra: &BTreeMap<String, Value>) {
    for (key, value) in extra {
        let rendered = match value {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => continue, // null and empty values are dropped
        };
        args.push(key.clone());
        args.push(rendered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_video_args_match_baseline() {
        let args = VideoPreset::default_h264().to_args();
        assert_eq!(
            args,
            vec![
                "-c:v", "libx264", "-pix_fmt", "yuv420p", "-crf", "18", "-preset", "slow",
                "-profile:v", "high", "-level:v", "4.0",
            ]
        );
    }

    #[test]
    fn audio_policy_copies_aac_sources() {
        let policy = AudioPolicy::Auto;
        assert_eq!(policy.resolve("A_AAC"), AudioPreset::aac_copy());
        assert_eq!(policy.resolve("A_FLAC"), AudioPreset::default_aac());

        let custom = AudioPolicy::Preset(AudioPreset::default_aac());
        assert_eq!(custom.resolve("A_AAC"), AudioPreset::default_aac());
    }

    #[test]
    fn loads_preset_with_extras() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"-c:v": "libx265", "-crf": "20", "-tune": "animation", "-preset": null}}"#
        )
        .unwrap();

        let preset = load_video_preset(file.path()).unwrap();
        assert_eq!(preset.codec.as_deref(), Some("libx265"));
        assert!(preset.speed.is_none());

        let args = preset.to_args();
        assert!(args.windows(2).any(|w| w == ["-tune", "animation"]));
    }

    #[test]
    fn rejects_non_flag_extras() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"-c:v": "libx264", "tune": "animation"}}"#).unwrap();
        let err = load_video_preset(file.path()).unwrap_err();
        assert!(matches!(err, PresetError::InvalidKey { .. }));
    }

    #[test]
    fn filter_fragments_are_trimmed() {
        let preset = FilterPreset {
            before: Some(" scale=in_color_matrix=bt709, ".into()),
            after: Some(" ,format=yuv420p ".into()),
        };
        assert_eq!(
            preset.before_fragment().as_deref(),
            Some("scale=in_color_matrix=bt709")
        );
        assert_eq!(preset.after_fragment().as_deref(), Some("format=yuv420p"));

        let empty = FilterPreset::default();
        assert!(empty.before_fragment().is_none());
        assert!(empty.after_fragment().is_none());
    }

    #[test]
    fn style_preset_parses_both_shapes() {
        let json = r#"{"Fontsize": {"factor": 1.25, "round": true}, "Fontname": "Open Sans"}"#;
        let preset: StylePreset = serde_json::from_str(json).unwrap();
        assert_eq!(
            preset.rules.get("Fontsize"),
            Some(&StyleRule::Scale {
                factor: 1.25,
                round: true
            })
        );
        assert_eq!(
            preset.rules.get("Fontname"),
            Some(&StyleRule::Set("Open Sans".into()))
        );
    }
}
