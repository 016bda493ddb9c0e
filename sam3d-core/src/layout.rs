//! Checkpoint layouts and weight-file formats.
//!
//! Two on-disk layouts are recognized:
//!
//! ```text
//! structured                flat
//! <root>/hf/pipeline.yaml   <root>/*.pth
//! <root>/hf/config.json
//! <root>/hf/*.safetensors|*.bin|*.pth
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Subdirectory holding the structured layout.
pub const STRUCTURED_DIR: &str = "hf";
/// Pipeline descriptor, required by the structured layout.
pub const PIPELINE_FILE: &str = "pipeline.yaml";
/// Model config, optional in the structured layout.
pub const CONFIG_FILE: &str = "config.json";
/// Name reported as missing when the structured layout has no weight file at all.
pub const CANONICAL_WEIGHT_FILE: &str = "model.safetensors";

/// Weight file formats accepted as checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightKind {
    SafeTensors,
    Bin,
    Pth,
}

impl WeightKind {
    /// Preference order inside the structured layout. First match wins.
    pub const PREFERENCE: [WeightKind; 3] = [Self::SafeTensors, Self::Bin, Self::Pth];

    /// The only kind recognized loose at the checkpoint root.
    pub const FLAT: WeightKind = Self::Pth;

    pub fn extension(self) -> &'static str {
        match self {
            Self::SafeTensors => "safetensors",
            Self::Bin => "bin",
            Self::Pth => "pth",
        }
    }

    /// Detect the weight kind from a file extension. Matching is case-sensitive.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("safetensors") => Some(Self::SafeTensors),
            Some("bin") => Some(Self::Bin),
            Some("pth") => Some(Self::Pth),
            _ => None,
        }
    }
}

impl fmt::Display for WeightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.extension())
    }
}

/// The layout matched by discovery, with the files that make it up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum LayoutFormat {
    Structured {
        pipeline_file: PathBuf,
        config_file: Option<PathBuf>,
        weight_file: PathBuf,
    },
    Flat {
        weight_file: PathBuf,
    },
    NotFound,
}

impl LayoutFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Structured { .. } => "structured",
            Self::Flat { .. } => "flat",
            Self::NotFound => "not found",
        }
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, Self::NotFound)
    }

    /// Primary weight file, if a layout matched.
    pub fn weight_file(&self) -> Option<&Path> {
        match self {
            Self::Structured { weight_file, .. } | Self::Flat { weight_file } => {
                Some(weight_file.as_path())
            }
            Self::NotFound => None,
        }
    }
}

impl fmt::Display for LayoutFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_kind_from_path() {
        assert_eq!(
            WeightKind::from_path(Path::new("hf/model.safetensors")),
            Some(WeightKind::SafeTensors)
        );
        assert_eq!(
            WeightKind::from_path(Path::new("pytorch_model.bin")),
            Some(WeightKind::Bin)
        );
        assert_eq!(
            WeightKind::from_path(Path::new("sam3d.pth")),
            Some(WeightKind::Pth)
        );
        assert_eq!(WeightKind::from_path(Path::new("model.PTH")), None);
        assert_eq!(WeightKind::from_path(Path::new("model.gguf")), None);
        assert_eq!(WeightKind::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_preference_order() {
        let exts: Vec<_> = WeightKind::PREFERENCE
            .iter()
            .map(|k| k.extension())
            .collect();
        assert_eq!(exts, ["safetensors", "bin", "pth"]);
        assert_eq!(WeightKind::FLAT, WeightKind::Pth);
    }

    #[test]
    fn test_layout_serializes_with_format_tag() {
        let layout = LayoutFormat::Flat {
            weight_file: PathBuf::from("ckpt/a.pth"),
        };
        let json = serde_json::to_value(&layout).unwrap();
        assert_eq!(json["format"], "flat");
        assert_eq!(json["weight_file"], "ckpt/a.pth");

        let json = serde_json::to_value(LayoutFormat::NotFound).unwrap();
        assert_eq!(json["format"], "not_found");
    }

    #[test]
    fn test_weight_file_accessor() {
        let layout = LayoutFormat::Structured {
            pipeline_file: PathBuf::from("hf/pipeline.yaml"),
            config_file: None,
            weight_file: PathBuf::from("hf/model.bin"),
        };
        assert_eq!(layout.weight_file(), Some(Path::new("hf/model.bin")));
        assert!(layout.is_found());
        assert_eq!(LayoutFormat::NotFound.weight_file(), None);
        assert!(!LayoutFormat::NotFound.is_found());
    }
}
