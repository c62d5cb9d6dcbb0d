use serde::{Deserialize, Serialize};

/// Video generation models known to the generator view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoModel {
    #[default]
    Veo31Fast,
    Veo31,
}

impl VideoModel {
    /// Model name for display in UI
    pub fn name(&self) -> &str {
        match self {
            Self::Veo31Fast => "Veo 3.1 Fast",
            Self::Veo31 => "Veo 3.1",
        }
    }

    /// Model ID for API communication
    pub fn id(&self) -> &str {
        match self {
            Self::Veo31Fast => "veo-3.1-fast-generate-preview",
            Self::Veo31 => "veo-3.1-generate-preview",
        }
    }

    /// Estimated generation time in seconds
    pub fn estimated_time_secs(&self) -> u32 {
        match self {
            Self::Veo31Fast => 60,
            Self::Veo31 => 120,
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::all().into_iter().find(|m| m.id() == id)
    }

    /// All available models
    pub fn all() -> [VideoModel; 2] {
        [Self::Veo31Fast, Self::Veo31]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    /// Wire value understood by the generation service
    pub fn id(&self) -> &str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Landscape => "Landscape (16:9)",
            Self::Portrait => "Portrait (9:16)",
        }
    }

    pub fn all() -> [AspectRatio; 2] {
        [Self::Landscape, Self::Portrait]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Resolution {
    #[default]
    #[serde(rename = "720p")]
    Hd,
    #[serde(rename = "1080p")]
    FullHd,
}

impl Resolution {
    pub fn id(&self) -> &str {
        match self {
            Self::Hd => "720p",
            Self::FullHd => "1080p",
        }
    }

    pub fn all() -> [Resolution; 2] {
        [Self::Hd, Self::FullHd]
    }
}
