use serde::{Deserialize, Serialize};

pub const DEFAULT_CANVAS_WIDTH: u32 = 720;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 1280;
pub const DEFAULT_TEXT_SIZE: i64 = 30;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TemplateBundle {
    #[serde(default)]
    pub canvas_config: Option<CanvasConfig>,
    #[serde(default)]
    pub materials: Materials,
    #[serde(default)]
    pub mutable_config: MutableConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CanvasConfig {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Materials {
    #[serde(default)]
    pub videos: Vec<VideoMaterial>,
    #[serde(default)]
    pub texts: Vec<TextMaterial>,
    #[serde(default)]
    pub audios: Vec<AudioMaterial>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MutableConfig {
    #[serde(default)]
    pub mutable_materials: Vec<MutableMaterial>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VideoMaterial {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub cover_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MutableMaterial {
    #[serde(default)]
    pub cover_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TextMaterial {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub font_path: Option<String>,
    #[serde(default)]
    pub text_size: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AudioMaterial {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub duration: Option<i64>,
}

impl TemplateBundle {
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        let canvas = self.canvas_config.as_ref();
        (
            canvas
                .and_then(|c| c.width)
                .unwrap_or(DEFAULT_CANVAS_WIDTH),
            canvas
                .and_then(|c| c.height)
                .unwrap_or(DEFAULT_CANVAS_HEIGHT),
        )
    }
}

impl VideoMaterial {
    pub fn path(&self) -> Option<&str> {
        non_empty(&self.path)
    }

    pub fn cover_path(&self) -> Option<&str> {
        non_empty(&self.cover_path)
    }
}

impl MutableMaterial {
    pub fn cover_path(&self) -> Option<&str> {
        non_empty(&self.cover_path)
    }
}

impl TextMaterial {
    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    pub fn font_path(&self) -> Option<&str> {
        non_empty(&self.font_path)
    }

    pub fn text_size(&self) -> i64 {
        self.text_size.unwrap_or(DEFAULT_TEXT_SIZE)
    }
}

impl AudioMaterial {
    pub fn source(&self) -> Option<&str> {
        non_empty(&self.path).or_else(|| non_empty(&self.url))
    }

    pub fn duration_raw(&self) -> i64 {
        self.duration.unwrap_or(0)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}
