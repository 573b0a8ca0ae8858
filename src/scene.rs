use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Default for Scale {
    fn default() -> Self {
        Self { x: 1.0, y: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    Cover,
    Video,
    Mutable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font: String,
    #[serde(rename = "fontSize")]
    pub font_size: i64,
    #[serde(rename = "textAlign")]
    pub text_align: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AudioMetadata {
    pub start: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SceneElement {
    Image {
        uri: String,
        source: ImageSource,
        origin_path: String,
        position: Position,
        scale: Scale,
    },
    Text {
        text: String,
        position: Position,
        scale: Scale,
        style: TextStyle,
    },
    Audio {
        uri: String,
        duration: f64,
        position: Position,
        scale: Scale,
        metadata: AudioMetadata,
    },
}

impl SceneElement {
    pub fn kind(&self) -> &'static str {
        match self {
            SceneElement::Image { .. } => "image",
            SceneElement::Text { .. } => "text",
            SceneElement::Audio { .. } => "audio",
        }
    }

    pub fn position(&self) -> Position {
        match self {
            SceneElement::Image { position, .. }
            | SceneElement::Text { position, .. }
            | SceneElement::Audio { position, .. } => *position,
        }
    }
}

/// Children are always images, then texts, then audios; editors rely on this
/// for z-order and reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub width: u32,
    pub height: u32,
    pub children: Vec<SceneElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneFile {
    pub scene: SceneNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneNodeType {
    Scene,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    #[serde(rename = "type")]
    pub node_type: SceneNodeType,
    #[serde(flatten)]
    pub document: SceneDocument,
}

impl SceneDocument {
    pub fn into_file(self) -> SceneFile {
        SceneFile {
            scene: SceneNode {
                node_type: SceneNodeType::Scene,
                document: self,
            },
        }
    }

    pub fn to_json_pretty(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(&self.clone().into_file())
    }
}
