use std::collections::HashSet;
use std::fs;

use camino::Utf8Path;
use tracing::{debug, info};

use crate::error::BridgeError;
use crate::scene::{
    AudioMetadata, ImageSource, Position, Scale, SceneDocument, SceneElement, TextStyle,
};
use crate::store::Store;
use crate::template::TemplateBundle;

/// Source durations are integers in units of 10 microseconds.
pub const DURATION_UNIT_SECONDS: f64 = 1e-5;

const COVER_SEGMENT: &str = "video/cover/";
const VIDEO_PREFIX: &str = "video/";
const IMAGE_STEP_X: i64 = 50;
const IMAGE_Y: i64 = 100;
const TEXT_X: i64 = 100;
const TEXT_BASE_Y: i64 = 300;
const TEXT_STEP_Y: i64 = 100;

struct RawImage<'a> {
    source: ImageSource,
    origin_path: &'a str,
}

pub fn convert(bundle: &TemplateBundle, base_path: &str) -> SceneDocument {
    let (width, height) = bundle.canvas_size();

    let mut children = image_blocks(bundle, base_path);
    children.extend(text_blocks(bundle, base_path));
    children.extend(audio_blocks(bundle, base_path));

    SceneDocument {
        width,
        height,
        children,
    }
}

pub fn convert_file(
    input: &Utf8Path,
    output: &Utf8Path,
    base_path: &str,
) -> Result<SceneDocument, BridgeError> {
    let content = fs::read_to_string(input.as_std_path())
        .map_err(|err| BridgeError::Conversion(format!("read {input}: {err}")))?;
    let bundle = TemplateBundle::from_json(&content)
        .map_err(|err| BridgeError::Conversion(format!("parse {input}: {err}")))?;

    let document = convert(&bundle, base_path);
    let bytes = document
        .to_json_pretty()
        .map_err(|err| BridgeError::Conversion(err.to_string()))?;
    Store::write_bytes_atomic(output, &bytes)?;

    info!(
        output = %output,
        children = document.children.len(),
        "converted scene file saved"
    );
    Ok(document)
}

fn image_blocks(bundle: &TemplateBundle, base_path: &str) -> Vec<SceneElement> {
    let videos = &bundle.materials.videos;

    let cover_stems: HashSet<&str> = videos
        .iter()
        .filter_map(|video| video.cover_path())
        .filter(|path| normalize(path).contains(COVER_SEGMENT))
        .map(file_stem)
        .collect();

    let mut raw = Vec::new();
    for video in videos {
        if let Some(path) = video.cover_path() {
            raw.push(RawImage {
                source: ImageSource::Cover,
                origin_path: path,
            });
        }
        if let Some(path) = video.path() {
            raw.push(RawImage {
                source: ImageSource::Video,
                origin_path: path,
            });
        }
    }
    for material in &bundle.mutable_config.mutable_materials {
        if let Some(path) = material.cover_path() {
            raw.push(RawImage {
                source: ImageSource::Mutable,
                origin_path: path,
            });
        }
    }

    raw.into_iter()
        .filter(|block| {
            let duplicate = block.source == ImageSource::Video
                && normalize(block.origin_path).starts_with(VIDEO_PREFIX)
                && cover_stems.contains(file_stem(block.origin_path));
            if duplicate {
                debug!(path = block.origin_path, "skipping video frame already present as cover");
            }
            !duplicate
        })
        .enumerate()
        .map(|(rank, block)| SceneElement::Image {
            uri: asset_uri(base_path, block.origin_path),
            source: block.source,
            origin_path: block.origin_path.to_string(),
            position: Position {
                x: IMAGE_STEP_X * (rank as i64 + 1),
                y: IMAGE_Y,
            },
            scale: Scale::default(),
        })
        .collect()
}

fn text_blocks(bundle: &TemplateBundle, base_path: &str) -> Vec<SceneElement> {
    bundle
        .materials
        .texts
        .iter()
        .enumerate()
        .filter_map(|(index, material)| {
            let text = strip_brackets(material.content());
            if text.is_empty() {
                return None;
            }
            let font = material
                .font_path()
                .map(|font| asset_uri(base_path, font))
                .unwrap_or_default();
            Some(SceneElement::Text {
                text: text.to_string(),
                position: Position {
                    x: TEXT_X,
                    y: TEXT_BASE_Y + TEXT_STEP_Y * index as i64,
                },
                scale: Scale::default(),
                style: TextStyle {
                    font,
                    font_size: material.text_size(),
                    text_align: "center".to_string(),
                },
            })
        })
        .collect()
}

fn audio_blocks(bundle: &TemplateBundle, base_path: &str) -> Vec<SceneElement> {
    bundle
        .materials
        .audios
        .iter()
        .filter_map(|material| {
            let source = material.source()?;
            Some(SceneElement::Audio {
                uri: asset_uri(base_path, source),
                duration: material.duration_raw() as f64 * DURATION_UNIT_SECONDS,
                position: Position::default(),
                scale: Scale::default(),
                metadata: AudioMetadata { start: 0 },
            })
        })
        .collect()
}

fn asset_uri(base_path: &str, relative: &str) -> String {
    format!("{base_path}/{relative}")
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

fn file_stem(path: &str) -> &str {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let leading_dots = name.len() - name.trim_start_matches('.').len();
    match name[leading_dots..].rfind('.') {
        Some(dot) => &name[..leading_dots + dot],
        None => name,
    }
}

fn strip_brackets(content: &str) -> &str {
    let content = content.strip_prefix('[').unwrap_or(content);
    content.strip_suffix(']').unwrap_or(content)
}
