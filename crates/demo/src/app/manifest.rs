use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tickscene::{
    Color, EntityData, EntityError, ImageModel, Model, SceneConfig, ShapeModel, TextAlign,
    TextModel, Vector2,
};

const DEFAULT_MANIFEST: &str = include_str!("../../assets/default_scene.json");
const DEFAULT_TEXT_PIXELS: f64 = 10.0;

#[derive(Debug, Error)]
pub(crate) enum ManifestError {
    #[error("failed to read scene manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse scene manifest: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },
    #[error("parse scene manifest at {path}: {source}")]
    ParseAt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid entity in scene manifest: {0}")]
    Entity(#[from] EntityError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SceneManifest {
    #[serde(default)]
    pub(crate) window: WindowSpec,
    #[serde(default)]
    pub(crate) scene: SceneConfig,
    /// Relative image URLs resolve against this directory.
    #[serde(default)]
    pub(crate) asset_dir: Option<PathBuf>,
    #[serde(default)]
    pub(crate) entities: Vec<EntitySpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WindowSpec {
    pub(crate) title: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            title: "tickscene demo".to_string(),
            width: 480,
            height: 320,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct EntitySpec {
    #[serde(default)]
    pub(crate) x: f64,
    #[serde(default)]
    pub(crate) y: f64,
    #[serde(default)]
    pub(crate) motion: Vector2,
    #[serde(default)]
    pub(crate) angle: f64,
    #[serde(default)]
    pub(crate) priority: Option<i32>,
    pub(crate) model: ModelSpec,
    #[serde(default)]
    pub(crate) behavior: Option<BehaviorSpec>,
    /// Keeps every move of the entity inside the window.
    #[serde(default)]
    pub(crate) confine: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub(crate) enum ModelSpec {
    Square {
        width: f64,
        height: f64,
        #[serde(default)]
        color: Color,
    },
    Circle {
        radius: f64,
        #[serde(default)]
        color: Color,
    },
    Image {
        width: f64,
        height: f64,
        url: String,
    },
    Text {
        text: String,
        #[serde(default = "default_text_pixels")]
        pixels: f64,
        #[serde(default)]
        font: Option<String>,
        #[serde(default)]
        color: Color,
        #[serde(default)]
        align: Option<TextAlign>,
        #[serde(default)]
        max_width: Option<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum BehaviorSpec {
    Drift { impulse: Vector2 },
    Spin { degrees_per_tick: f64 },
    TickCounter { prefix: String },
}

fn default_text_pixels() -> f64 {
    DEFAULT_TEXT_PIXELS
}

impl ModelSpec {
    pub(crate) fn to_model(&self) -> Model {
        match self {
            ModelSpec::Square {
                width,
                height,
                color,
            } => Model::Square(ShapeModel::new(*width, *height).with_color(*color)),
            ModelSpec::Circle { radius, color } => {
                Model::Circle(ShapeModel::new(radius * 2.0, radius * 2.0).with_color(*color))
            }
            ModelSpec::Image { width, height, url } => {
                Model::Image(ImageModel::new(*width, *height).with_url(url.clone()))
            }
            ModelSpec::Text {
                text,
                pixels,
                font,
                color,
                align,
                max_width,
            } => {
                let mut model = TextModel::new(text.clone())
                    .with_pixels(*pixels)
                    .with_color(*color);
                if let Some(font) = font {
                    model.set_font(font.clone());
                }
                if let Some(align) = align {
                    model.set_align(*align);
                }
                model.set_max_width(*max_width);
                Model::Text(model)
            }
        }
    }
}

impl EntitySpec {
    pub(crate) fn to_entity_data(&self) -> EntityData {
        EntityData::new()
            .with_x(self.x)
            .with_y(self.y)
            .with_motion(self.motion)
            .with_angle(self.angle)
            .with_model(self.model.to_model())
    }
}

impl SceneManifest {
    pub(crate) fn builtin() -> Result<Self, ManifestError> {
        let mut manifest = parse_manifest_json(DEFAULT_MANIFEST)?;
        if manifest.asset_dir.is_none() {
            manifest.asset_dir = Some(Path::new(env!("CARGO_MANIFEST_DIR")).join("assets"));
        }
        Ok(manifest)
    }

    /// Reads a manifest file. Relative asset directories resolve against the file's directory,
    /// which is also the default asset directory.
    pub(crate) fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let raw = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut manifest = parse_manifest_json(&raw)?;
        let manifest_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        manifest.asset_dir = Some(match manifest.asset_dir.take() {
            Some(dir) if dir.is_relative() => manifest_dir.join(dir),
            Some(dir) => dir,
            None => manifest_dir,
        });
        Ok(manifest)
    }
}

pub(crate) fn parse_manifest_json(raw: &str) -> Result<SceneManifest, ManifestError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, SceneManifest>(&mut deserializer) {
        Ok(manifest) => Ok(manifest),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(ManifestError::Parse { source })
            } else {
                Err(ManifestError::ParseAt { path, source })
            }
        }
    }
}
