mod image;
mod shape;
mod text;

use serde::{Deserialize, Serialize};

use crate::entity::{CollisionTarget, Entity};
use crate::images::ImageLoader;
use crate::surface::Surface;

pub use image::ImageModel;
pub use shape::ShapeModel;
pub use text::{GlyphMetrics, TextMetrics, TextModel};

/// Overrides the default box test when an entity's model supplies one.
pub type CollisionPredicate = fn(&Entity, CollisionTarget<'_>) -> bool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Square,
    Circle,
    Image,
    Text,
}

/// How an entity looks and how big it is.
///
/// Each entity owns its model. `render` only draws; it never moves the entity.
#[derive(Debug, Clone)]
pub enum Model {
    Square(ShapeModel),
    Circle(ShapeModel),
    Image(ImageModel),
    Text(TextModel),
}

impl Model {
    pub fn square(width: f64, height: f64) -> Self {
        Model::Square(ShapeModel::new(width, height))
    }

    pub fn circle(radius: f64) -> Self {
        Model::Circle(ShapeModel::new(radius * 2.0, radius * 2.0))
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Model::Square(_) => ModelKind::Square,
            Model::Circle(_) => ModelKind::Circle,
            Model::Image(_) => ModelKind::Image,
            Model::Text(_) => ModelKind::Text,
        }
    }

    pub fn width(&self) -> f64 {
        match self {
            Model::Square(shape) | Model::Circle(shape) => shape.width(),
            Model::Image(image) => image.width(),
            Model::Text(text) => text.width(),
        }
    }

    pub fn height(&self) -> f64 {
        match self {
            Model::Square(shape) | Model::Circle(shape) => shape.height(),
            Model::Image(image) => image.height(),
            Model::Text(text) => text.height(),
        }
    }

    pub fn collision_predicate(&self) -> Option<CollisionPredicate> {
        match self {
            Model::Circle(_) => Some(shape::circle_collides),
            Model::Square(_) | Model::Image(_) | Model::Text(_) => None,
        }
    }

    pub fn render(&self, entity: &Entity, surface: &mut dyn Surface, images: &dyn ImageLoader) {
        match self {
            Model::Square(shape) => shape.render_square(entity, surface),
            Model::Circle(shape) => shape.render_circle(entity, surface),
            Model::Image(image) => image.render(entity, surface, images),
            Model::Text(text) => text.render(entity, surface),
        }
    }
}

impl From<ImageModel> for Model {
    fn from(image: ImageModel) -> Self {
        Model::Image(image)
    }
}

impl From<TextModel> for Model {
    fn from(text: TextModel) -> Self {
        Model::Text(text)
    }
}
