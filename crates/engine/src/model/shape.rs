use crate::entity::{CollisionTarget, Entity};
use crate::surface::{Color, Surface, TransformGuard};

/// Solid-colour geometry shared by the square and circle variants.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeModel {
    width: f64,
    height: f64,
    color: Color,
}

impl ShapeModel {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            color: Color::default(),
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn set_color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn set_size(&mut self, width: f64, height: f64) -> &mut Self {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self
    }

    pub(crate) fn render_square(&self, entity: &Entity, surface: &mut dyn Surface) {
        let (x, y) = (entity.x(), entity.y());
        let mut surface =
            TransformGuard::rotated(surface, entity.angle(), x, y, self.width, self.height);
        surface.set_fill_color(self.color);
        surface.fill_rect(x, y, self.width, self.height);
    }

    /// Circles are centred on the entity position and ignore the entity angle.
    pub(crate) fn render_circle(&self, entity: &Entity, surface: &mut dyn Surface) {
        surface.set_fill_color(self.color);
        surface.fill_circle(entity.x(), entity.y(), self.radius());
    }

    pub fn radius(&self) -> f64 {
        self.width / 2.0
    }
}

/// Collision predicate installed by the circle variant: the target's position must lie within
/// the circle's radius of the owner's position.
pub(crate) fn circle_collides(owner: &Entity, target: CollisionTarget<'_>) -> bool {
    target.position().distance(owner.position()) <= owner.model().width() / 2.0
}
