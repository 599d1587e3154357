use crate::Transform;

/// Linear RGBA color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const CYAN: Self = Self::rgb(0.0, 1.0, 1.0);
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    pub const PURPLE: Self = Self::rgb(0.5, 0.0, 0.5);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

/// Flat color material, not affected by lighting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnlitMaterial {
    pub color: Color,
}

impl UnlitMaterial {
    pub const fn new(color: Color) -> Self {
        Self { color }
    }
}

/// Omnidirectional light source.
#[derive(Clone, Copy, Debug)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
    pub attenuation_radius: f32,
}

#[derive(Clone, Copy, Debug)]
pub enum Shape {
    Sphere { radius: f32 },
    Cylinder { radius: f32, height: f32 },
}

/// A node in the scene hierarchy. Parent/child links are managed by [crate::Scene].
#[derive(Clone, Debug)]
pub struct Entity {
    pub name: String,
    pub transform: Transform,
    pub enabled: bool,
    pub shape: Option<Shape>,
    pub material: Option<UnlitMaterial>,
    pub light: Option<PointLight>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
            enabled: true,
            shape: None,
            material: None,
            light: None,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn with_material(mut self, material: UnlitMaterial) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_light(mut self, light: PointLight) -> Self {
        self.light = Some(light);
        self
    }
}
