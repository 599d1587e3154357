use ahash::HashMap;
use glam::Quat;
use scenegraph::{Color, Entity, EntityId, Scene, Shape, UnlitMaterial};
use tracing::info;

use crate::{
    engine::assets::{AssetError, AssetLoader},
    game::config::ConfigLines,
};

/// Location of the pre-authored effect bundle under the data directory.
pub const BUNDLE_FILE: &str = "effects/energy.txt";

/// Templates for the energy blast, loaded once at startup. Template entities live
/// detached under a bundle root; effect runs clone them and never mutate the originals.
pub struct EffectBundle {
    templates: HashMap<String, EntityId>,
    sound: Option<String>,
}

impl EffectBundle {
    pub fn load(loader: &AssetLoader, scene: &mut Scene) -> Result<Self, AssetError> {
        let text = loader.load_text(BUNDLE_FILE)?;
        let bundle = Self::from_text(scene, &text)?;

        info!("Effect bundle loaded: {BUNDLE_FILE}");
        Ok(bundle)
    }

    pub fn from_text(scene: &mut Scene, text: &str) -> Result<Self, AssetError> {
        let root = scene.spawn(Entity::new("energy"));
        let mut templates = HashMap::default();
        let mut sound = None;

        for line in ConfigLines::parse(text).iter() {
            match line.key.as_str() {
                "BUNDLE" => {
                    if let Some(entity) = scene.get_mut(root) {
                        entity.name = line.text(0);
                    }
                }

                "SPHERE" => {
                    let name = line.text(0);
                    let sphere = scene.spawn(
                        Entity::new(name.clone())
                            .with_shape(Shape::Sphere {
                                radius: line.number(1),
                            })
                            .with_material(UnlitMaterial::new(Color::CYAN)),
                    );
                    scene.add_child(root, sphere);
                    templates.insert(name, sphere);
                }

                "CYLINDER" => {
                    let name = line.text(0);
                    let container = scene.spawn(Entity::new(name.clone()));

                    // The usable template is the mesh child, laid on its side.
                    let mesh = scene.spawn(
                        Entity::new(format!("{name}Mesh"))
                            .with_shape(Shape::Cylinder {
                                radius: line.number(1),
                                height: line.number(2),
                            })
                            .with_material(UnlitMaterial::new(Color::WHITE)),
                    );
                    if let Some(entity) = scene.get_mut(mesh) {
                        entity.transform.rotation =
                            Quat::from_rotation_z(-std::f32::consts::FRAC_PI_2);
                    }

                    scene.add_child(root, container);
                    scene.add_child(container, mesh);
                    templates.insert(name, container);
                }

                "SOUND" => {
                    sound = Some(line.text(0));
                }

                key => {
                    tracing::warn!("Invalid key for effect bundle: {key}");
                }
            }
        }

        // Both required templates must resolve by name before any sequence can run.
        for required in ["cylinder", "originSphere"] {
            if scene.find_by_name(root, required).is_none() {
                return Err(AssetError::MissingDefinition(required.into()));
            }
        }

        let bundle = Self { templates, sound };
        if bundle.cylinder_mesh(scene).is_none() {
            return Err(AssetError::MissingDefinition("cylinder".into()));
        }

        Ok(bundle)
    }

    /// Template entity defined under the given name, if any.
    pub fn template(&self, name: &str) -> Option<EntityId> {
        self.templates.get(name).copied()
    }

    /// The projectile sphere template.
    pub fn origin_sphere(&self) -> Option<EntityId> {
        self.template("originSphere")
    }

    /// The beam mesh template: the cylinder definition's mesh child.
    pub fn cylinder_mesh(&self, scene: &Scene) -> Option<EntityId> {
        self.template("cylinder")
            .and_then(|container| scene.children_of(container).first().copied())
    }

    /// Cue resource for the cast, when the bundle names one.
    pub fn sound(&self) -> Option<&str> {
        self.sound.as_deref()
    }
}
