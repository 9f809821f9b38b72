//! Light aggregation
//!
//! Every `Light` with a `Transform` contributes one sample positioned at the
//! transform's world translation. The color pass and the shadow pass share
//! the same aggregation, so the light limit applies to both.

use crate::ecs::components::{Light, Transform};
use crate::ecs::{Filter, World};
use crate::foundation::math::Vec3;
use crate::render::resources::MaterialInstance;
use crate::render::uniforms::UniformValue;
use crate::render::{RenderError, RenderResult};

/// Maximum number of lights the shaders accept
pub const MAX_LIGHTS: usize = 16;

/// One light resolved for the current frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    /// World-space position
    pub position: Vec3,
    /// Linear RGB color
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
}

/// Lights of one frame, in ascending entity order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightSet {
    samples: Vec<LightSample>,
}

impl LightSet {
    /// Resolved samples
    pub fn samples(&self) -> &[LightSample] {
        &self.samples
    }

    /// Number of lights
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the scene has no lights
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Stage the light uniforms on a material
    ///
    /// `u_LightCount` is always staged; the arrays only when lights exist.
    pub fn stage(&self, material: &mut MaterialInstance) {
        let count = i32::try_from(self.samples.len()).unwrap_or(i32::MAX);
        material.set_uniform("u_LightCount", UniformValue::Int(count));
        if self.samples.is_empty() {
            return;
        }
        material.set_uniform(
            "u_LightPositions",
            UniformValue::Vec3Array(self.samples.iter().map(|light| light.position).collect()),
        );
        material.set_uniform(
            "u_LightColors",
            UniformValue::Vec3Array(self.samples.iter().map(|light| light.color).collect()),
        );
        material.set_uniform(
            "u_LightIntensities",
            UniformValue::FloatArray(self.samples.iter().map(|light| light.intensity).collect()),
        );
    }
}

/// Gather every light of the world
///
/// More than [`MAX_LIGHTS`] lights is a scene configuration error.
pub fn collect_lights(world: &World) -> RenderResult<LightSet> {
    let entities = world.query(&Filter::of::<(Light, Transform)>());
    if entities.len() > MAX_LIGHTS {
        return Err(RenderError::LightLimitExceeded {
            count: entities.len(),
            max: MAX_LIGHTS,
        });
    }

    let samples = entities
        .into_iter()
        .filter_map(|entity| {
            let light = world.get::<Light>(entity)?;
            let transform = world.get::<Transform>(entity)?;
            Some(LightSample {
                position: transform.world_position(),
                color: light.color,
                intensity: light.intensity,
            })
        })
        .collect();
    Ok(LightSet { samples })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{Light, Transform};
    use approx::assert_relative_eq;

    fn world_with_lights(count: usize) -> World {
        let mut world = World::new();
        world.register_component::<Light>();
        world.register_component::<Transform>();
        for i in 0..count {
            let entity = world.enroll_entity();
            let mut transform = Transform::from_translation(Vec3::new(i as f32, 2.0, 0.0));
            transform.resolve(None);
            world.add_component(entity, transform).unwrap();
            world.add_component(entity, Light::default()).unwrap();
        }
        world
    }

    #[test]
    fn test_positions_come_from_world_matrix() {
        let world = world_with_lights(2);
        let lights = collect_lights(&world).unwrap();
        assert_eq!(lights.len(), 2);
        assert_relative_eq!(lights.samples()[1].position, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_limit_is_inclusive() {
        assert_eq!(collect_lights(&world_with_lights(MAX_LIGHTS)).unwrap().len(), MAX_LIGHTS);
        let result = collect_lights(&world_with_lights(MAX_LIGHTS + 1));
        assert!(matches!(result, Err(RenderError::LightLimitExceeded { count: 17, max: 16 })));
    }

    #[test]
    fn test_light_without_transform_is_ignored() {
        let mut world = world_with_lights(1);
        let loose = world.enroll_entity();
        world.add_component(loose, Light::default()).unwrap();
        assert_eq!(collect_lights(&world).unwrap().len(), 1);
    }
}
