//! # Scene Manager
//!
//! Holds every loaded scene and forwards frames to the active one.

use log::{debug, info};

use super::{Scene, SceneError, SceneResult};
use crate::ecs::components::Camera;
use crate::ecs::{Entity, FrameContext, SystemResult};
use crate::render::backend::Renderer;

/// Loaded scenes plus the index of the active one
#[derive(Default)]
pub struct SceneManager {
    scenes: Vec<Scene>,
    active: Option<usize>,
}

impl SceneManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scene; the first one added becomes active
    pub fn add_scene(&mut self, scene: Scene) -> usize {
        self.scenes.push(scene);
        let index = self.scenes.len() - 1;
        if self.active.is_none() {
            self.active = Some(index);
        }
        index
    }

    /// Activate a scene by index
    pub fn change_scene(&mut self, index: usize) -> SceneResult<()> {
        let scene = self
            .scenes
            .get(index)
            .ok_or_else(|| SceneError::SceneNotFound(index.to_string()))?;
        info!("Switching to scene '{}'", scene.name());
        self.active = Some(index);
        Ok(())
    }

    /// Activate a scene by name
    pub fn change_scene_by_name(&mut self, name: &str) -> SceneResult<()> {
        let index = self
            .scenes
            .iter()
            .position(|scene| scene.name() == name)
            .ok_or_else(|| SceneError::SceneNotFound(name.to_string()))?;
        self.change_scene(index)
    }

    /// Number of loaded scenes
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Scene by index
    pub fn scene(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index)
    }

    /// Active scene
    pub fn active_scene(&self) -> Option<&Scene> {
        self.active.and_then(|index| self.scenes.get(index))
    }

    /// Active scene, mutably
    pub fn active_scene_mut(&mut self) -> Option<&mut Scene> {
        self.active.and_then(|index| self.scenes.get_mut(index))
    }

    /// Primary camera of the active scene
    pub fn get_main_camera(&self) -> Option<&Camera> {
        self.active_scene().and_then(Scene::main_camera)
    }

    /// Entity of the active scene's primary camera
    pub fn get_main_camera_entity(&self) -> Option<Entity> {
        self.active_scene().and_then(Scene::main_camera_entity)
    }

    /// Free the batches of every loaded scene, active or not
    pub fn release_batches(&mut self, renderer: &mut dyn Renderer) -> usize {
        let mut released = 0;
        for scene in &mut self.scenes {
            let count = scene.release_batches(renderer);
            debug!("Released {count} batches of scene '{}'", scene.name());
            released += count;
        }
        released
    }

    /// Run one frame of the active scene; no-op without one
    pub fn update(&mut self, ctx: &mut FrameContext<'_>) -> SystemResult<()> {
        match self.active_scene_mut() {
            Some(scene) => scene.update(ctx),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_scene_becomes_active() {
        let mut manager = SceneManager::new();
        assert!(manager.active_scene().is_none());
        manager.add_scene(Scene::new("menu"));
        manager.add_scene(Scene::new("level"));
        assert_eq!(manager.active_scene().map(Scene::name), Some("menu"));

        manager.change_scene_by_name("level").unwrap();
        assert_eq!(manager.active_scene().map(Scene::name), Some("level"));
        assert!(matches!(manager.change_scene(5), Err(SceneError::SceneNotFound(_))));
    }

    #[test]
    fn test_main_camera_comes_from_active_scene() {
        let mut manager = SceneManager::new();
        let mut scene = Scene::new("main");
        let camera = scene.enroll_entity();
        scene.add_component(camera, Camera::default().with_primary(true)).unwrap();
        manager.add_scene(scene);
        manager.add_scene(Scene::new("empty"));

        assert_eq!(manager.get_main_camera_entity(), Some(camera));
        manager.change_scene(1).unwrap();
        assert!(manager.get_main_camera().is_none());
    }
}
