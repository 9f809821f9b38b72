//! Fly-camera controller
//!
//! While the right mouse button is held and the camera is primary:
//! W/S move along `front`, A/D along `right`, Q/E along `up`, and mouse
//! motion turns the camera by a fixed step per frame in the direction of the
//! motion. Backends that flip the mouse-look axes say so through
//! `RendererCapabilities::invert_camera_controls`.

use crate::ecs::components::{Camera, CameraController, Transform};
use crate::ecs::system::{FrameContext, System, SystemError, SystemResult};
use crate::ecs::{Entity, Filter, World};
use crate::foundation::math::{utils::deg_to_rad, Vec2, Vec3};
use crate::platform::{InputState, KeyCode, MouseButton};

/// Degrees per second of mouse-look at sensitivity 1
const LOOK_RATE: f32 = 50.0;

/// Pitch limit in degrees
const PITCH_LIMIT: f32 = 89.0;

/// Drives `Transform`s of entities with a `CameraController` from input
#[derive(Debug, Default)]
pub struct CameraControllerSystem {
    invert_controls: bool,
}

impl CameraControllerSystem {
    /// Create the system
    pub fn new() -> Self {
        Self::default()
    }
}

fn look_step(delta: f32, rate: f32) -> f32 {
    if delta > 0.0 {
        rate
    } else if delta < 0.0 {
        -rate
    } else {
        0.0
    }
}

fn apply_movement(controller: &CameraController, transform: &mut Transform, input: &dyn InputState, delta_time: f32) {
    let velocity = controller.movement_speed * delta_time;
    let bindings = [
        (KeyCode::W, controller.front),
        (KeyCode::S, -controller.front),
        (KeyCode::D, controller.right),
        (KeyCode::A, -controller.right),
        (KeyCode::Q, controller.up),
        (KeyCode::E, -controller.up),
    ];
    let offset: Vec3 = bindings
        .iter()
        .filter(|(key, _)| input.is_key_down(*key))
        .map(|(_, direction)| direction * velocity)
        .sum();
    if offset != Vec3::zeros() {
        transform.set_translation(transform.translation + offset);
    }
}

fn apply_look(controller: &mut CameraController, transform: &mut Transform, delta: Vec2, delta_time: f32, invert: bool) {
    if delta == Vec2::zeros() {
        return;
    }
    let sign = if invert { -1.0 } else { 1.0 };
    let rate = sign * LOOK_RATE * controller.mouse_sensitivity * delta_time;
    let dx = look_step(delta.x, rate);
    let dy = look_step(delta.y, rate);

    controller.yaw += dx;
    controller.pitch = (controller.pitch + dy).clamp(-PITCH_LIMIT, PITCH_LIMIT);

    let (yaw, pitch) = (deg_to_rad(controller.yaw), deg_to_rad(controller.pitch));
    let front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), (-yaw).sin() * pitch.cos());
    controller.front = sign * front.normalize();
    controller.right = sign * controller.front.cross(&-controller.world_up).normalize();
    controller.up = sign * controller.right.cross(&controller.front).normalize();

    transform.set_rotation(transform.rotation + Vec3::new(-dy, dx, 0.0));
}

impl System for CameraControllerSystem {
    fn name(&self) -> &str {
        "CameraControllerSystem"
    }

    fn filter(&self) -> Filter {
        Filter::of::<(CameraController, Camera, Transform)>()
    }

    fn on_create_system(&mut self, _world: &mut World, ctx: &mut FrameContext<'_>) -> SystemResult<()> {
        self.invert_controls = ctx.renderer.capabilities().invert_camera_controls;
        Ok(())
    }

    fn on_update_entity(&mut self, entity: Entity, world: &mut World, ctx: &mut FrameContext<'_>) -> SystemResult<()> {
        let primary = world.get::<Camera>(entity).is_some_and(|camera| camera.primary);
        let (controller, transform) = world
            .get2_mut::<CameraController, Transform>(entity)
            .ok_or(SystemError::MissingComponent {
                entity,
                component: "CameraController/Transform",
            })?;

        let mouse = ctx.input.mouse_position();
        // screen y grows downwards
        let delta = controller
            .previous_mouse
            .map_or_else(Vec2::zeros, |previous| Vec2::new(mouse.x - previous.x, previous.y - mouse.y));
        controller.previous_mouse = Some(mouse);

        if !primary || !ctx.input.is_mouse_button_down(MouseButton::Right) {
            return Ok(());
        }
        let delta_time = ctx.delta_time();
        apply_movement(controller, transform, ctx.input, delta_time);
        apply_look(controller, transform, delta, delta_time, self.invert_controls);
        Ok(())
    }
}
