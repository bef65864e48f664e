use crate::game_logic::clock::Sun;
use bevy::pbr::{DistanceFog, FogFalloff};
use bevy::prelude::*;

const CHASE_DISTANCE: f32 = 9.0;
const CHASE_HEIGHT: f32 = 4.0;
const POSITION_SMOOTHING: f32 = 4.0;
const LOOK_AHEAD: f32 = 6.0;

/// Whatever the chase camera should follow. Exactly one entity carries this.
#[derive(Component)]
pub struct CameraTarget;

pub fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, CHASE_HEIGHT, -CHASE_DISTANCE).looking_at(Vec3::ZERO, Vec3::Y),
        DistanceFog {
            color: Color::srgb(0.45, 0.70, 0.95),
            falloff: FogFalloff::Linear {
                start: 180.0,
                end: 420.0,
            },
            ..default()
        },
    ));

    commands.spawn((
        Sun,
        DirectionalLight {
            illuminance: 80_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_rotation_x(-0.9)),
    ));
}

/// Smoothed chase follow: sit behind and above the target, look past it.
pub fn follow_camera(
    time: Res<Time>,
    target: Single<&Transform, (With<CameraTarget>, Without<Camera3d>)>,
    mut camera: Single<&mut Transform, With<Camera3d>>,
) {
    let back = target.back().as_vec3();
    let flat_back = Vec3::new(back.x, 0.0, back.z).normalize_or_zero();
    let desired = target.translation + flat_back * CHASE_DISTANCE + Vec3::Y * CHASE_HEIGHT;

    let alpha = (POSITION_SMOOTHING * time.delta_secs()).min(1.0);
    camera.translation = camera.translation.lerp(desired, alpha);

    let look_at = target.translation + target.forward().as_vec3() * LOOK_AHEAD;
    camera.look_at(look_at, Vec3::Y);
}
