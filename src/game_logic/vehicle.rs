use crate::game_logic::constants::*;
use crate::game_logic::gearbox::Gearbox;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

/// Chassis parameters. Tuning upgrades rewrite these in place.
#[derive(Clone, Debug)]
pub struct CarStats {
    pub name: &'static str,
    pub engine_force: f32,
    pub max_speed_kmh: f32,
    /// steering response multiplier
    pub handling: f32,
    pub fuel_capacity: f32,
    pub nitro_capacity: f32,
    pub nitro_regen: f32,
    /// braking strength multiplier
    pub brake_grip: f32,
    pub mass: f32,
}

impl Default for CarStats {
    fn default() -> Self {
        Self {
            name: "Cruiser",
            engine_force: ENGINE_FORCE,
            max_speed_kmh: 180.0,
            handling: 1.0,
            fuel_capacity: 100.0,
            nitro_capacity: 100.0,
            nitro_regen: 10.0,
            brake_grip: 1.0,
            mass: 1200.0,
        }
    }
}

impl CarStats {
    pub fn catalog() -> Vec<CarStats> {
        vec![
            CarStats::default(),
            CarStats {
                name: "Falcon GT",
                engine_force: ENGINE_FORCE * 1.2,
                max_speed_kmh: 220.0,
                handling: 0.9,
                fuel_capacity: 80.0,
                mass: 1100.0,
                ..CarStats::default()
            },
            CarStats {
                name: "Brute",
                engine_force: ENGINE_FORCE * 1.1,
                max_speed_kmh: 150.0,
                handling: 0.8,
                fuel_capacity: 130.0,
                brake_grip: 1.2,
                mass: 1700.0,
                ..CarStats::default()
            },
        ]
    }

    /// Chassis selection via OPEN_ROADS_CAR; unknown names fall back to the
    /// first catalog entry.
    pub fn from_env() -> CarStats {
        let Ok(wanted) = std::env::var("OPEN_ROADS_CAR") else {
            return CarStats::default();
        };
        Self::catalog()
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(&wanted))
            .unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EngineState {
    Off,
    /// Crank time left before the engine catches.
    Starting { remaining: f32 },
    Running,
}

#[derive(Component)]
pub struct Vehicle {
    pub stats: CarStats,
    pub engine: EngineState,
    pub gearbox: Gearbox,
    /// current steering angle, radians, positive left
    pub steer: f32,
    pub fuel: f32,
    pub health: f32,
    pub nitro: f32,
    pub nitro_active: bool,
    pub drifting: bool,
    pub damage_cooldown: f32,
    /// meters driven, for score and missions
    pub odometer: f32,
}

impl Vehicle {
    pub fn new(stats: CarStats) -> Self {
        let fuel = stats.fuel_capacity;
        let nitro = stats.nitro_capacity;
        Self {
            stats,
            engine: EngineState::Off,
            gearbox: Gearbox::default(),
            steer: 0.0,
            fuel,
            health: 100.0,
            nitro,
            nitro_active: false,
            drifting: false,
            damage_cooldown: 0.0,
            odometer: 0.0,
        }
    }

    pub fn engine_running(&self) -> bool {
        self.engine == EngineState::Running
    }

    /// Crank-to-running transition.
    pub fn tick_engine(&mut self, dt: f32) {
        if let EngineState::Starting { remaining } = self.engine {
            let remaining = remaining - dt;
            if remaining <= 0.0 {
                self.engine = EngineState::Running;
            } else {
                self.engine = EngineState::Starting { remaining };
            }
        }
    }

    /// A dry tank gates thrust without killing the engine state, so
    /// refueling restores acceleration immediately.
    pub fn can_accelerate(&self) -> bool {
        self.engine_running() && self.fuel > 0.0
    }

    pub fn toggle_engine(&mut self) {
        self.engine = match self.engine {
            EngineState::Off if self.fuel > 0.0 => EngineState::Starting { remaining: 1.2 },
            EngineState::Off => EngineState::Off,
            _ => EngineState::Off,
        };
    }

    /// Apply one registered impact, honoring the damage cooldown. Returns the
    /// health actually lost.
    pub fn register_impact(&mut self, impact_speed: f32) -> f32 {
        if self.damage_cooldown > 0.0 || impact_speed < DAMAGE_MIN_IMPACT {
            return 0.0;
        }
        let damage = (impact_speed * DAMAGE_IMPACT_SCALE).min(self.health);
        self.health -= damage;
        self.damage_cooldown = DAMAGE_COOLDOWN;
        damage
    }
}

#[derive(Component)]
pub struct PlayerCar;

/// Intent for the current frame, decoupled from key bindings.
#[derive(Resource, Default)]
pub struct VehicleControls {
    pub throttle: bool,
    pub reverse: bool,
    pub brake: bool,
    /// -1.0 right .. 1.0 left
    pub steer_input: f32,
    pub nitro: bool,
}

/// Hull damage taken this frame; audio and HUD both listen.
#[derive(Event)]
pub struct DamageEvent {
    pub amount: f32,
    pub health_left: f32,
}

/// Move the steering angle toward the input, or decay it back to center
/// when the wheel is released.
pub fn steer_step(current: f32, input: f32, handling: f32, dt: f32) -> f32 {
    if input.abs() > f32::EPSILON {
        let target = input * MAX_STEER_ANGLE;
        let step = STEER_RATE * handling * dt;
        current + (target - current).clamp(-step, step)
    } else {
        current * STEER_DECAY.powf(dt * 60.0)
    }
}

/// Horizontal speed cap; vertical velocity is left to the physics engine.
pub fn clamp_horizontal(linvel: Vec3, max_ms: f32) -> Vec3 {
    let horizontal = Vec3::new(linvel.x, 0.0, linvel.z);
    let speed = horizontal.length();
    if speed <= max_ms || speed <= f32::EPSILON {
        return linvel;
    }
    let scaled = horizontal * (max_ms / speed);
    Vec3::new(scaled.x, linvel.y, scaled.z)
}

/// Engine output shaping. The power band peaks mid-range and falls off at
/// redline, and air resistance bleeds thrust as speed nears the rated max.
/// Both factors are floored so the car always creeps off the line.
pub fn thrust_factor(rpm_ratio: f32, speed_ratio: f32) -> f32 {
    let band = (std::f32::consts::PI * 0.9 * rpm_ratio).sin().max(0.3);
    let drag = (1.0 - 0.8 * speed_ratio * speed_ratio).max(0.1);
    band * drag
}

/// Drive force for the current frame, in world space along the car's
/// flattened forward vector. Reverse is a flat fraction of engine force.
pub fn drive_thrust(
    stats: &CarStats,
    gearbox: &Gearbox,
    throttle: bool,
    reversing: bool,
    nitro_active: bool,
    speed_kmh: f32,
    flat_forward: Vec3,
) -> Vec3 {
    if reversing {
        return -flat_forward * stats.engine_force * REVERSE_FORCE_RATIO;
    }
    if !throttle {
        return Vec3::ZERO;
    }
    let speed_ratio = (speed_kmh / stats.max_speed_kmh).clamp(0.0, 1.0);
    let mut magnitude = stats.engine_force
        * gearbox.power_ratio()
        * thrust_factor(gearbox.rpm_ratio(), speed_ratio);
    if nitro_active {
        magnitude *= NITRO_FORCE_MULT;
    }
    flat_forward * magnitude
}

pub fn read_controls(keyboard: Res<ButtonInput<KeyCode>>, mut controls: ResMut<VehicleControls>) {
    controls.throttle = keyboard.pressed(KeyCode::KeyW) || keyboard.pressed(KeyCode::ArrowUp);
    controls.reverse = keyboard.pressed(KeyCode::KeyS) || keyboard.pressed(KeyCode::ArrowDown);
    controls.brake = keyboard.pressed(KeyCode::Space);
    let left = keyboard.pressed(KeyCode::KeyA) || keyboard.pressed(KeyCode::ArrowLeft);
    let right = keyboard.pressed(KeyCode::KeyD) || keyboard.pressed(KeyCode::ArrowRight);
    controls.steer_input = (left as i8 - right as i8) as f32;
    controls.nitro = keyboard.pressed(KeyCode::ShiftLeft);
}

pub fn toggle_engine(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut player: Single<&mut Vehicle, With<PlayerCar>>,
) {
    if keyboard.just_pressed(KeyCode::KeyE) {
        player.toggle_engine();
        match player.engine {
            EngineState::Starting { .. } => info!("engine cranking"),
            _ => info!("engine off"),
        }
    }
}

/// Per-frame driving forces. Reads intent, updates the gearbox and resource
/// meters, and writes forces plus direct velocity fixups the arcade model
/// needs (brake scaling, speed clamp, upright recovery).
pub fn vehicle_dynamics(
    time: Res<Time>,
    controls: Res<VehicleControls>,
    mut player: Single<
        (&mut Vehicle, &Transform, &mut Velocity, &mut ExternalForce),
        With<PlayerCar>,
    >,
) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }
    let (vehicle, transform, velocity, force) = &mut *player;

    vehicle.tick_engine(dt);
    vehicle.damage_cooldown = (vehicle.damage_cooldown - dt).max(0.0);

    let forward = transform.forward().as_vec3();
    let flat_forward = Vec3::new(forward.x, 0.0, forward.z).normalize_or_zero();
    let horizontal = Vec3::new(velocity.linvel.x, 0.0, velocity.linvel.z);
    let speed_ms = horizontal.length();
    let speed_kmh = speed_ms * MS_TO_KMH;
    let moving_forward = horizontal.dot(flat_forward) >= 0.0;

    let powered = vehicle.can_accelerate();
    let throttle = controls.throttle && powered;
    let reversing = controls.reverse && powered;
    let braking = controls.brake;

    vehicle.nitro_active = controls.nitro && throttle && vehicle.nitro > 0.0;
    if vehicle.nitro_active {
        vehicle.nitro = (vehicle.nitro - NITRO_DRAIN_RATE * dt).max(0.0);
    } else {
        vehicle.nitro = (vehicle.nitro + vehicle.stats.nitro_regen * dt)
            .min(vehicle.stats.nitro_capacity);
    }

    let max_speed = vehicle.stats.max_speed_kmh;
    vehicle
        .gearbox
        .update(speed_kmh, throttle, reversing, max_speed, dt);

    force.force = drive_thrust(
        &vehicle.stats,
        &vehicle.gearbox,
        throttle,
        reversing,
        vehicle.nitro_active,
        speed_kmh,
        flat_forward,
    );

    // fuel burns with throttle and revs
    if powered && (throttle || reversing) {
        let burn = FUEL_CONSUMPTION_RATE * (0.4 + 0.6 * vehicle.gearbox.rpm_ratio());
        vehicle.fuel = (vehicle.fuel - burn * dt).max(0.0);
    }

    // steering: angle tracks input, yaw torque follows, both gated on motion
    vehicle.steer = steer_step(vehicle.steer, controls.steer_input, vehicle.stats.handling, dt);
    if speed_ms > MIN_STEER_SPEED {
        let sign = if moving_forward { 1.0 } else { -1.0 };
        force.torque = Vec3::Y * vehicle.steer * YAW_TORQUE * sign;
    } else {
        force.torque = Vec3::ZERO;
    }

    if braking {
        let frames = dt * 60.0 * vehicle.stats.brake_grip;
        velocity.linvel *= BRAKE_LINEAR_SCALE.powf(frames);
        velocity.angvel *= BRAKE_ANGULAR_SCALE.powf(frames);
    }

    // arcade speed limit at the rated top speed, lifted under nitro
    let cap_kmh = if vehicle.nitro_active {
        max_speed * NITRO_SPEED_MULT
    } else {
        max_speed
    };
    velocity.linvel = clamp_horizontal(velocity.linvel, cap_kmh / MS_TO_KMH);

    let up = transform.up().as_vec3();
    let (settled, righting) = upright_correction(velocity.angvel, up, dt);
    velocity.angvel = settled;
    force.torque += righting;

    vehicle.drifting =
        vehicle.steer.abs() > DRIFT_STEER_THRESHOLD && speed_kmh > DRIFT_SPEED_THRESHOLD;
    vehicle.odometer += speed_ms * dt;
}

/// Per-tick roll and pitch settling. Damping applies every frame so small
/// wobbles bleed off; the righting torque only kicks in once the body has
/// tipped past the threshold.
pub fn upright_correction(angvel: Vec3, up: Vec3, dt: f32) -> (Vec3, Vec3) {
    let frames = dt * 60.0;
    let mut settled = angvel;
    settled.x *= ANGVEL_DAMP.powf(frames);
    settled.z *= ANGVEL_DAMP.powf(frames);
    let righting = if up.y < UPRIGHT_MIN_UP_Y {
        up.cross(Vec3::Y) * UPRIGHT_TORQUE
    } else {
        Vec3::ZERO
    };
    (settled, righting)
}

/// Closing speed in the ground plane between the car and whatever it hit.
/// Vertical motion is ignored so curb drops and suspension settling do not
/// count as crashes.
pub fn impact_speed(player_vel: Vec3, other_vel: Vec3) -> f32 {
    let rel = player_vel - other_vel;
    Vec2::new(rel.x, rel.z).length()
}

/// Convert physics contacts into hull damage, rate-limited by the damage
/// cooldown so one crash does not register on every solver step.
pub fn collision_damage(
    mut collisions: EventReader<CollisionEvent>,
    mut damage_events: EventWriter<DamageEvent>,
    mut player: Single<(Entity, &mut Vehicle, &Velocity), With<PlayerCar>>,
    others: Query<&Velocity, Without<PlayerCar>>,
) {
    let (entity, vehicle, velocity) = &mut *player;
    for event in collisions.read() {
        let CollisionEvent::Started(a, b, _) = event else {
            continue;
        };
        if *a != *entity && *b != *entity {
            continue;
        }
        let other = if *a == *entity { *b } else { *a };
        let other_vel = others.get(other).map(|v| v.linvel).unwrap_or(Vec3::ZERO);
        let impact = impact_speed(velocity.linvel, other_vel);
        let amount = vehicle.register_impact(impact);
        if amount > 0.0 {
            info!("impact {impact:.1} m/s, hull at {:.0}", vehicle.health);
            damage_events.write(DamageEvent {
                amount,
                health_left: vehicle.health,
            });
        }
    }
}

/// Lean the body mesh into the corner. Cosmetic only; the collider stays flat.
#[derive(Component)]
pub struct CarBody;

pub fn tilt_car_body(
    player: Single<&Vehicle, With<PlayerCar>>,
    mut bodies: Query<&mut Transform, With<CarBody>>,
) {
    for mut transform in bodies.iter_mut() {
        transform.rotation = Quat::from_rotation_z(-player.steer * BODY_TILT_RATIO);
    }
}

/// Spawn the player chassis with its physics body and cosmetic meshes.
pub fn spawn_player(
    mut commands: Commands,
    base: Res<crate::tuning::BaseStats>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let stats = base.0.clone();
    let mass = stats.mass;
    commands
        .spawn((
            PlayerCar,
            crate::camera::CameraTarget,
            Vehicle::new(stats),
            Transform::from_xyz(0.0, 1.0, 0.0),
            Visibility::default(),
            RigidBody::Dynamic,
            Collider::cuboid(1.0, 0.5, 2.1),
            ColliderMassProperties::Mass(mass),
            Velocity::default(),
            ExternalForce::default(),
            Damping {
                linear_damping: 0.8,
                angular_damping: 2.0,
            },
            ActiveEvents::COLLISION_EVENTS,
            Name::new("player car"),
        ))
        .with_children(|car| {
            car.spawn((
                CarBody,
                Mesh3d(meshes.add(Cuboid::new(2.0, 0.8, 4.2))),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::srgb(0.75, 0.12, 0.12),
                    metallic: 0.6,
                    perceptual_roughness: 0.3,
                    ..default()
                })),
                Transform::from_xyz(0.0, 0.1, 0.0),
            ));
            car.spawn((
                Mesh3d(meshes.add(Cuboid::new(1.6, 0.6, 2.0))),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::srgb(0.1, 0.1, 0.15),
                    ..default()
                })),
                Transform::from_xyz(0.0, 0.7, -0.2),
            ));
        });
}

/// Tire smoke puff, purely cosmetic.
#[derive(Component)]
pub struct SmokeParticle {
    remaining: f32,
}

const SMOKE_TTL: f32 = 0.6;

pub fn spawn_drift_smoke(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    player: Single<(&Vehicle, &Transform), With<PlayerCar>>,
) {
    let (vehicle, transform) = *player;
    if !vehicle.drifting {
        return;
    }
    let back = transform.back().as_vec3();
    for side in [-0.9, 0.9] {
        let offset = back * 2.0 + transform.right().as_vec3() * side;
        commands.spawn((
            SmokeParticle {
                remaining: SMOKE_TTL,
            },
            Mesh3d(meshes.add(Sphere::new(0.3))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgba(0.85, 0.85, 0.85, 0.6),
                alpha_mode: AlphaMode::Blend,
                unlit: true,
                ..default()
            })),
            Transform::from_translation(transform.translation + offset),
        ));
    }
}

pub fn fade_drift_smoke(
    time: Res<Time>,
    mut commands: Commands,
    mut particles: Query<(Entity, &mut SmokeParticle, &mut Transform)>,
) {
    for (entity, mut particle, mut transform) in particles.iter_mut() {
        particle.remaining -= time.delta_secs();
        if particle.remaining <= 0.0 {
            commands.entity(entity).despawn();
            continue;
        }
        transform.translation.y += time.delta_secs() * 0.8;
        transform.scale = Vec3::splat(1.0 + (SMOKE_TTL - particle.remaining) * 2.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_vehicle() -> Vehicle {
        let mut v = Vehicle::new(CarStats::default());
        v.engine = EngineState::Running;
        v
    }

    #[test]
    fn engine_cranks_then_runs() {
        let mut v = Vehicle::new(CarStats::default());
        v.toggle_engine();
        assert!(matches!(v.engine, EngineState::Starting { .. }));
        v.tick_engine(0.5);
        assert!(matches!(v.engine, EngineState::Starting { .. }));
        v.tick_engine(1.0);
        assert_eq!(v.engine, EngineState::Running);
    }

    #[test]
    fn engine_refuses_to_start_on_empty_tank() {
        let mut v = Vehicle::new(CarStats::default());
        v.fuel = 0.0;
        v.toggle_engine();
        assert_eq!(v.engine, EngineState::Off);
    }

    #[test]
    fn dry_tank_gates_thrust_until_refueled() {
        let mut v = running_vehicle();
        v.fuel = 0.0;
        assert!(!v.can_accelerate());
        v.fuel = 100.0;
        assert!(v.can_accelerate());
    }

    #[test]
    fn impact_damage_scales_with_speed() {
        let mut v = running_vehicle();
        let lost = v.register_impact(10.0);
        assert_eq!(lost, 20.0);
        assert_eq!(v.health, 80.0);
    }

    #[test]
    fn damage_cooldown_swallows_rapid_hits() {
        let mut v = running_vehicle();
        assert!(v.register_impact(10.0) > 0.0);
        assert_eq!(v.register_impact(10.0), 0.0);
        v.damage_cooldown = 0.0;
        assert!(v.register_impact(10.0) > 0.0);
    }

    #[test]
    fn soft_taps_are_ignored() {
        let mut v = running_vehicle();
        assert_eq!(v.register_impact(1.0), 0.0);
        assert_eq!(v.health, 100.0);
    }

    #[test]
    fn steering_decays_without_input() {
        let mut steer = MAX_STEER_ANGLE;
        for _ in 0..60 {
            steer = steer_step(steer, 0.0, 1.0, 1.0 / 60.0);
        }
        assert!(steer.abs() < 0.01, "steer should settle, got {steer}");
    }

    #[test]
    fn steering_is_rate_limited() {
        let steer = steer_step(0.0, 1.0, 1.0, 0.01);
        assert!(steer < MAX_STEER_ANGLE / 4.0);
        assert!(steer > 0.0);
    }

    #[test]
    fn speed_clamp_preserves_vertical_velocity() {
        let clamped = clamp_horizontal(Vec3::new(30.0, -4.0, 40.0), 25.0);
        assert!((Vec3::new(clamped.x, 0.0, clamped.z).length() - 25.0).abs() < 1e-3);
        assert_eq!(clamped.y, -4.0);
    }

    #[test]
    fn slow_vehicle_is_not_clamped() {
        let v = Vec3::new(3.0, 0.0, 4.0);
        assert_eq!(clamp_horizontal(v, 25.0), v);
    }

    #[test]
    fn power_band_peaks_mid_range() {
        let idle = thrust_factor(IDLE_RPM / MAX_RPM, 0.0);
        let mid = thrust_factor(0.5, 0.0);
        let redline = thrust_factor(1.0, 0.0);
        assert!(mid > idle);
        assert!(mid > redline);
        assert!(mid > 0.95);
    }

    #[test]
    fn thrust_floors_never_stall_the_car() {
        assert!((thrust_factor(0.0, 0.0) - 0.3).abs() < 1e-6);
        // drag bottoms out at 0.1 once 1 - 0.8 s^2 drops below it
        assert!((thrust_factor(0.5, 2.0) - thrust_factor(0.5, 1.2)).abs() < 1e-6);
        assert!(thrust_factor(0.0, 2.0) >= 0.3 * 0.1 - 1e-6);
    }

    #[test]
    fn drive_force_fades_near_rated_top_speed() {
        let stats = CarStats::default();
        let mut gearbox = Gearbox::default();
        let dt = 1.0 / 60.0;
        for _ in 0..600 {
            gearbox.update(stats.max_speed_kmh * 0.98, true, false, stats.max_speed_kmh, dt);
        }
        let near_top = drive_thrust(
            &stats,
            &gearbox,
            true,
            false,
            false,
            stats.max_speed_kmh * 0.98,
            Vec3::Z,
        );
        let peak = stats.engine_force * gearbox.power_ratio();
        assert!(near_top.length() < peak * 0.5, "got {}", near_top.length());
    }

    #[test]
    fn reverse_thrust_engages_at_any_speed() {
        let stats = CarStats::default();
        let gearbox = Gearbox::default();
        let thrust = drive_thrust(&stats, &gearbox, false, true, false, 150.0, Vec3::Z);
        assert!(thrust.z < 0.0);
        assert_eq!(
            thrust.length(),
            stats.engine_force * REVERSE_FORCE_RATIO
        );
    }

    #[test]
    fn roll_settles_even_when_upright() {
        let (settled, righting) =
            upright_correction(Vec3::new(2.0, 1.0, -2.0), Vec3::Y, 1.0 / 60.0);
        assert!(settled.x < 2.0);
        assert!(settled.z > -2.0);
        assert_eq!(settled.y, 1.0);
        assert_eq!(righting, Vec3::ZERO);
    }

    #[test]
    fn righting_torque_engages_past_the_tilt_threshold() {
        let (_, righting) = upright_correction(Vec3::ZERO, Vec3::X, 1.0 / 60.0);
        assert!(righting.length() > 0.0);
    }

    #[test]
    fn impact_speed_ignores_vertical_motion() {
        assert_eq!(impact_speed(Vec3::new(0.0, -12.0, 0.0), Vec3::ZERO), 0.0);
        let closing = impact_speed(Vec3::new(10.0, -3.0, 0.0), Vec3::new(7.0, 0.0, 0.0));
        assert!((closing - 3.0).abs() < 1e-6);
    }

    #[test]
    fn sustained_throttle_reaches_top_gear_within_limits() {
        use crate::game_logic::streaming::WorldStreamer;

        let stats = CarStats {
            max_speed_kmh: 200.0,
            ..CarStats::default()
        };
        let mut vehicle = Vehicle::new(stats);
        vehicle.engine = EngineState::Running;
        let mut streamer = WorldStreamer::default();
        let mut position = Vec3::ZERO;
        let mut linvel = Vec3::ZERO;
        let dt = 1.0 / 60.0;

        for _ in 0..20 * 60 {
            let speed_kmh = linvel.length() * MS_TO_KMH;
            vehicle
                .gearbox
                .update(speed_kmh, true, false, vehicle.stats.max_speed_kmh, dt);
            let thrust = drive_thrust(
                &vehicle.stats,
                &vehicle.gearbox,
                true,
                false,
                false,
                speed_kmh,
                Vec3::Z,
            );
            linvel += thrust / vehicle.stats.mass * dt;
            linvel = clamp_horizontal(linvel, vehicle.stats.max_speed_kmh / MS_TO_KMH);
            position += linvel * dt;
            let burn = FUEL_CONSUMPTION_RATE * (0.4 + 0.6 * vehicle.gearbox.rpm_ratio());
            vehicle.fuel = (vehicle.fuel - burn * dt).max(0.0);

            let center = WorldStreamer::chunk_coord(position);
            if let Some(plan) = streamer.plan(center) {
                for (coord, _) in plan.to_unload {
                    streamer.remove(coord);
                }
                for coord in plan.to_load {
                    streamer.insert(coord, Entity::PLACEHOLDER);
                }
            }
        }

        assert_eq!(vehicle.gearbox.gear, TOP_GEAR);
        assert!(vehicle.fuel < 100.0);
        assert!(linvel.length() * MS_TO_KMH <= 200.0 + 1.0);
        assert_eq!(streamer.resident_count(), 25);
        for coord in WorldStreamer::desired(WorldStreamer::chunk_coord(position)) {
            assert!(streamer.is_resident(coord));
        }
    }
}
