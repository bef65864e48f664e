use crate::game_logic::constants::*;
use crate::game_logic::vehicle::{PlayerCar, Vehicle};
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use rand::Rng;

/// Pursuit agent. Kinematic: it steers its heading toward the player and
/// advances at a distance-proportional speed, ignoring engine forces.
#[derive(Component)]
pub struct PoliceCar {
    pub heading: f32,
}

#[derive(Debug, PartialEq)]
pub enum PoliceEvent {
    ChaseStarted,
    BackupDispatched,
    ChaseEnded,
}

/// Wanted-level accrual and the chase/escape state machine. Pure state so
/// the timing contracts can be tested without an ECS world.
#[derive(Resource)]
pub struct PursuitState {
    pub wanted: f32,
    pub chasing: bool,
    sample_timer: f32,
    chase_duration: f32,
    escape_timer: f32,
    next_backup_at: f32,
}

impl Default for PursuitState {
    fn default() -> Self {
        Self {
            wanted: 0.0,
            chasing: false,
            sample_timer: 0.0,
            chase_duration: 0.0,
            escape_timer: 0.0,
            next_backup_at: BACKUP_DELAY,
        }
    }
}

impl PursuitState {
    /// 1 Hz speedometer check. Violations grow the wanted level, clean
    /// samples shrink it. Crossing 1.0 opens a chase exactly once; a
    /// violation during an active chase never spawns a second initial car.
    pub fn sample_speed(&mut self, speed_kmh: f32, dt: f32) -> Option<PoliceEvent> {
        self.sample_timer += dt;
        if self.sample_timer < SPEED_SAMPLE_INTERVAL {
            return None;
        }
        self.sample_timer -= SPEED_SAMPLE_INTERVAL;

        if speed_kmh > SPEED_LIMIT + SPEED_MARGIN {
            self.wanted = (self.wanted + WANTED_GAIN).min(WANTED_MAX);
        } else {
            self.wanted = (self.wanted - WANTED_DECAY).max(0.0);
        }

        if !self.chasing && self.wanted >= 1.0 {
            self.chasing = true;
            self.chase_duration = 0.0;
            self.escape_timer = 0.0;
            self.next_backup_at = BACKUP_DELAY;
            return Some(PoliceEvent::ChaseStarted);
        }
        None
    }

    /// Advance chase timers. `all_far` is true when every pursuit agent is
    /// beyond the escape distance; the separation must hold continuously
    /// for the full timeout, any close pass resets it.
    pub fn tick_chase(&mut self, all_far: bool, active_cars: usize, dt: f32) -> Option<PoliceEvent> {
        if !self.chasing {
            return None;
        }
        self.chase_duration += dt;

        if all_far {
            self.escape_timer += dt;
            if self.escape_timer >= ESCAPE_TIMEOUT {
                self.chasing = false;
                self.wanted = 0.0;
                self.escape_timer = 0.0;
                return Some(PoliceEvent::ChaseEnded);
            }
        } else {
            self.escape_timer = 0.0;
        }

        if self.chase_duration >= self.next_backup_at && active_cars < MAX_POLICE_CARS {
            self.next_backup_at += BACKUP_DELAY;
            return Some(PoliceEvent::BackupDispatched);
        }
        None
    }
}

/// Shortest-path interpolation between two angles in radians.
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    use std::f32::consts::TAU;
    let diff = (to - from + TAU / 2.0).rem_euclid(TAU) - TAU / 2.0;
    from + diff * t
}

/// Closing speed rule: proportional to distance, capped, and zero inside the
/// hold radius so the cruiser parks beside the player instead of ramming.
pub fn approach_speed(distance: f32) -> f32 {
    if distance <= POLICE_HOLD_DISTANCE {
        return 0.0;
    }
    (distance * 2.0).min(POLICE_TOP_SPEED)
}

/// Drives the whole pursuit: samples the speedometer, moves active cruisers,
/// spawns reinforcements and tears the chase down on escape.
pub fn police_pursuit(
    time: Res<Time>,
    mut commands: Commands,
    mut state: ResMut<PursuitState>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    player: Single<(&Transform, &Velocity), (With<PlayerCar>, With<Vehicle>)>,
    mut cars: Query<(Entity, &mut PoliceCar, &mut Transform), Without<PlayerCar>>,
) {
    let dt = time.delta_secs();
    let (player_transform, velocity) = *player;
    let player_pos = player_transform.translation;
    let speed_kmh = Vec3::new(velocity.linvel.x, 0.0, velocity.linvel.z).length() * MS_TO_KMH;

    if let Some(PoliceEvent::ChaseStarted) = state.sample_speed(speed_kmh, dt) {
        info!("chase opened at wanted {:.1}", state.wanted);
        spawn_police_car(&mut commands, &mut meshes, &mut materials, player_pos);
    }

    let mut all_far = true;
    for (_, mut car, mut transform) in cars.iter_mut() {
        let to_player = player_pos - transform.translation;
        let distance = Vec3::new(to_player.x, 0.0, to_player.z).length();
        if distance <= ESCAPE_DISTANCE {
            all_far = false;
        }

        let bearing = f32::atan2(to_player.x, to_player.z);
        car.heading = lerp_angle(car.heading, bearing, (3.0 * dt).min(1.0));
        let speed = approach_speed(distance);
        let step = Vec3::new(car.heading.sin(), 0.0, car.heading.cos()) * speed * dt;
        transform.translation += step;
        transform.rotation = Quat::from_rotation_y(car.heading);
    }

    let active = cars.iter().count();
    match state.tick_chase(all_far && active > 0, active, dt) {
        Some(PoliceEvent::BackupDispatched) => {
            info!("backup dispatched, {} cars active", active + 1);
            spawn_police_car(&mut commands, &mut meshes, &mut materials, player_pos);
        }
        Some(PoliceEvent::ChaseEnded) => {
            info!("player escaped, chase torn down");
            for (entity, _, _) in cars.iter() {
                commands.entity(entity).despawn();
            }
        }
        _ => {}
    }
}

fn spawn_police_car(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    player_pos: Vec3,
) {
    let mut rng = rand::rng();
    let angle = rng.random_range(0.0..std::f32::consts::TAU);
    let offset = Vec3::new(angle.sin(), 0.0, angle.cos()) * 60.0;
    let spawn = Vec3::new(player_pos.x + offset.x, 0.6, player_pos.z + offset.z);

    commands
        .spawn((
            PoliceCar { heading: angle },
            Transform::from_translation(spawn),
            Visibility::default(),
            RigidBody::KinematicPositionBased,
            Collider::cuboid(1.0, 0.6, 2.1),
            Name::new("police car"),
        ))
        .with_children(|car| {
            car.spawn((
                Mesh3d(meshes.add(Cuboid::new(2.0, 0.8, 4.2))),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::srgb(0.08, 0.08, 0.3),
                    ..default()
                })),
                Transform::from_xyz(0.0, 0.0, 0.0),
            ));
            car.spawn((
                Mesh3d(meshes.add(Cuboid::new(0.8, 0.3, 0.8))),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::srgb(1.0, 0.2, 0.2),
                    emissive: LinearRgba::rgb(3.0, 0.2, 0.2),
                    ..default()
                })),
                Transform::from_xyz(0.0, 0.6, 0.0),
            ));
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.1;

    fn drive_samples(state: &mut PursuitState, speed: f32, seconds: f32) -> Option<PoliceEvent> {
        let mut last = None;
        let steps = (seconds / DT).round() as usize;
        for _ in 0..steps {
            if let Some(event) = state.sample_speed(speed, DT) {
                last = Some(event);
            }
        }
        last
    }

    #[test]
    fn wanted_grows_only_above_margin() {
        let mut state = PursuitState::default();
        drive_samples(&mut state, SPEED_LIMIT + SPEED_MARGIN, 5.0);
        assert_eq!(state.wanted, 0.0);
        drive_samples(&mut state, SPEED_LIMIT + SPEED_MARGIN + 1.0, 5.0);
        assert!((state.wanted - 0.5).abs() < 1e-4);
    }

    #[test]
    fn chase_opens_once_at_wanted_one() {
        let mut state = PursuitState::default();
        let event = drive_samples(&mut state, 150.0, 10.0);
        assert_eq!(event, Some(PoliceEvent::ChaseStarted));
        assert!(state.chasing);
        // further violations escalate wanted but never re-open
        assert_eq!(drive_samples(&mut state, 150.0, 10.0), None);
        assert!(state.wanted > 1.5);
    }

    #[test]
    fn wanted_saturates_at_max() {
        let mut state = PursuitState::default();
        drive_samples(&mut state, 200.0, 120.0);
        assert_eq!(state.wanted, WANTED_MAX);
    }

    #[test]
    fn escape_requires_continuous_separation() {
        let mut state = PursuitState::default();
        drive_samples(&mut state, 150.0, 10.0);
        assert!(state.chasing);

        // separation broken just before the timeout resets the clock
        for _ in 0..99 {
            assert_eq!(state.tick_chase(true, 1, DT), None);
        }
        assert_eq!(state.tick_chase(false, 1, DT), None);
        for _ in 0..99 {
            assert_eq!(state.tick_chase(true, 1, DT), None);
        }
        assert!(state.chasing);
        assert_eq!(state.tick_chase(true, 1, DT), Some(PoliceEvent::ChaseEnded));
        assert!(!state.chasing);
        assert_eq!(state.wanted, 0.0);
    }

    #[test]
    fn backup_arrives_after_thirty_seconds_up_to_three_cars() {
        let mut state = PursuitState::default();
        drive_samples(&mut state, 150.0, 10.0);

        let mut cars = 1;
        let mut elapsed = 0.0;
        let mut dispatches = Vec::new();
        while elapsed < 120.0 {
            if state.tick_chase(false, cars, DT) == Some(PoliceEvent::BackupDispatched) {
                cars += 1;
                dispatches.push(elapsed);
            }
            elapsed += DT;
        }
        assert_eq!(cars, MAX_POLICE_CARS);
        assert!(dispatches[0] >= BACKUP_DELAY - DT);
        assert!(dispatches[1] >= 2.0 * BACKUP_DELAY - DT);
    }

    #[test]
    fn lerp_angle_takes_shortest_path() {
        use std::f32::consts::PI;
        let mid = lerp_angle(0.1, -0.1, 0.5);
        assert!(mid.abs() < 1e-4);
        // wraps across the seam instead of sweeping the long way
        let near_pi = lerp_angle(PI - 0.1, -PI + 0.1, 0.5);
        assert!((near_pi.abs() - PI).abs() < 1e-3);
    }

    #[test]
    fn cruiser_holds_distance_instead_of_ramming() {
        assert_eq!(approach_speed(POLICE_HOLD_DISTANCE - 1.0), 0.0);
        assert_eq!(approach_speed(10.0), 20.0);
        assert_eq!(approach_speed(500.0), POLICE_TOP_SPEED);
    }
}
