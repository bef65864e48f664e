use crate::game_logic::constants::*;
use crate::game_logic::vehicle::PlayerCar;
use bevy::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RacePhase {
    Inactive,
    Racing,
    Finished,
}

#[derive(Debug, PartialEq)]
pub enum RaceEvent {
    CheckpointPassed { index: usize, total: usize },
    Finished { time: f32, new_record: bool },
}

/// Ordered-checkpoint race. Only the current checkpoint is proximity-tested,
/// so driving through a later gate early never advances the sequence.
#[derive(Resource)]
pub struct RaceState {
    pub phase: RacePhase,
    pub checkpoints: Vec<Vec2>,
    pub current: usize,
    pub elapsed: f32,
    pub best_time: Option<f32>,
}

impl Default for RaceState {
    fn default() -> Self {
        Self {
            phase: RacePhase::Inactive,
            checkpoints: Vec::new(),
            current: 0,
            elapsed: 0.0,
            best_time: None,
        }
    }
}

impl RaceState {
    /// Ten-gate loop around the starting intersection.
    pub fn circuit() -> Vec<Vec2> {
        [
            (0.0, 50.0),
            (50.0, 100.0),
            (100.0, 50.0),
            (100.0, -50.0),
            (50.0, -100.0),
            (0.0, -50.0),
            (-50.0, -100.0),
            (-100.0, -50.0),
            (-100.0, 50.0),
            (-50.0, 100.0),
        ]
        .into_iter()
        .map(|(x, z)| Vec2::new(x, z))
        .collect()
    }

    /// Straight run north along the main road.
    pub fn sprint() -> Vec<Vec2> {
        (0..10).map(|i| Vec2::new(0.0, (i * 100) as f32)).collect()
    }

    pub fn start(&mut self, layout: Vec<Vec2>) {
        self.checkpoints = layout;
        self.current = 0;
        self.elapsed = 0.0;
        self.phase = RacePhase::Racing;
    }

    pub fn racing(&self) -> bool {
        self.phase == RacePhase::Racing
    }

    /// Advance the race clock and test the current gate. At most one gate can
    /// be passed per tick.
    pub fn tick(&mut self, player_pos: Vec2, dt: f32) -> Option<RaceEvent> {
        if self.phase != RacePhase::Racing {
            return None;
        }
        self.elapsed += dt;

        let gate = *self.checkpoints.get(self.current)?;
        if player_pos.distance(gate) >= CHECKPOINT_RADIUS {
            return None;
        }

        self.current += 1;
        if self.current >= self.checkpoints.len() {
            self.phase = RacePhase::Finished;
            let new_record = self.best_time.is_none_or(|best| self.elapsed < best);
            if new_record {
                self.best_time = Some(self.elapsed);
            }
            Some(RaceEvent::Finished {
                time: self.elapsed,
                new_record,
            })
        } else {
            Some(RaceEvent::CheckpointPassed {
                index: self.current,
                total: self.checkpoints.len(),
            })
        }
    }
}

/// mm:ss.cc for the HUD and finish banner.
pub fn format_time(seconds: f32) -> String {
    let minutes = (seconds / 60.0) as u32;
    let secs = seconds % 60.0;
    format!("{minutes:02}:{secs:05.2}")
}

/// Gate entity, indexed into RaceState::checkpoints.
#[derive(Component)]
pub struct CheckpointGate {
    pub index: usize,
}

/// Fired into the app when gates are passed; progression and HUD consume it.
#[derive(Event, Debug)]
pub enum RaceUpdate {
    Started,
    GatePassed { index: usize, total: usize },
    Finished { time: f32, new_record: bool },
}

pub fn start_race_on_key(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut commands: Commands,
    mut race: ResMut<RaceState>,
    mut updates: EventWriter<RaceUpdate>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    gates: Query<Entity, With<CheckpointGate>>,
) {
    if !keyboard.just_pressed(KeyCode::KeyR) || race.racing() {
        return;
    }
    for gate in gates.iter() {
        commands.entity(gate).despawn();
    }

    race.start(RaceState::circuit());
    info!("race started, {} gates", race.checkpoints.len());
    updates.write(RaceUpdate::Started);

    let ring = meshes.add(Torus {
        minor_radius: 0.5,
        major_radius: 8.0,
    });
    for (index, gate) in race.checkpoints.iter().enumerate() {
        commands.spawn((
            CheckpointGate { index },
            Mesh3d(ring.clone()),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgba(0.0, 1.0, 0.0, 0.5),
                emissive: LinearRgba::rgb(0.0, 1.5, 0.0),
                alpha_mode: AlphaMode::Blend,
                ..default()
            })),
            Transform::from_xyz(gate.x, 5.0, gate.y)
                .with_rotation(Quat::from_rotation_x(std::f32::consts::FRAC_PI_2)),
        ));
    }
}

pub fn race_progress(
    time: Res<Time>,
    mut commands: Commands,
    mut race: ResMut<RaceState>,
    mut updates: EventWriter<RaceUpdate>,
    player: Single<&Transform, With<PlayerCar>>,
    gates: Query<(Entity, &CheckpointGate)>,
) {
    let pos = Vec2::new(player.translation.x, player.translation.z);
    match race.tick(pos, time.delta_secs()) {
        Some(RaceEvent::CheckpointPassed { index, total }) => {
            for (entity, gate) in gates.iter() {
                if gate.index == index - 1 {
                    commands.entity(entity).despawn();
                }
            }
            info!("checkpoint {index}/{total}");
            updates.write(RaceUpdate::GatePassed { index, total });
        }
        Some(RaceEvent::Finished { time, new_record }) => {
            for (entity, _) in gates.iter() {
                commands.entity(entity).despawn();
            }
            info!("race finished in {}", format_time(time));
            updates.write(RaceUpdate::Finished { time, new_record });
        }
        None => {}
    }
}

/// Slow spin on the gate the player is hunting.
pub fn animate_gates(
    time: Res<Time>,
    race: Res<RaceState>,
    mut gates: Query<(&CheckpointGate, &mut Transform)>,
) {
    if !race.racing() {
        return;
    }
    for (gate, mut transform) in gates.iter_mut() {
        if gate.index == race.current {
            transform.rotate_local_z(time.delta_secs() * 2.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_gate_race() -> RaceState {
        let mut race = RaceState::default();
        race.start(vec![Vec2::new(0.0, 50.0), Vec2::new(0.0, 100.0)]);
        race
    }

    #[test]
    fn gates_must_be_passed_in_order() {
        let mut race = RaceState::default();
        race.start(vec![
            Vec2::new(0.0, 50.0),
            Vec2::new(0.0, 100.0),
            Vec2::new(0.0, 150.0),
        ]);
        // sitting on the last gate does nothing while the first is current
        assert_eq!(race.tick(Vec2::new(0.0, 150.0), 0.1), None);
        assert_eq!(race.current, 0);
        assert_eq!(
            race.tick(Vec2::new(0.0, 50.0), 0.1),
            Some(RaceEvent::CheckpointPassed { index: 1, total: 3 })
        );
    }

    #[test]
    fn proximity_threshold_is_exclusive() {
        let mut race = two_gate_race();
        assert_eq!(race.tick(Vec2::new(0.0, 50.0 + CHECKPOINT_RADIUS), 0.1), None);
        assert!(race
            .tick(Vec2::new(0.0, 50.0 + CHECKPOINT_RADIUS - 0.5), 0.1)
            .is_some());
    }

    #[test]
    fn final_gate_finishes_and_records() {
        let mut race = two_gate_race();
        race.tick(Vec2::new(0.0, 50.0), 30.0);
        let event = race.tick(Vec2::new(0.0, 100.0), 15.0);
        assert_eq!(
            event,
            Some(RaceEvent::Finished {
                time: 45.0,
                new_record: true
            })
        );
        assert_eq!(race.phase, RacePhase::Finished);
        assert_eq!(race.best_time, Some(45.0));
    }

    #[test]
    fn slower_run_keeps_the_record() {
        let mut race = two_gate_race();
        race.best_time = Some(10.0);
        race.tick(Vec2::new(0.0, 50.0), 30.0);
        let event = race.tick(Vec2::new(0.0, 100.0), 15.0);
        assert_eq!(
            event,
            Some(RaceEvent::Finished {
                time: 45.0,
                new_record: false
            })
        );
        assert_eq!(race.best_time, Some(10.0));
    }

    #[test]
    fn clock_only_runs_while_racing() {
        let mut race = RaceState::default();
        assert_eq!(race.tick(Vec2::ZERO, 5.0), None);
        assert_eq!(race.elapsed, 0.0);
    }

    #[test]
    fn time_formatting() {
        assert_eq!(format_time(45.5), "00:45.50");
        assert_eq!(format_time(83.25), "01:23.25");
    }
}
