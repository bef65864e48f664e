use crate::game_logic::checkpoint::RaceUpdate;
use crate::game_logic::constants::*;
use crate::game_logic::clock::GameClock;
use crate::game_logic::traffic::TrafficCar;
use crate::game_logic::vehicle::{PlayerCar, Vehicle};
use crate::hud::Notification;
use bevy::prelude::*;
use bevy_rapier3d::prelude::Velocity;
use rand::prelude::*;

const COMBO_WINDOW: f32 = 2.0;
const COMBO_MAX_MULTIPLIER: f32 = 5.0;
const ACHIEVEMENT_BONUS: f32 = 100.0;
const NEAR_MISS_RADIUS: f32 = 4.0;
const NEAR_MISS_MIN_SPEED: f32 = 60.0; // km/h
const NEAR_MISS_COOLDOWN: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissionKind {
    TopSpeed,
    Distance,
    DriftScore,
    NearMiss,
    NightDistance,
}

pub struct MissionDef {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: MissionKind,
    pub target: f32,
    pub reward: f32,
}

pub const MISSIONS: &[MissionDef] = &[
    MissionDef {
        id: "speed_demon",
        name: "Speed Demon: reach 200 km/h",
        kind: MissionKind::TopSpeed,
        target: 200.0,
        reward: 500.0,
    },
    MissionDef {
        id: "distance_runner",
        name: "Long Haul: drive 5 km",
        kind: MissionKind::Distance,
        target: 5_000.0,
        reward: 300.0,
    },
    MissionDef {
        id: "drift_king",
        name: "Drift King: bank 1000 drift points",
        kind: MissionKind::DriftScore,
        target: 1_000.0,
        reward: 750.0,
    },
    MissionDef {
        id: "near_miss",
        name: "Close Call: 10 near misses",
        kind: MissionKind::NearMiss,
        target: 10.0,
        reward: 400.0,
    },
    MissionDef {
        id: "night_rider",
        name: "Night Rider: drive 2 km after dark",
        kind: MissionKind::NightDistance,
        target: 2_000.0,
        reward: 600.0,
    },
];

pub struct AchievementDef {
    pub id: &'static str,
    pub name: &'static str,
}

pub const ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id: "first_drive",
        name: "First Drive",
    },
    AchievementDef {
        id: "speed_100",
        name: "Quick Start: 100 km/h",
    },
    AchievementDef {
        id: "speed_200",
        name: "Super Speed: 200 km/h",
    },
    AchievementDef {
        id: "speed_250",
        name: "Light Speed: 250 km/h",
    },
    AchievementDef {
        id: "drift_master",
        name: "Drift Master: 5000 drift points",
    },
    AchievementDef {
        id: "rich",
        name: "Loaded: save up 10000",
    },
    AchievementDef {
        id: "explorer",
        name: "Explorer: drive 20 km",
    },
    AchievementDef {
        id: "combo_king",
        name: "Combo King: 10x chain",
    },
];

/// Player career state: wallet, score, drift combo and the mission and
/// achievement books. Persisted fields round-trip through the save file.
#[derive(Resource)]
pub struct Profile {
    pub money: f32,
    pub score: u64,
    pub total_distance: f32,
    pub top_speed: f32,
    pub drift_score: f32,
    pub near_misses: u32,
    pub combo: u32,
    pub combo_multiplier: f32,
    combo_timer: f32,
    near_miss_cooldown: f32,
    pub unlocked: Vec<String>,
    pub completed_missions: Vec<String>,
    pub active_mission: Option<usize>,
    pub mission_progress: f32,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            money: 1_000.0,
            score: 0,
            total_distance: 0.0,
            top_speed: 0.0,
            drift_score: 0.0,
            near_misses: 0,
            combo: 0,
            combo_multiplier: 1.0,
            combo_timer: 0.0,
            near_miss_cooldown: 0.0,
            unlocked: Vec::new(),
            completed_missions: Vec::new(),
            active_mission: None,
            mission_progress: 0.0,
        }
    }
}

/// Things the career layer announces; HUD and audio pick these up.
#[derive(Event, Debug)]
pub enum CareerEvent {
    AchievementUnlocked { name: &'static str },
    MissionCompleted { name: &'static str, reward: f32 },
    NearMiss,
}

impl Profile {
    pub fn add_score(&mut self, points: f32) {
        self.score += (points * self.combo_multiplier).floor() as u64;
    }

    pub fn extend_combo(&mut self) {
        self.combo += 1;
        self.combo_timer = COMBO_WINDOW;
        self.combo_multiplier = (1.0 + self.combo as f32 * 0.1).min(COMBO_MAX_MULTIPLIER);
    }

    pub fn reset_combo(&mut self) {
        self.combo = 0;
        self.combo_multiplier = 1.0;
        self.combo_timer = 0.0;
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.iter().any(|u| u == id)
    }

    /// Unlock once; repeated triggers are no-ops. Returns the display name
    /// on a fresh unlock.
    pub fn unlock(&mut self, id: &str) -> Option<&'static str> {
        if self.is_unlocked(id) {
            return None;
        }
        let def = ACHIEVEMENTS.iter().find(|a| a.id == id)?;
        self.unlocked.push(id.to_string());
        self.money += ACHIEVEMENT_BONUS;
        Some(def.name)
    }

    pub fn mission_available(&self, index: usize) -> bool {
        !self
            .completed_missions
            .iter()
            .any(|id| id == MISSIONS[index].id)
    }

    /// Per-tick career bookkeeping. Returns events for fresh unlocks and
    /// mission completion.
    pub fn tick(
        &mut self,
        dt: f32,
        speed_kmh: f32,
        distance: f32,
        drifting: bool,
        is_night: bool,
    ) -> Vec<CareerEvent> {
        let mut events = Vec::new();
        self.total_distance += distance;
        self.top_speed = self.top_speed.max(speed_kmh);
        self.near_miss_cooldown = (self.near_miss_cooldown - dt).max(0.0);

        if drifting && speed_kmh > 30.0 {
            let points = (speed_kmh * 0.1 * self.combo_multiplier).floor();
            self.drift_score += points;
            self.add_score(points);
            self.extend_combo();
        }
        if self.combo_timer > 0.0 {
            self.combo_timer -= dt;
            if self.combo_timer <= 0.0 {
                self.reset_combo();
            }
        }

        for (id, earned) in [
            ("first_drive", self.total_distance > 10.0),
            ("speed_100", self.top_speed >= 100.0),
            ("speed_200", self.top_speed >= 200.0),
            ("speed_250", self.top_speed >= 250.0),
            ("drift_master", self.drift_score >= 5_000.0),
            ("rich", self.money >= 10_000.0),
            ("explorer", self.total_distance >= 20_000.0),
            ("combo_king", self.combo >= 10),
        ] {
            if earned {
                if let Some(name) = self.unlock(id) {
                    events.push(CareerEvent::AchievementUnlocked { name });
                }
            }
        }

        if let Some(event) = self.advance_mission(speed_kmh, distance, drifting, is_night) {
            events.push(event);
        }
        events
    }

    pub fn register_near_miss(&mut self) -> bool {
        if self.near_miss_cooldown > 0.0 {
            return false;
        }
        self.near_miss_cooldown = NEAR_MISS_COOLDOWN;
        self.near_misses += 1;
        self.add_score(50.0);
        self.extend_combo();
        true
    }

    fn advance_mission(
        &mut self,
        speed_kmh: f32,
        distance: f32,
        drifting: bool,
        is_night: bool,
    ) -> Option<CareerEvent> {
        let index = self.active_mission?;
        let mission = &MISSIONS[index];
        match mission.kind {
            MissionKind::TopSpeed => self.mission_progress = self.mission_progress.max(speed_kmh),
            MissionKind::Distance => self.mission_progress += distance,
            MissionKind::DriftScore => {
                if drifting {
                    self.mission_progress += speed_kmh * 0.01;
                }
            }
            MissionKind::NearMiss => self.mission_progress = self.near_misses as f32,
            MissionKind::NightDistance => {
                if is_night {
                    self.mission_progress += distance;
                }
            }
        }
        if self.mission_progress < mission.target {
            return None;
        }
        self.completed_missions.push(mission.id.to_string());
        self.money += mission.reward;
        self.add_score(mission.reward * 2.0);
        self.active_mission = None;
        self.mission_progress = 0.0;
        Some(CareerEvent::MissionCompleted {
            name: mission.name,
            reward: mission.reward,
        })
    }
}

/// Main career tick: drift scoring, combos, achievements, mission progress
/// and picking the next open mission.
pub fn career_update(
    time: Res<Time>,
    clock: Res<GameClock>,
    mut profile: ResMut<Profile>,
    mut events: EventWriter<CareerEvent>,
    mut notifications: EventWriter<Notification>,
    player: Single<(&Vehicle, &Velocity), With<PlayerCar>>,
) {
    let dt = time.delta_secs();
    let (vehicle, velocity) = *player;
    let speed_ms = Vec3::new(velocity.linvel.x, 0.0, velocity.linvel.z).length();
    let speed_kmh = speed_ms * MS_TO_KMH;

    if profile.active_mission.is_none() {
        let open: Vec<usize> = (0..MISSIONS.len())
            .filter(|&i| profile.mission_available(i))
            .collect();
        if let Some(&index) = open.choose(&mut rand::rng()) {
            profile.active_mission = Some(index);
            profile.mission_progress = 0.0;
            notifications.write(Notification::mission(format!(
                "New mission: {}",
                MISSIONS[index].name
            )));
        }
    }

    for event in profile.tick(dt, speed_kmh, speed_ms * dt, vehicle.drifting, clock.is_night()) {
        match &event {
            CareerEvent::AchievementUnlocked { name } => {
                info!("achievement unlocked: {name}");
                notifications.write(Notification::achievement(format!("Achievement: {name}")));
            }
            CareerEvent::MissionCompleted { name, reward } => {
                info!("mission complete: {name} (+{reward})");
                notifications.write(Notification::mission(format!(
                    "Mission complete: {name} +${reward:.0}"
                )));
            }
            CareerEvent::NearMiss => {}
        }
        events.write(event);
    }
}

/// Score races as they resolve.
pub fn score_race_updates(
    mut updates: EventReader<RaceUpdate>,
    mut profile: ResMut<Profile>,
    mut notifications: EventWriter<Notification>,
) {
    for update in updates.read() {
        match update {
            RaceUpdate::GatePassed { .. } => profile.add_score(100.0),
            RaceUpdate::Finished { time, new_record } => {
                profile.money += 500.0;
                profile.add_score(1_000.0);
                let mut text = format!(
                    "Race finished in {}",
                    crate::game_logic::checkpoint::format_time(*time)
                );
                if *new_record {
                    text.push_str(" - new record!");
                }
                notifications.write(Notification::achievement(text));
            }
            RaceUpdate::Started => {}
        }
    }
}

/// Squeak past ambient traffic at speed for bonus score.
pub fn detect_near_misses(
    mut profile: ResMut<Profile>,
    mut events: EventWriter<CareerEvent>,
    mut notifications: EventWriter<Notification>,
    player: Single<(&Transform, &Velocity), With<PlayerCar>>,
    traffic: Query<&GlobalTransform, With<TrafficCar>>,
) {
    let (transform, velocity) = *player;
    let speed_kmh =
        Vec3::new(velocity.linvel.x, 0.0, velocity.linvel.z).length() * MS_TO_KMH;
    if speed_kmh < NEAR_MISS_MIN_SPEED {
        return;
    }
    let pos = transform.translation;
    let close = traffic.iter().any(|t| {
        let c = t.translation();
        Vec2::new(pos.x - c.x, pos.z - c.z).length() < NEAR_MISS_RADIUS
    });
    if close && profile.register_near_miss() {
        notifications.write(Notification::bonus("Near miss! +50"));
        events.write(CareerEvent::NearMiss);
    }
}
