use crate::game_logic::checkpoint::RaceState;
use crate::progression::Profile;
use crate::tuning::{BaseStats, Garage};
use bevy::app::AppExit;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const SAVE_PATH: &str = "open-roads-save.json";
const AUTOSAVE_INTERVAL: f32 = 30.0;

/// On-disk career state. Everything else is rebuilt from scratch each run.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct SaveData {
    pub money: f32,
    pub score: u64,
    pub total_distance: f32,
    pub top_speed: f32,
    pub drift_score: f32,
    pub best_race_time: Option<f32>,
    pub achievements: Vec<String>,
    pub completed_missions: Vec<String>,
    pub upgrades: [u8; 6],
}

impl SaveData {
    pub fn capture(profile: &Profile, garage: &Garage, race: &RaceState) -> Self {
        Self {
            money: profile.money,
            score: profile.score,
            total_distance: profile.total_distance,
            top_speed: profile.top_speed,
            drift_score: profile.drift_score,
            best_race_time: race.best_time,
            achievements: profile.unlocked.clone(),
            completed_missions: profile.completed_missions.clone(),
            upgrades: garage.levels,
        }
    }

    pub fn restore(&self, profile: &mut Profile, garage: &mut Garage, race: &mut RaceState) {
        profile.money = self.money;
        profile.score = self.score;
        profile.total_distance = self.total_distance;
        profile.top_speed = self.top_speed;
        profile.drift_score = self.drift_score;
        profile.unlocked = self.achievements.clone();
        profile.completed_missions = self.completed_missions.clone();
        garage.levels = self.upgrades;
        race.best_time = self.best_race_time;
    }
}

/// A corrupt or missing file falls back to a fresh career; never fatal.
pub fn read_save(path: &Path) -> SaveData {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(_) => return SaveData::default(),
    };
    match serde_json::from_str(&contents) {
        Ok(data) => data,
        Err(err) => {
            warn!("ignoring unreadable save file: {err}");
            SaveData::default()
        }
    }
}

pub fn write_save(path: &Path, data: &SaveData) {
    let json = match serde_json::to_string_pretty(data) {
        Ok(json) => json,
        Err(err) => {
            warn!("failed to serialize save: {err}");
            return;
        }
    };
    if let Err(err) = fs::write(path, json) {
        warn!("failed to write save file: {err}");
    }
}

#[derive(Resource)]
pub struct AutosaveTimer(pub Timer);

impl Default for AutosaveTimer {
    fn default() -> Self {
        Self(Timer::from_seconds(AUTOSAVE_INTERVAL, TimerMode::Repeating))
    }
}

pub fn load_career(
    mut profile: ResMut<Profile>,
    mut garage: ResMut<Garage>,
    mut race: ResMut<RaceState>,
) {
    let data = read_save(Path::new(SAVE_PATH));
    data.restore(&mut profile, &mut garage, &mut race);
    info!(
        "career loaded: ${:.0}, {} achievements",
        profile.money,
        profile.unlocked.len()
    );
}

/// Recompute the chassis from saved upgrade levels after load.
pub fn apply_saved_upgrades(
    base: Res<BaseStats>,
    garage: Res<Garage>,
    mut player: Single<&mut crate::game_logic::vehicle::Vehicle>,
) {
    player.stats = garage.apply(&base.0);
}

pub fn autosave(
    time: Res<Time>,
    mut timer: ResMut<AutosaveTimer>,
    profile: Res<Profile>,
    garage: Res<Garage>,
    race: Res<RaceState>,
) {
    if timer.0.tick(time.delta()).just_finished() {
        write_save(
            Path::new(SAVE_PATH),
            &SaveData::capture(&profile, &garage, &race),
        );
    }
}

pub fn save_on_exit(
    mut exits: EventReader<AppExit>,
    profile: Res<Profile>,
    garage: Res<Garage>,
    race: Res<RaceState>,
) {
    if exits.read().next().is_some() {
        write_save(
            Path::new(SAVE_PATH),
            &SaveData::capture(&profile, &garage, &race),
        );
        info!("career saved");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_resources() {
        let mut profile = Profile::default();
        profile.money = 4_321.0;
        profile.score = 9_000;
        profile.unlocked = vec!["speed_100".to_string()];
        let mut garage = Garage::default();
        garage.levels = [1, 0, 2, 0, 0, 3];
        let mut race = RaceState::default();
        race.best_time = Some(52.4);

        let data = SaveData::capture(&profile, &garage, &race);

        let mut profile2 = Profile::default();
        let mut garage2 = Garage::default();
        let mut race2 = RaceState::default();
        data.restore(&mut profile2, &mut garage2, &mut race2);

        assert_eq!(profile2.money, 4_321.0);
        assert_eq!(profile2.score, 9_000);
        assert_eq!(profile2.unlocked, vec!["speed_100".to_string()]);
        assert_eq!(garage2.levels, [1, 0, 2, 0, 0, 3]);
        assert_eq!(race2.best_time, Some(52.4));
    }

    #[test]
    fn survives_json_round_trip() {
        let data = SaveData {
            money: 77.5,
            best_race_time: Some(61.25),
            upgrades: [5, 3, 4, 4, 3, 5],
            ..Default::default()
        };
        let json = serde_json::to_string(&data).unwrap();
        let back: SaveData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let data = read_save(Path::new("definitely-not-a-real-save.json"));
        assert_eq!(data, SaveData::default());
    }
}
