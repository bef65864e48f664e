use crate::game_logic::checkpoint::RaceUpdate;
use crate::game_logic::vehicle::{DamageEvent, PlayerCar, Vehicle};
use crate::progression::CareerEvent;
use bevy::audio::{AudioSink, AudioSinkPlayback, PlaybackMode, Volume};
use bevy::prelude::*;

/// Named one-shot effects; the mixer maps them to files.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEffect {
    Crash,
    Checkpoint,
    Achievement,
    NearMiss,
}

impl AudioEffect {
    fn path(self) -> &'static str {
        match self {
            AudioEffect::Crash => "sounds/crash.ogg",
            AudioEffect::Checkpoint => "sounds/coin.ogg",
            AudioEffect::Achievement => "sounds/achievement.ogg",
            AudioEffect::NearMiss => "sounds/whoosh.ogg",
        }
    }
}

/// Looping engine bed whose pitch tracks the tach.
#[derive(Component)]
pub struct EngineAudio;

pub fn setup_audio(mut commands: Commands, asset_server: Res<AssetServer>) {
    commands.spawn((
        EngineAudio,
        AudioPlayer::new(asset_server.load("sounds/engine.ogg")),
        PlaybackSettings {
            mode: PlaybackMode::Loop,
            volume: Volume::Linear(0.0),
            ..default()
        },
    ));
}

/// Collapse game events into one-shot effect requests.
pub fn route_audio_events(
    mut damage: EventReader<DamageEvent>,
    mut races: EventReader<RaceUpdate>,
    mut career: EventReader<CareerEvent>,
    mut effects: EventWriter<AudioEffect>,
) {
    if damage.read().next().is_some() {
        effects.write(AudioEffect::Crash);
    }
    for update in races.read() {
        match update {
            RaceUpdate::GatePassed { .. } => {
                effects.write(AudioEffect::Checkpoint);
            }
            RaceUpdate::Finished { .. } => {
                effects.write(AudioEffect::Achievement);
            }
            RaceUpdate::Started => {}
        }
    }
    for event in career.read() {
        match event {
            CareerEvent::AchievementUnlocked { .. } | CareerEvent::MissionCompleted { .. } => {
                effects.write(AudioEffect::Achievement);
            }
            CareerEvent::NearMiss => {
                effects.write(AudioEffect::NearMiss);
            }
        }
    }
}

pub fn play_effects(
    mut commands: Commands,
    mut effects: EventReader<AudioEffect>,
    asset_server: Res<AssetServer>,
) {
    for effect in effects.read() {
        commands.spawn((
            AudioPlayer::new(asset_server.load(effect.path())),
            PlaybackSettings::DESPAWN,
        ));
    }
}

/// Pitch and volume follow the tach; silence when the engine is off.
pub fn update_engine_audio(
    player: Single<&Vehicle, With<PlayerCar>>,
    mut engine: Single<&mut AudioSink, With<EngineAudio>>,
) {
    if player.engine_running() {
        engine.set_speed(0.6 + player.gearbox.rpm_ratio() * 1.4);
        engine.set_volume(Volume::Linear(0.25 + player.gearbox.rpm_ratio() * 0.35));
    } else {
        engine.set_volume(Volume::Linear(0.0));
    }
}
