mod audio;
mod camera;
mod game_logic;
mod hud;
mod progression;
mod save;
mod tuning;

use audio::{play_effects, route_audio_events, setup_audio, update_engine_audio, AudioEffect};
use bevy::{prelude::*, window::PresentMode};
use bevy_rapier3d::prelude::*;
use camera::{follow_camera, spawn_camera};
use game_logic::checkpoint::{
    animate_gates, race_progress, start_race_on_key, RaceState, RaceUpdate,
};
use game_logic::clock::{advance_clock, apply_lighting, cycle_weather, GameClock};
use game_logic::constants::MAX_FRAME_DELTA_MS;
use game_logic::police::{police_pursuit, PursuitState};
use game_logic::station::{gas_station_service, StationService};
use game_logic::streaming::{animate_traffic_lights, stream_chunks, WorldStreamer};
use game_logic::traffic::drive_traffic;
use game_logic::vehicle::{
    collision_damage, fade_drift_smoke, read_controls, spawn_drift_smoke, spawn_player,
    tilt_car_body, toggle_engine, vehicle_dynamics, DamageEvent, VehicleControls,
};
use hud::{expire_notifications, setup_hud, show_notifications, update_hud, Notification};
use progression::{career_update, detect_near_misses, score_race_updates, CareerEvent, Profile};
use save::{apply_saved_upgrades, autosave, load_career, save_on_exit, AutosaveTimer};
use std::time::Duration;
use tuning::{purchase_upgrades, BaseStats, Garage};

#[derive(States, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    #[default]
    Playing,
    Paused,
}

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Open Roads".into(),
                resolution: (1280.0, 720.0).into(),
                present_mode: PresentMode::AutoVsync,
                ..default()
            }),
            ..default()
        }))
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
        // fixed 1/60 inner step with carry-over keeps integration stable
        // across uneven frame times
        .insert_resource(TimestepMode::Interpolated {
            dt: 1.0 / 60.0,
            time_scale: 1.0,
            substeps: 1,
        })
        .init_state::<GameState>()
        .insert_resource(ClearColor(Color::srgb(0.45, 0.70, 0.95)))
        .insert_resource(AmbientLight {
            color: Color::WHITE,
            brightness: 300.0,
            ..default()
        })
        .init_resource::<VehicleControls>()
        .init_resource::<WorldStreamer>()
        .init_resource::<PursuitState>()
        .init_resource::<RaceState>()
        .init_resource::<GameClock>()
        .init_resource::<StationService>()
        .init_resource::<Profile>()
        .init_resource::<Garage>()
        .init_resource::<BaseStats>()
        .init_resource::<AutosaveTimer>()
        .add_event::<DamageEvent>()
        .add_event::<RaceUpdate>()
        .add_event::<CareerEvent>()
        .add_event::<Notification>()
        .add_event::<AudioEffect>()
        .add_systems(
            Startup,
            (
                clamp_frame_delta,
                spawn_camera,
                setup_hud,
                setup_audio,
                (spawn_player, load_career, apply_saved_upgrades).chain(),
            ),
        )
        .add_systems(
            Update,
            (
                read_controls,
                toggle_engine,
                vehicle_dynamics,
                collision_damage,
                tilt_car_body,
                spawn_drift_smoke,
                fade_drift_smoke,
                stream_chunks,
                drive_traffic,
                animate_traffic_lights,
            )
                .chain()
                .run_if(in_state(GameState::Playing)),
        )
        .add_systems(
            Update,
            (
                police_pursuit,
                start_race_on_key,
                race_progress,
                animate_gates,
                advance_clock,
                cycle_weather,
                gas_station_service,
                career_update,
                detect_near_misses,
                score_race_updates,
                purchase_upgrades,
            )
                .chain()
                .run_if(in_state(GameState::Playing)),
        )
        .add_systems(
            Update,
            (
                apply_lighting,
                follow_camera,
                update_hud,
                show_notifications,
                expire_notifications,
                route_audio_events,
                play_effects,
                update_engine_audio,
                autosave,
            ),
        )
        .add_systems(Update, (toggle_pause, save_on_exit))
        .run();
}

/// Long hitches integrate as one clamped step so forces stay bounded.
fn clamp_frame_delta(mut time: ResMut<Time<Virtual>>) {
    time.set_max_delta(Duration::from_millis(MAX_FRAME_DELTA_MS));
}

fn toggle_pause(
    keyboard: Res<ButtonInput<KeyCode>>,
    state: Res<State<GameState>>,
    mut next: ResMut<NextState<GameState>>,
    mut time: ResMut<Time<Virtual>>,
) {
    if !keyboard.just_pressed(KeyCode::Escape) {
        return;
    }
    match state.get() {
        GameState::Playing => {
            time.pause();
            next.set(GameState::Paused);
        }
        GameState::Paused => {
            time.unpause();
            next.set(GameState::Playing);
        }
    }
}
