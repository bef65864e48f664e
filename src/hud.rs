use crate::game_logic::checkpoint::{format_time, RaceState};
use crate::game_logic::clock::GameClock;
use crate::game_logic::constants::*;
use crate::game_logic::police::PursuitState;
use crate::game_logic::vehicle::{EngineState, PlayerCar, Vehicle};
use crate::progression::Profile;
use bevy::prelude::*;
use bevy_rapier3d::prelude::Velocity;

const NOTIFICATION_TTL: f32 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteKind {
    Info,
    Warn,
    Achievement,
    Mission,
    Bonus,
}

/// One-shot HUD banner. Anything in the game can fire these.
#[derive(Event, Debug)]
pub struct Notification {
    pub text: String,
    pub kind: NoteKind,
}

impl Notification {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NoteKind::Info,
        }
    }
    pub fn warn(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NoteKind::Warn,
        }
    }
    pub fn achievement(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NoteKind::Achievement,
        }
    }
    pub fn mission(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NoteKind::Mission,
        }
    }
    pub fn bonus(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NoteKind::Bonus,
        }
    }

    fn color(&self) -> Color {
        match self.kind {
            NoteKind::Info => Color::WHITE,
            NoteKind::Warn => Color::srgb(1.0, 0.45, 0.3),
            NoteKind::Achievement => Color::srgb(1.0, 0.85, 0.2),
            NoteKind::Mission => Color::srgb(0.4, 0.8, 1.0),
            NoteKind::Bonus => Color::srgb(0.5, 1.0, 0.5),
        }
    }
}

/// Everything the HUD draws in one frame, assembled from the simulation and
/// pushed into the text nodes. The HUD never writes game state back.
#[derive(Default)]
pub struct HudSnapshot {
    pub speed_kmh: f32,
    pub gear: i8,
    pub rpm: f32,
    pub fuel: f32,
    pub fuel_capacity: f32,
    pub health: f32,
    pub nitro: f32,
    pub nitro_capacity: f32,
    pub engine_on: bool,
    pub money: f32,
    pub score: u64,
    pub combo_multiplier: f32,
    pub wanted: f32,
    pub hour: f32,
    pub race_time: Option<f32>,
}

impl HudSnapshot {
    pub fn gear_label(&self) -> String {
        match self.gear {
            -1 => "R".to_string(),
            0 => "N".to_string(),
            g => g.to_string(),
        }
    }

    pub fn clock_label(&self) -> String {
        let hour = self.hour as u32;
        let minute = ((self.hour - hour as f32) * 60.0) as u32;
        format!("{hour:02}:{minute:02}")
    }

    pub fn wanted_stars(&self) -> String {
        "*".repeat(self.wanted.floor() as usize)
    }
}

#[derive(Component)]
pub struct DashboardText;

#[derive(Component)]
pub struct StatusText;

#[derive(Component)]
pub struct NotificationArea;

#[derive(Component)]
pub struct NotificationItem {
    remaining: f32,
}

pub fn setup_hud(mut commands: Commands) {
    let font = TextFont {
        font_size: 22.0,
        ..default()
    };

    commands.spawn((
        DashboardText,
        Text::new(""),
        font.clone(),
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(16.0),
            bottom: Val::Px(16.0),
            ..default()
        },
    ));

    commands.spawn((
        StatusText,
        Text::new(""),
        font,
        TextColor(Color::srgb(1.0, 0.9, 0.5)),
        Node {
            position_type: PositionType::Absolute,
            right: Val::Px(16.0),
            top: Val::Px(16.0),
            ..default()
        },
    ));

    commands.spawn((
        NotificationArea,
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(0.0),
            right: Val::Px(0.0),
            top: Val::Px(60.0),
            flex_direction: FlexDirection::Column,
            align_items: AlignItems::Center,
            row_gap: Val::Px(4.0),
            ..default()
        },
    ));
}

/// Assemble the snapshot and redraw both text blocks.
pub fn update_hud(
    race: Res<RaceState>,
    clock: Res<GameClock>,
    pursuit: Res<PursuitState>,
    profile: Res<Profile>,
    player: Single<(&Vehicle, &Velocity), With<PlayerCar>>,
    mut dashboard: Single<&mut Text, (With<DashboardText>, Without<StatusText>)>,
    mut status: Single<&mut Text, (With<StatusText>, Without<DashboardText>)>,
) {
    let (vehicle, velocity) = *player;
    let snapshot = HudSnapshot {
        speed_kmh: Vec3::new(velocity.linvel.x, 0.0, velocity.linvel.z).length() * MS_TO_KMH,
        gear: vehicle.gearbox.gear,
        rpm: vehicle.gearbox.rpm,
        fuel: vehicle.fuel,
        fuel_capacity: vehicle.stats.fuel_capacity,
        health: vehicle.health,
        nitro: vehicle.nitro,
        nitro_capacity: vehicle.stats.nitro_capacity,
        engine_on: vehicle.engine == EngineState::Running,
        money: profile.money,
        score: profile.score,
        combo_multiplier: profile.combo_multiplier,
        wanted: pursuit.wanted,
        hour: clock.hour,
        race_time: race.racing().then_some(race.elapsed),
    };

    let engine = if snapshot.engine_on { "" } else { " [ENGINE OFF]" };
    dashboard.0 = format!(
        "{:3.0} km/h  gear {}  {:4.0} rpm{engine}\nfuel {:3.0}/{:3.0}  hull {:3.0}  nitro {:3.0}/{:3.0}",
        snapshot.speed_kmh,
        snapshot.gear_label(),
        snapshot.rpm,
        snapshot.fuel,
        snapshot.fuel_capacity,
        snapshot.health,
        snapshot.nitro,
        snapshot.nitro_capacity,
    );

    let mut lines = vec![format!(
        "${:.0}  score {}  {}",
        snapshot.money,
        snapshot.score,
        snapshot.clock_label()
    )];
    if snapshot.combo_multiplier > 1.0 {
        lines.push(format!("combo x{:.1}", snapshot.combo_multiplier));
    }
    if snapshot.wanted >= 1.0 {
        lines.push(format!("WANTED {}", snapshot.wanted_stars()));
    }
    if let Some(elapsed) = snapshot.race_time {
        lines.push(format!("race {}", format_time(elapsed)));
    }
    status.0 = lines.join("\n");
}

/// Materialize incoming notifications as fading text rows.
pub fn show_notifications(
    mut commands: Commands,
    mut events: EventReader<Notification>,
    area: Single<Entity, With<NotificationArea>>,
) {
    for note in events.read() {
        let row = commands
            .spawn((
                NotificationItem {
                    remaining: NOTIFICATION_TTL,
                },
                Text::new(note.text.clone()),
                TextFont {
                    font_size: 26.0,
                    ..default()
                },
                TextColor(note.color()),
            ))
            .id();
        commands.entity(*area).add_child(row);
    }
}

pub fn expire_notifications(
    time: Res<Time>,
    mut commands: Commands,
    mut items: Query<(Entity, &mut NotificationItem, &mut TextColor)>,
) {
    for (entity, mut item, mut color) in items.iter_mut() {
        item.remaining -= time.delta_secs();
        if item.remaining <= 0.0 {
            commands.entity(entity).despawn();
        } else if item.remaining < 1.0 {
            color.0 = color.0.with_alpha(item.remaining);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gear_labels() {
        let mut snapshot = HudSnapshot {
            gear: -1,
            ..default()
        };
        assert_eq!(snapshot.gear_label(), "R");
        snapshot.gear = 0;
        assert_eq!(snapshot.gear_label(), "N");
        snapshot.gear = 4;
        assert_eq!(snapshot.gear_label(), "4");
    }

    #[test]
    fn clock_label_is_hh_mm() {
        let snapshot = HudSnapshot {
            hour: 9.75,
            ..default()
        };
        assert_eq!(snapshot.clock_label(), "09:45");
    }

    #[test]
    fn wanted_stars_floor_the_level() {
        let snapshot = HudSnapshot {
            wanted: 2.7,
            ..default()
        };
        assert_eq!(snapshot.wanted_stars(), "**");
    }
}
