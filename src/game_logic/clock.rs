use crate::game_logic::constants::*;
use bevy::pbr::{DistanceFog, FogFalloff};
use bevy::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DayPeriod {
    Dawn,
    Day,
    Dusk,
    Night,
}

/// Atmospheric mode. Cosmetic: it drives fog and sky tint, never physics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Weather {
    #[default]
    Clear,
    Rain,
    Fog,
}

/// In-game time of day, hours in [0, 24).
#[derive(Resource)]
pub struct GameClock {
    pub hour: f32,
    pub weather: Weather,
}

impl Default for GameClock {
    fn default() -> Self {
        Self {
            hour: 10.0,
            weather: Weather::Clear,
        }
    }
}

impl GameClock {
    pub fn advance(&mut self, dt: f32) {
        self.hour = (self.hour + dt * TIME_SPEED / 60.0).rem_euclid(24.0);
    }

    /// Sun strength: a smooth arc between 6:00 and 18:00, a fixed moonlit
    /// floor at night.
    pub fn sun_intensity(&self) -> f32 {
        if (6.0..18.0).contains(&self.hour) {
            let arc = ((self.hour - 6.0) / 12.0 * std::f32::consts::PI).sin();
            0.08 + 0.92 * arc
        } else {
            0.08
        }
    }

    pub fn period(&self) -> DayPeriod {
        match self.hour {
            h if (5.0..8.0).contains(&h) => DayPeriod::Dawn,
            h if (8.0..17.0).contains(&h) => DayPeriod::Day,
            h if (17.0..20.0).contains(&h) => DayPeriod::Dusk,
            _ => DayPeriod::Night,
        }
    }

    pub fn is_night(&self) -> bool {
        self.period() == DayPeriod::Night
    }
}

#[derive(Component)]
pub struct Sun;

pub fn advance_clock(time: Res<Time>, mut clock: ResMut<GameClock>) {
    clock.advance(time.delta_secs());
}

pub fn cycle_weather(keyboard: Res<ButtonInput<KeyCode>>, mut clock: ResMut<GameClock>) {
    if keyboard.just_pressed(KeyCode::KeyT) {
        clock.weather = match clock.weather {
            Weather::Clear => Weather::Rain,
            Weather::Rain => Weather::Fog,
            Weather::Fog => Weather::Clear,
        };
        info!("weather set to {:?}", clock.weather);
    }
}

/// Push the clock into the light rig and the camera fog.
pub fn apply_lighting(
    clock: Res<GameClock>,
    mut sun: Single<(&mut DirectionalLight, &mut Transform), With<Sun>>,
    mut ambient: ResMut<AmbientLight>,
    mut fog: Single<&mut DistanceFog>,
    mut clear_color: ResMut<ClearColor>,
) {
    let intensity = clock.sun_intensity();
    let (light, transform) = &mut *sun;
    light.illuminance = 2_000.0 + 98_000.0 * intensity;

    // sun swings east to west over the daytime arc
    let sun_angle = (clock.hour - 6.0) / 12.0 * std::f32::consts::PI;
    **transform = Transform::from_rotation(
        Quat::from_rotation_z(-sun_angle.max(0.1)) * Quat::from_rotation_x(-0.6),
    );

    ambient.brightness = 60.0 + 340.0 * intensity;

    let sky = match clock.period() {
        DayPeriod::Dawn => Color::srgb(0.85, 0.55, 0.40),
        DayPeriod::Day => Color::srgb(0.45, 0.70, 0.95),
        DayPeriod::Dusk => Color::srgb(0.70, 0.40, 0.45),
        DayPeriod::Night => Color::srgb(0.03, 0.04, 0.10),
    };
    let (fog_color, fog_start, fog_end) = match clock.weather {
        Weather::Clear => (sky, 180.0, 420.0),
        Weather::Rain => (Color::srgb(0.35, 0.38, 0.42), 90.0, 260.0),
        Weather::Fog => (Color::srgb(0.65, 0.66, 0.68), 25.0, 120.0),
    };
    clear_color.0 = sky;
    fog.color = fog_color;
    fog.falloff = FogFalloff::Linear {
        start: fog_start,
        end: fog_end,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_wraps_at_midnight() {
        let mut clock = GameClock {
            hour: 23.5,
            weather: Weather::Clear,
        };
        // one real minute is one game hour at the default multiplier
        clock.advance(60.0);
        assert!((clock.hour - 0.5).abs() < 1e-4);
    }

    #[test]
    fn noon_is_the_brightest_hour() {
        let noon = GameClock {
            hour: 12.0,
            weather: Weather::Clear,
        };
        let morning = GameClock {
            hour: 8.0,
            weather: Weather::Clear,
        };
        assert!(noon.sun_intensity() > morning.sun_intensity());
        assert!((noon.sun_intensity() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn night_has_a_fixed_floor() {
        for hour in [0.0, 3.0, 19.5, 23.0] {
            let clock = GameClock {
                hour,
                weather: Weather::Clear,
            };
            assert_eq!(clock.sun_intensity(), 0.08);
        }
    }

    #[test]
    fn period_buckets() {
        let mut clock = GameClock::default();
        let cases = [
            (6.5, DayPeriod::Dawn),
            (12.0, DayPeriod::Day),
            (18.0, DayPeriod::Dusk),
            (2.0, DayPeriod::Night),
            (22.0, DayPeriod::Night),
        ];
        for (hour, period) in cases {
            clock.hour = hour;
            assert_eq!(clock.period(), period, "hour {hour}");
        }
    }

    #[test]
    fn weather_never_touches_the_period() {
        let mut clock = GameClock {
            hour: 12.0,
            weather: Weather::Fog,
        };
        assert_eq!(clock.period(), DayPeriod::Day);
        clock.weather = Weather::Rain;
        assert_eq!(clock.period(), DayPeriod::Day);
    }
}
