use crate::game_logic::vehicle::{CarStats, PlayerCar, Vehicle};
use crate::hud::Notification;
use crate::progression::Profile;
use bevy::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpgradeTrack {
    Engine,
    Turbo,
    Suspension,
    Brakes,
    Tires,
    Nitro,
}

pub const TRACKS: [UpgradeTrack; 6] = [
    UpgradeTrack::Engine,
    UpgradeTrack::Turbo,
    UpgradeTrack::Suspension,
    UpgradeTrack::Brakes,
    UpgradeTrack::Tires,
    UpgradeTrack::Nitro,
];

impl UpgradeTrack {
    pub fn label(self) -> &'static str {
        match self {
            UpgradeTrack::Engine => "Engine",
            UpgradeTrack::Turbo => "Turbo",
            UpgradeTrack::Suspension => "Suspension",
            UpgradeTrack::Brakes => "Brakes",
            UpgradeTrack::Tires => "Tires",
            UpgradeTrack::Nitro => "Nitro",
        }
    }

    pub fn max_level(self) -> u8 {
        match self {
            UpgradeTrack::Engine | UpgradeTrack::Nitro => 5,
            UpgradeTrack::Suspension | UpgradeTrack::Brakes => 4,
            UpgradeTrack::Turbo | UpgradeTrack::Tires => 3,
        }
    }

    pub fn base_cost(self) -> f32 {
        match self {
            UpgradeTrack::Engine => 1_000.0,
            UpgradeTrack::Turbo => 2_000.0,
            UpgradeTrack::Suspension => 800.0,
            UpgradeTrack::Brakes => 600.0,
            UpgradeTrack::Tires => 400.0,
            UpgradeTrack::Nitro => 1_500.0,
        }
    }
}

/// Bought upgrade levels per track. Persisted with the save file.
#[derive(Resource, Default, Clone)]
pub struct Garage {
    pub levels: [u8; 6],
}

impl Garage {
    pub fn level(&self, track: UpgradeTrack) -> u8 {
        self.levels[TRACKS.iter().position(|t| *t == track).unwrap_or(0)]
    }

    /// Next-level price, None at max. Prices grow geometrically.
    pub fn cost(&self, track: UpgradeTrack) -> Option<f32> {
        let level = self.level(track);
        if level >= track.max_level() {
            return None;
        }
        Some((track.base_cost() * 1.5_f32.powi(level as i32)).floor())
    }

    /// Spend from the wallet and bump the track. False when maxed or broke.
    pub fn purchase(&mut self, track: UpgradeTrack, money: &mut f32) -> bool {
        let Some(cost) = self.cost(track) else {
            return false;
        };
        if *money < cost {
            return false;
        }
        *money -= cost;
        let index = TRACKS.iter().position(|t| *t == track).unwrap_or(0);
        self.levels[index] += 1;
        true
    }

    /// Fold every bought level into a chassis. The base stats stay pristine
    /// so upgrades never compound across recomputes.
    pub fn apply(&self, base: &CarStats) -> CarStats {
        let mut stats = base.clone();
        let engine = self.level(UpgradeTrack::Engine) as f32;
        stats.max_speed_kmh *= 1.0 + engine * 0.15;
        stats.engine_force *= 1.0 + engine * 0.12;

        let turbo = self.level(UpgradeTrack::Turbo) as f32;
        stats.engine_force *= 1.0 + turbo * 0.25;

        let suspension = self.level(UpgradeTrack::Suspension) as f32;
        stats.handling *= 1.0 + suspension * 0.2;

        let brakes = self.level(UpgradeTrack::Brakes) as f32;
        stats.brake_grip *= 1.0 + brakes * 0.2;

        let tires = self.level(UpgradeTrack::Tires) as f32;
        stats.handling *= 1.0 + tires * 0.15;
        stats.brake_grip *= 1.0 + tires * 0.075;

        let nitro = self.level(UpgradeTrack::Nitro) as f32;
        stats.nitro_capacity = 100.0 + nitro * 20.0;
        stats.nitro_regen = base.nitro_regen + nitro * 2.0;
        stats
    }
}

/// Chassis stats before upgrades, the input to Garage::apply.
#[derive(Resource)]
pub struct BaseStats(pub CarStats);

impl Default for BaseStats {
    fn default() -> Self {
        Self(CarStats::from_env())
    }
}

/// Number keys buy upgrades while the car is stopped, garage style.
pub fn purchase_upgrades(
    keyboard: Res<ButtonInput<KeyCode>>,
    base: Res<BaseStats>,
    mut garage: ResMut<Garage>,
    mut profile: ResMut<Profile>,
    mut notifications: EventWriter<Notification>,
    mut player: Single<&mut Vehicle, With<PlayerCar>>,
) {
    let bindings = [
        (KeyCode::Digit1, UpgradeTrack::Engine),
        (KeyCode::Digit2, UpgradeTrack::Turbo),
        (KeyCode::Digit3, UpgradeTrack::Suspension),
        (KeyCode::Digit4, UpgradeTrack::Brakes),
        (KeyCode::Digit5, UpgradeTrack::Tires),
        (KeyCode::Digit6, UpgradeTrack::Nitro),
    ];
    for (key, track) in bindings {
        if !keyboard.just_pressed(key) {
            continue;
        }
        let quoted = garage.cost(track);
        if garage.purchase(track, &mut profile.money) {
            player.stats = garage.apply(&base.0);
            player.nitro = player.nitro.min(player.stats.nitro_capacity);
            info!(
                "bought {} level {}",
                track.label(),
                garage.level(track)
            );
            notifications.write(Notification::info(format!(
                "{} upgraded to level {}",
                track.label(),
                garage.level(track)
            )));
        } else if let Some(cost) = quoted {
            notifications.write(Notification::warn(format!(
                "Need ${cost:.0} for {}",
                track.label()
            )));
        } else {
            notifications.write(Notification::info(format!(
                "{} is maxed out",
                track.label()
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn costs_grow_geometrically() {
        let mut garage = Garage::default();
        assert_eq!(garage.cost(UpgradeTrack::Engine), Some(1_000.0));
        let mut money = 100_000.0;
        assert!(garage.purchase(UpgradeTrack::Engine, &mut money));
        assert_eq!(garage.cost(UpgradeTrack::Engine), Some(1_500.0));
        assert!(garage.purchase(UpgradeTrack::Engine, &mut money));
        assert_eq!(garage.cost(UpgradeTrack::Engine), Some(2_250.0));
    }

    #[test]
    fn maxed_track_refuses_purchase() {
        let mut garage = Garage::default();
        let mut money = 1_000_000.0;
        for _ in 0..UpgradeTrack::Tires.max_level() {
            assert!(garage.purchase(UpgradeTrack::Tires, &mut money));
        }
        assert_eq!(garage.cost(UpgradeTrack::Tires), None);
        assert!(!garage.purchase(UpgradeTrack::Tires, &mut money));
    }

    #[test]
    fn broke_wallet_is_left_alone() {
        let mut garage = Garage::default();
        let mut money = 10.0;
        assert!(!garage.purchase(UpgradeTrack::Engine, &mut money));
        assert_eq!(money, 10.0);
        assert_eq!(garage.level(UpgradeTrack::Engine), 0);
    }

    #[test]
    fn apply_never_compounds() {
        let mut garage = Garage::default();
        let mut money = 100_000.0;
        garage.purchase(UpgradeTrack::Engine, &mut money);
        let base = CarStats::default();
        let once = garage.apply(&base);
        let twice = garage.apply(&base);
        assert_eq!(once.max_speed_kmh, twice.max_speed_kmh);
        assert!(once.max_speed_kmh > base.max_speed_kmh);
    }

    #[test]
    fn nitro_track_grows_capacity_and_regen() {
        let mut garage = Garage::default();
        let mut money = 1_000_000.0;
        for _ in 0..5 {
            garage.purchase(UpgradeTrack::Nitro, &mut money);
        }
        let stats = garage.apply(&CarStats::default());
        assert_eq!(stats.nitro_capacity, 200.0);
        assert_eq!(stats.nitro_regen, CarStats::default().nitro_regen + 10.0);
    }
}
