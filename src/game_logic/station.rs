use crate::game_logic::constants::*;
use crate::game_logic::streaming::GasStation;
use crate::game_logic::vehicle::{PlayerCar, Vehicle};
use crate::hud::Notification;
use crate::progression::Profile;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

/// A running fill-and-repair. Fuel and hull are topped up over the full
/// service window; money is charged as units are delivered, so driving off
/// early pays only for what was pumped.
pub struct ServiceJob {
    pub remaining: f32,
    pub fuel_rate: f32,
    pub repair_rate: f32,
}

impl ServiceJob {
    /// Rates sized so the whole deficit is delivered over the service window.
    pub fn plan(fuel_missing: f32, health_missing: f32) -> Option<Self> {
        if fuel_missing <= 0.5 && health_missing <= 0.5 {
            return None;
        }
        Some(Self {
            remaining: SERVICE_DURATION,
            fuel_rate: fuel_missing / SERVICE_DURATION,
            repair_rate: health_missing / SERVICE_DURATION,
        })
    }

    /// Full-service price shown when the pump engages.
    pub fn quote(fuel_missing: f32, health_missing: f32) -> u32 {
        (fuel_missing * FUEL_PRICE_PER_UNIT).ceil() as u32
            + (health_missing * REPAIR_PRICE_PER_UNIT).ceil() as u32
    }

    pub fn cost_per_second(&self) -> f32 {
        self.fuel_rate * FUEL_PRICE_PER_UNIT + self.repair_rate * REPAIR_PRICE_PER_UNIT
    }

    /// One service step, limited by the money available. Returns
    /// (fuel added, health added, money spent, finished).
    pub fn tick(&mut self, dt: f32, money: f32) -> (f32, f32, f32, bool) {
        let full_step = dt.min(self.remaining);
        let affordable = (money / self.cost_per_second()).max(0.0);
        let step = full_step.min(affordable);
        self.remaining -= step;
        let spent = step * self.cost_per_second();
        // finished, or the wallet could not cover the full step
        let done = self.remaining <= 1e-4 || step + 1e-6 < full_step;
        (self.fuel_rate * step, self.repair_rate * step, spent, done)
    }
}

#[derive(Resource, Default)]
pub struct StationService {
    pub job: Option<ServiceJob>,
}

/// Engage the pump when the player is parked at a station, deliver fuel and
/// repairs over the service window, and charge as delivered.
pub fn gas_station_service(
    time: Res<Time>,
    mut service: ResMut<StationService>,
    mut profile: ResMut<Profile>,
    mut notifications: EventWriter<Notification>,
    mut player: Single<(&Transform, &Velocity, &mut Vehicle), With<PlayerCar>>,
    stations: Query<&GlobalTransform, With<GasStation>>,
) {
    let (transform, velocity, vehicle) = &mut *player;
    let pos = transform.translation;
    let speed_kmh = Vec3::new(velocity.linvel.x, 0.0, velocity.linvel.z).length() * MS_TO_KMH;

    let in_range = stations.iter().any(|station| {
        let s = station.translation();
        Vec2::new(pos.x - s.x, pos.z - s.z).length() < STATION_RANGE
    });
    let parked = in_range && speed_kmh < STATION_MAX_SPEED;

    if !parked {
        if service.job.take().is_some() {
            notifications.write(Notification::info("Service interrupted"));
        }
        return;
    }

    if service.job.is_none() {
        let fuel_missing = vehicle.stats.fuel_capacity - vehicle.fuel;
        let health_missing = 100.0 - vehicle.health;
        if let Some(job) = ServiceJob::plan(fuel_missing, health_missing) {
            let quote = ServiceJob::quote(fuel_missing, health_missing);
            info!("pump engaged, quote ${quote}");
            notifications.write(Notification::info(format!("Servicing... ${quote}")));
            service.job = Some(job);
        }
        return;
    }

    let Some(job) = service.job.as_mut() else {
        return;
    };
    let (fuel, repair, spent, done) = job.tick(time.delta_secs(), profile.money);
    vehicle.fuel = (vehicle.fuel + fuel).min(vehicle.stats.fuel_capacity);
    vehicle.health = (vehicle.health + repair).min(100.0);
    profile.money -= spent;

    if done {
        service.job = None;
        if profile.money < 1.0 && vehicle.fuel < vehicle.stats.fuel_capacity - 0.5 {
            notifications.write(Notification::warn("Out of money"));
        } else {
            notifications.write(Notification::info("Tank full, hull repaired"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_job_when_nothing_is_missing() {
        assert!(ServiceJob::plan(0.0, 0.0).is_none());
        assert!(ServiceJob::plan(0.3, 0.2).is_none());
    }

    #[test]
    fn quote_charges_both_lines() {
        // 40 fuel at 0.5 plus 30 hull at 1.0
        assert_eq!(ServiceJob::quote(40.0, 30.0), 50);
        assert_eq!(ServiceJob::quote(1.1, 0.0), 1);
    }

    #[test]
    fn full_service_fills_the_deficit() {
        let mut job = ServiceJob::plan(60.0, 40.0).expect("deficit present");
        let mut fuel = 0.0;
        let mut health = 0.0;
        let mut spent = 0.0;
        for _ in 0..50 {
            let (f, h, s, done) = job.tick(0.1, 1_000.0);
            fuel += f;
            health += h;
            spent += s;
            if done {
                break;
            }
        }
        assert!((fuel - 60.0).abs() < 1e-2);
        assert!((health - 40.0).abs() < 1e-2);
        assert!((spent - 70.0).abs() < 1e-2);
    }

    #[test]
    fn empty_wallet_stops_the_pump() {
        let mut job = ServiceJob::plan(60.0, 0.0).expect("deficit present");
        let (fuel, _, spent, done) = job.tick(SERVICE_DURATION, 3.0);
        assert!(done);
        assert!(spent <= 3.0 + 1e-3);
        assert!(fuel < 60.0);
        // fuel delivered matches money spent at the posted rate
        assert!((spent - fuel * FUEL_PRICE_PER_UNIT).abs() < 1e-3);
    }
}
