use crate::game_logic::chunk::RoadAxis;
use crate::game_logic::constants::*;
use bevy::prelude::*;

/// Ambient lane traffic. The agent lives as a child of its chunk root and
/// moves in chunk-local space, so unloading the chunk takes it along.
#[derive(Component)]
pub struct TrafficCar {
    pub axis: RoadAxis,
    /// +1.0 or -1.0 along the axis.
    pub direction: f32,
    /// meters per second
    pub speed: f32,
}

/// Advance a lane position and wrap it inside chunk-local bounds.
pub fn advance_along_lane(along: f32, speed: f32, direction: f32, dt: f32) -> f32 {
    let half = CHUNK_SIZE / 2.0;
    let next = along + speed * direction * dt;
    // wrap into [-half, half)
    (next + half).rem_euclid(CHUNK_SIZE) - half
}

pub fn drive_traffic(time: Res<Time>, mut cars: Query<(&TrafficCar, &mut Transform)>) {
    let dt = time.delta_secs();
    for (car, mut transform) in cars.iter_mut() {
        match car.axis {
            RoadAxis::EastWest => {
                transform.translation.x =
                    advance_along_lane(transform.translation.x, car.speed, car.direction, dt);
            }
            RoadAxis::NorthSouth => {
                transform.translation.z =
                    advance_along_lane(transform.translation.z, car.speed, car.direction, dt);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_motion_accumulates() {
        let mut along = 0.0;
        for _ in 0..10 {
            along = advance_along_lane(along, 10.0, 1.0, 0.1);
        }
        assert!((along - 10.0).abs() < 1e-3);
    }

    #[test]
    fn wraps_at_chunk_edge() {
        let half = CHUNK_SIZE / 2.0;
        let along = advance_along_lane(half - 1.0, 10.0, 1.0, 0.5);
        assert!(along < 0.0, "expected wrap past the edge, got {along}");
    }

    #[test]
    fn reverse_direction_wraps_the_other_way() {
        let half = CHUNK_SIZE / 2.0;
        let along = advance_along_lane(-half + 1.0, 10.0, -1.0, 0.5);
        assert!(along > 0.0, "expected wrap past the near edge, got {along}");
    }
}
