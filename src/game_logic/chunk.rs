use crate::game_logic::constants::*;

/// Deterministic per-chunk random stream.
///
/// A chunk coordinate seeds a small linear-congruential generator, so
/// unloading and reloading a chunk reproduces identical content without
/// ever persisting it. Determinism is a property of this type, not a
/// convention callers have to uphold.
#[derive(Clone, Debug)]
pub struct SeededRng {
    seed: i64,
}

impl SeededRng {
    pub fn for_chunk(chunk_x: i32, chunk_z: i32) -> Self {
        Self {
            seed: chunk_x as i64 * 10_000 + chunk_z as i64,
        }
    }

    /// Next value in [0, 1).
    pub fn next(&mut self) -> f32 {
        // euclidean remainder keeps negative coordinates deterministic too
        self.seed = (self.seed * 9301 + 49297).rem_euclid(233_280);
        self.seed as f32 / 233_280.0
    }

    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + self.next() * (hi - lo)
    }

    /// Inclusive integer range.
    pub fn int_range(&mut self, lo: i32, hi: i32) -> i32 {
        let span = (hi - lo + 1) as f32;
        (lo + (self.next() * span) as i32).min(hi)
    }

    pub fn chance(&mut self, p: f32) -> bool {
        self.next() < p
    }
}

/// Which world axis a road chunk's traffic runs along.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoadAxis {
    /// Road along world X (the chunk row where chunk_z == 0).
    EastWest,
    /// Road along world Z (the chunk column where chunk_x == 0).
    NorthSouth,
}

impl RoadAxis {
    pub fn direction(self) -> (f32, f32) {
        match self {
            RoadAxis::EastWest => (1.0, 0.0),
            RoadAxis::NorthSouth => (0.0, 1.0),
        }
    }
}

/// Side of a road chunk, used for gas-station placement and the matching
/// barrier gap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoadSide {
    Left,
    Right,
}

impl RoadSide {
    pub fn sign(self) -> f32 {
        match self {
            RoadSide::Left => -1.0,
            RoadSide::Right => 1.0,
        }
    }
}

/// In-chunk offsets are relative to the chunk's center.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildingSpec {
    pub offset: (f32, f32),
    pub size: (f32, f32, f32),
    pub hue: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TreeSpec {
    pub offset: (f32, f32),
}

#[derive(Clone, Debug, PartialEq)]
pub struct BarrierSpec {
    pub offset: (f32, f32),
    /// Half-extents of the barrier strip on the ground plane.
    pub half_size: (f32, f32),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrafficSpawn {
    pub offset: (f32, f32),
    pub axis: RoadAxis,
    pub direction: f32, // +1 or -1 along the axis
    pub speed: f32,     // m/s
}

/// Everything a single chunk materializes, fully determined by its coordinate.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkContent {
    pub coord: (i32, i32),
    pub road: Option<RoadAxis>,
    pub is_intersection: bool,
    pub buildings: Vec<BuildingSpec>,
    pub trees: Vec<TreeSpec>,
    /// Corner offsets for traffic lights (intersection only).
    pub traffic_lights: Vec<(f32, f32)>,
    pub gas_station: Option<RoadSide>,
    pub barriers: Vec<BarrierSpec>,
    pub traffic_cars: Vec<TrafficSpawn>,
}

impl ChunkContent {
    pub fn origin(&self) -> (f32, f32) {
        (
            self.coord.0 as f32 * CHUNK_SIZE,
            self.coord.1 as f32 * CHUNK_SIZE,
        )
    }
}

/// Generate the content for one chunk coordinate. Pure and deterministic:
/// the same coordinate always yields the same content.
pub fn generate(chunk_x: i32, chunk_z: i32) -> ChunkContent {
    let mut rng = SeededRng::for_chunk(chunk_x, chunk_z);
    let on_east_west = chunk_z == 0;
    let on_north_south = chunk_x == 0;
    let is_intersection = on_east_west && on_north_south;

    let mut content = ChunkContent {
        coord: (chunk_x, chunk_z),
        road: if on_east_west {
            Some(RoadAxis::EastWest)
        } else if on_north_south {
            Some(RoadAxis::NorthSouth)
        } else {
            None
        },
        is_intersection,
        buildings: Vec::new(),
        trees: Vec::new(),
        traffic_lights: Vec::new(),
        gas_station: None,
        barriers: Vec::new(),
        traffic_cars: Vec::new(),
    };

    match content.road {
        Some(axis) => fill_road_chunk(&mut content, axis, &mut rng),
        None => fill_ambient_chunk(&mut content, &mut rng),
    }

    content
}

fn fill_road_chunk(content: &mut ChunkContent, axis: RoadAxis, rng: &mut SeededRng) {
    if content.is_intersection {
        // the crossing always gets its four lights and nothing that
        // could block it
        let corner = ROAD_WIDTH / 2.0 + 2.0;
        content.traffic_lights = vec![
            (corner, corner),
            (corner, -corner),
            (-corner, corner),
            (-corner, -corner),
        ];
    } else if rng.chance(0.25) {
        let side = if rng.chance(0.5) {
            RoadSide::Left
        } else {
            RoadSide::Right
        };
        content.gas_station = Some(side);
    }

    push_barriers(content, axis);
    spawn_lane_traffic(content, axis, rng);
}

/// Edge barriers along both sides of the road, skipping the side that
/// hosts a gas station so cars can pull in.
///
/// Re-checks the intersection case itself: even a generic caller must
/// never fence off the crossing.
fn push_barriers(content: &mut ChunkContent, axis: RoadAxis) {
    if content.coord == (0, 0) {
        return;
    }
    let edge = ROAD_WIDTH / 2.0 + 1.0;
    for side in [RoadSide::Left, RoadSide::Right] {
        if content.gas_station == Some(side) {
            continue;
        }
        let lateral = side.sign() * edge;
        let (offset, half_size) = match axis {
            RoadAxis::EastWest => ((0.0, lateral), (CHUNK_SIZE / 2.0, 0.5)),
            RoadAxis::NorthSouth => ((lateral, 0.0), (0.5, CHUNK_SIZE / 2.0)),
        };
        content.barriers.push(BarrierSpec { offset, half_size });
    }
}

fn spawn_lane_traffic(content: &mut ChunkContent, axis: RoadAxis, rng: &mut SeededRng) {
    let count = rng.int_range(1, 2);
    for _ in 0..count {
        let direction = if rng.chance(0.5) { 1.0 } else { -1.0 };
        // right-hand traffic: lane offset sign follows direction
        let lane = LANE_OFFSET * direction;
        let along = rng.range(-CHUNK_SIZE / 2.0 + 10.0, CHUNK_SIZE / 2.0 - 10.0);
        let offset = match axis {
            RoadAxis::EastWest => (along, lane),
            RoadAxis::NorthSouth => (lane, along),
        };
        content.traffic_cars.push(TrafficSpawn {
            offset,
            axis,
            direction,
            speed: rng.range(8.0, 15.0),
        });
    }
}

fn fill_ambient_chunk(content: &mut ChunkContent, rng: &mut SeededRng) {
    let margin = 12.0;
    let span = CHUNK_SIZE / 2.0 - margin;

    let building_count = rng.int_range(1, 3);
    for _ in 0..building_count {
        content.buildings.push(BuildingSpec {
            offset: (rng.range(-span, span), rng.range(-span, span)),
            size: (
                rng.range(10.0, 20.0),
                rng.range(20.0, 60.0),
                rng.range(10.0, 20.0),
            ),
            hue: rng.range(0.0, 360.0),
        });
    }

    let tree_count = rng.int_range(2, 6);
    for _ in 0..tree_count {
        content.trees.push(TreeSpec {
            offset: (rng.range(-span, span), rng.range(-span, span)),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_coordinate_same_content() {
        for (x, z) in [(0, 0), (3, 0), (0, -7), (5, 12), (-4, -9)] {
            let a = generate(x, z);
            let b = generate(x, z);
            assert_eq!(a, b, "chunk ({x},{z}) not deterministic");
        }
    }

    #[test]
    fn rng_is_deterministic_for_negative_coords() {
        let mut a = SeededRng::for_chunk(-3, -11);
        let mut b = SeededRng::for_chunk(-3, -11);
        for _ in 0..100 {
            let v = a.next();
            assert_eq!(v, b.next());
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn intersection_has_lights_and_no_blockers() {
        let c = generate(0, 0);
        assert!(c.is_intersection);
        assert_eq!(c.traffic_lights.len(), 4);
        assert!(c.gas_station.is_none());
        assert!(c.barriers.is_empty(), "intersection must stay open");
    }

    #[test]
    fn road_chunks_carry_traffic_not_buildings() {
        let c = generate(7, 0);
        assert_eq!(c.road, Some(RoadAxis::EastWest));
        assert!(c.buildings.is_empty());
        assert!(c.trees.is_empty());
        let n = c.traffic_cars.len();
        assert!((1..=2).contains(&n));

        let c = generate(0, -4);
        assert_eq!(c.road, Some(RoadAxis::NorthSouth));
    }

    #[test]
    fn station_side_has_no_barrier() {
        // scan the axis until a station shows up; 25% odds make this quick
        let mut found = false;
        for x in 1..200 {
            let c = generate(x, 0);
            if let Some(side) = c.gas_station {
                found = true;
                assert_eq!(c.barriers.len(), 1);
                let barrier_side = if c.barriers[0].offset.1 < 0.0 {
                    RoadSide::Left
                } else {
                    RoadSide::Right
                };
                assert_ne!(barrier_side, side, "barrier blocks the station entrance");
                break;
            } else {
                assert_eq!(c.barriers.len(), 2);
            }
        }
        assert!(found, "no gas station in 200 road chunks");
    }

    #[test]
    fn ambient_chunks_respect_count_bounds() {
        for x in 1..40 {
            let c = generate(x, 3);
            assert!(c.road.is_none());
            assert!((1..=3).contains(&c.buildings.len()));
            assert!((2..=6).contains(&c.trees.len()));
            assert!(c.traffic_cars.is_empty());
        }
    }
}
