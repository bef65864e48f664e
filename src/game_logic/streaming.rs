use crate::game_logic::chunk::{self, ChunkContent, RoadAxis, RoadSide};
use crate::game_logic::constants::*;
use crate::game_logic::traffic::TrafficCar;
use crate::game_logic::vehicle::PlayerCar;
use bevy::platform::collections::{HashMap, HashSet};
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

/// Root entity of one resident chunk. Everything the chunk owns (meshes,
/// colliders, traffic agents) hangs below it, so a single despawn releases
/// the lot.
#[derive(Component)]
pub struct ChunkRoot {
    pub coord: (i32, i32),
}

/// Marker for gas-station pumps; the station service queries these by
/// position every tick, so unloading a chunk can never leave a stale
/// reference behind.
#[derive(Component)]
pub struct GasStation;

/// Blinking intersection light.
#[derive(Component)]
pub struct TrafficLight {
    pub phase: f32,
}

/// Tracks which chunks are resident and diffs the neighborhood as the
/// player crosses chunk boundaries.
#[derive(Resource, Default)]
pub struct WorldStreamer {
    chunks: HashMap<(i32, i32), Entity>,
    last_chunk: Option<(i32, i32)>,
}

impl WorldStreamer {
    pub fn chunk_coord(pos: Vec3) -> (i32, i32) {
        (
            (pos.x / CHUNK_SIZE).floor() as i32,
            (pos.z / CHUNK_SIZE).floor() as i32,
        )
    }

    pub fn resident_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_resident(&self, coord: (i32, i32)) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// The square Chebyshev neighborhood that must stay loaded.
    pub fn desired(center: (i32, i32)) -> HashSet<(i32, i32)> {
        let mut set = HashSet::default();
        for dx in -RENDER_DISTANCE..=RENDER_DISTANCE {
            for dz in -RENDER_DISTANCE..=RENDER_DISTANCE {
                set.insert((center.0 + dx, center.1 + dz));
            }
        }
        set
    }

    /// Coordinates to load and (coordinate, root) pairs to unload for a new
    /// player chunk. Returns None on the cheap no-op path where the player
    /// has not crossed a chunk boundary.
    pub fn plan(&mut self, center: (i32, i32)) -> Option<ChunkPlan> {
        if self.last_chunk == Some(center) {
            return None;
        }
        self.last_chunk = Some(center);

        let desired = Self::desired(center);
        let to_load: Vec<_> = desired
            .iter()
            .copied()
            .filter(|c| !self.chunks.contains_key(c))
            .collect();
        let to_unload: Vec<_> = self
            .chunks
            .iter()
            .filter(|(c, _)| !desired.contains(*c))
            .map(|(c, e)| (*c, *e))
            .collect();
        Some(ChunkPlan { to_load, to_unload })
    }

    pub fn insert(&mut self, coord: (i32, i32), root: Entity) {
        let previous = self.chunks.insert(coord, root);
        debug_assert!(previous.is_none(), "chunk {coord:?} loaded twice");
    }

    pub fn remove(&mut self, coord: (i32, i32)) {
        self.chunks.remove(&coord);
    }
}

pub struct ChunkPlan {
    pub to_load: Vec<(i32, i32)>,
    pub to_unload: Vec<((i32, i32), Entity)>,
}

/// Per-frame streaming update. Recomputes the player's chunk coordinate and
/// loads/unloads the difference; unchanged coordinate means no chunk work.
pub fn stream_chunks(
    mut commands: Commands,
    mut streamer: ResMut<WorldStreamer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    player: Single<&Transform, With<PlayerCar>>,
) {
    let center = WorldStreamer::chunk_coord(player.translation);
    let Some(plan) = streamer.plan(center) else {
        return;
    };

    for (coord, root) in plan.to_unload {
        // recursive despawn drops every owned mesh, collider and traffic
        // agent before this tick completes
        commands.entity(root).despawn();
        streamer.remove(coord);
    }

    for coord in plan.to_load {
        let content = chunk::generate(coord.0, coord.1);
        let root = materialize_chunk(&mut commands, &mut meshes, &mut materials, &content);
        streamer.insert(coord, root);
    }
}

/// Build the visual and physical objects for one chunk under a fresh root
/// entity and return the root.
fn materialize_chunk(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    content: &ChunkContent,
) -> Entity {
    let (ox, oz) = content.origin();
    let root = commands
        .spawn((
            ChunkRoot {
                coord: content.coord,
            },
            Transform::from_xyz(ox, 0.0, oz),
            Visibility::default(),
            Name::new(format!("chunk {:?}", content.coord)),
        ))
        .id();

    commands.entity(root).with_children(|parent| {
        // ground tile
        let grass = materials.add(StandardMaterial {
            base_color: Color::srgb(0.18, 0.31, 0.09),
            perceptual_roughness: 0.9,
            ..default()
        });
        parent.spawn((
            Mesh3d(meshes.add(Plane3d::default().mesh().size(CHUNK_SIZE, CHUNK_SIZE))),
            MeshMaterial3d(grass),
            Transform::from_xyz(0.0, 0.0, 0.0),
        ));

        if let Some(axis) = content.road {
            spawn_road(parent, meshes, materials, axis, content.is_intersection);
        }

        for building in &content.buildings {
            let (w, h, d) = building.size;
            parent.spawn((
                Mesh3d(meshes.add(Cuboid::new(w, h, d))),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::hsl(building.hue, 0.3, 0.5),
                    ..default()
                })),
                Transform::from_xyz(building.offset.0, h / 2.0, building.offset.1),
                RigidBody::Fixed,
                Collider::cuboid(w / 2.0, h / 2.0, d / 2.0),
            ));
        }

        for tree in &content.trees {
            spawn_tree(parent, meshes, materials, tree.offset);
        }

        for light in &content.traffic_lights {
            spawn_traffic_light(parent, meshes, materials, *light);
        }

        if let (Some(axis), Some(side)) = (content.road, content.gas_station) {
            spawn_gas_station(parent, meshes, materials, axis, side);
        }

        for barrier in &content.barriers {
            let (hw, hd) = barrier.half_size;
            parent.spawn((
                Mesh3d(meshes.add(Cuboid::new(hw * 2.0, 1.0, hd * 2.0))),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::srgb(0.8, 0.8, 0.8),
                    ..default()
                })),
                Transform::from_xyz(barrier.offset.0, 0.5, barrier.offset.1),
                RigidBody::Fixed,
                Collider::cuboid(hw, 0.5, hd),
            ));
        }

        for car in &content.traffic_cars {
            let (dx, dz) = car.axis.direction();
            let heading = f32::atan2(dx * car.direction, dz * car.direction);
            parent.spawn((
                Mesh3d(meshes.add(Cuboid::new(2.0, 1.2, 4.2))),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::srgb(0.7, 0.6, 0.2),
                    ..default()
                })),
                Transform::from_xyz(car.offset.0, 0.6, car.offset.1)
                    .with_rotation(Quat::from_rotation_y(heading)),
                RigidBody::KinematicPositionBased,
                Collider::cuboid(1.0, 0.6, 2.1),
                TrafficCar {
                    axis: car.axis,
                    direction: car.direction,
                    speed: car.speed,
                },
            ));
        }
    });

    root
}

fn spawn_road(
    parent: &mut ChildSpawnerCommands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    axis: chunk::RoadAxis,
    is_intersection: bool,
) {
    let asphalt = materials.add(StandardMaterial {
        base_color: Color::srgb(0.16, 0.16, 0.16),
        perceptual_roughness: 0.7,
        ..default()
    });
    let (w, d) = match axis {
        chunk::RoadAxis::EastWest => (CHUNK_SIZE, ROAD_WIDTH),
        chunk::RoadAxis::NorthSouth => (ROAD_WIDTH, CHUNK_SIZE),
    };
    parent.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(w, d))),
        MeshMaterial3d(asphalt.clone()),
        Transform::from_xyz(0.0, 0.02, 0.0),
    ));
    if is_intersection {
        // crossing arm of the other axis
        parent.spawn((
            Mesh3d(meshes.add(Plane3d::default().mesh().size(d, w))),
            MeshMaterial3d(asphalt),
            Transform::from_xyz(0.0, 0.02, 0.0),
        ));
        return;
    }

    // dashed center line
    let line = materials.add(StandardMaterial {
        base_color: Color::WHITE,
        unlit: true,
        ..default()
    });
    let dash = meshes.add(Cuboid::new(0.3, 0.05, 5.0));
    let mut along = -CHUNK_SIZE / 2.0 + 5.0;
    while along < CHUNK_SIZE / 2.0 {
        let (x, z, rot) = match axis {
            chunk::RoadAxis::EastWest => (along, 0.0, std::f32::consts::FRAC_PI_2),
            chunk::RoadAxis::NorthSouth => (0.0, along, 0.0),
        };
        parent.spawn((
            Mesh3d(dash.clone()),
            MeshMaterial3d(line.clone()),
            Transform::from_xyz(x, 0.05, z).with_rotation(Quat::from_rotation_y(rot)),
        ));
        along += 10.0;
    }
}

fn spawn_tree(
    parent: &mut ChildSpawnerCommands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    offset: (f32, f32),
) {
    parent
        .spawn((
            Transform::from_xyz(offset.0, 0.0, offset.1),
            Visibility::default(),
            RigidBody::Fixed,
            Collider::cylinder(2.5, 0.7),
            // collider sits at trunk height
        ))
        .with_children(|tree| {
            tree.spawn((
                Mesh3d(meshes.add(Cylinder::new(0.6, 5.0))),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::srgb(0.29, 0.15, 0.07),
                    ..default()
                })),
                Transform::from_xyz(0.0, 2.5, 0.0),
            ));
            tree.spawn((
                Mesh3d(meshes.add(Sphere::new(3.0))),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::srgb(0.18, 0.31, 0.09),
                    ..default()
                })),
                Transform::from_xyz(0.0, 6.0, 0.0),
            ));
        });
}

fn spawn_traffic_light(
    parent: &mut ChildSpawnerCommands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    offset: (f32, f32),
) {
    parent
        .spawn((
            Transform::from_xyz(offset.0, 0.0, offset.1),
            Visibility::default(),
        ))
        .with_children(|light| {
            light.spawn((
                Mesh3d(meshes.add(Cylinder::new(0.2, 6.0))),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::srgb(0.2, 0.2, 0.2),
                    ..default()
                })),
                Transform::from_xyz(0.0, 3.0, 0.0),
            ));
            // the head gets its own material so the blink can recolor it
            light.spawn((
                TrafficLight { phase: 0.0 },
                Mesh3d(meshes.add(Cuboid::new(0.6, 1.4, 0.6))),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::srgb(0.1, 0.1, 0.1),
                    emissive: LinearRgba::rgb(0.0, 2.0, 0.0),
                    ..default()
                })),
                Transform::from_xyz(0.0, 6.3, 0.0),
            ));
        });
}

/// Chunk-local center of a station forecourt, offset perpendicular to the
/// road so the buildings sit clear of the asphalt on either axis.
pub fn station_offset(axis: RoadAxis, side: RoadSide) -> (f32, f32) {
    let lateral = side.sign() * (ROAD_WIDTH / 2.0 + 10.0);
    match axis {
        RoadAxis::EastWest => (0.0, lateral),
        RoadAxis::NorthSouth => (lateral, 0.0),
    }
}

fn spawn_gas_station(
    parent: &mut ChildSpawnerCommands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    axis: RoadAxis,
    side: RoadSide,
) {
    let (ox, oz) = station_offset(axis, side);
    let facing = match axis {
        RoadAxis::EastWest => Quat::IDENTITY,
        RoadAxis::NorthSouth => Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
    };
    parent
        .spawn((
            Transform::from_xyz(ox, 0.0, oz).with_rotation(facing),
            Visibility::default(),
            GasStation,
        ))
        .with_children(|station| {
            // kiosk
            station.spawn((
                Mesh3d(meshes.add(Cuboid::new(12.0, 4.0, 8.0))),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::srgb(0.9, 0.2, 0.2),
                    ..default()
                })),
                Transform::from_xyz(0.0, 2.0, side.sign() * 6.0),
                RigidBody::Fixed,
                Collider::cuboid(6.0, 2.0, 4.0),
            ));
            // pumps, open toward the road
            for x in [-3.0, 3.0] {
                station.spawn((
                    Mesh3d(meshes.add(Cuboid::new(1.0, 2.0, 1.0))),
                    MeshMaterial3d(materials.add(StandardMaterial {
                        base_color: Color::srgb(0.2, 0.8, 0.3),
                        emissive: LinearRgba::rgb(0.1, 0.6, 0.2),
                        ..default()
                    })),
                    Transform::from_xyz(x, 1.0, 0.0),
                ));
            }
        });
}

/// Blink the intersection lights on a fixed red/green cycle.
pub fn animate_traffic_lights(
    time: Res<Time>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut lights: Query<(&mut TrafficLight, &MeshMaterial3d<StandardMaterial>)>,
) {
    for (mut light, material) in lights.iter_mut() {
        light.phase = (light.phase + time.delta_secs()) % 8.0;
        if let Some(head) = materials.get_mut(&material.0) {
            head.emissive = if light.phase < 4.0 {
                LinearRgba::rgb(0.0, 2.0, 0.0)
            } else {
                LinearRgba::rgb(2.0, 0.0, 0.0)
            };
        }
    }
}
