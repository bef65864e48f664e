// Simulation timing
pub const MAX_FRAME_DELTA_MS: u64 = 100; // clamp long frame hitches so forces don't explode

// World streaming
pub const CHUNK_SIZE: f32 = 100.0;
pub const RENDER_DISTANCE: i32 = 2; // Chebyshev radius, in chunks
pub const ROAD_WIDTH: f32 = 20.0;
pub const LANE_OFFSET: f32 = 5.0;

// Vehicle forces
pub const ENGINE_FORCE: f32 = 40_000.0;
pub const REVERSE_FORCE_RATIO: f32 = 0.6;
pub const MAX_STEER_ANGLE: f32 = 0.5; // radians
pub const STEER_RATE: f32 = 3.0;
pub const STEER_DECAY: f32 = 0.9; // per-frame falloff with no input
pub const MIN_STEER_SPEED: f32 = 0.3; // m/s, steering suppressed below this
pub const YAW_TORQUE: f32 = 6_000.0;
pub const BODY_TILT_RATIO: f32 = 0.2; // visual lean per radian of steering
pub const BRAKE_LINEAR_SCALE: f32 = 0.95; // per 60Hz frame
pub const BRAKE_ANGULAR_SCALE: f32 = 0.9;
pub const UPRIGHT_TORQUE: f32 = 5_000.0;
pub const UPRIGHT_MIN_UP_Y: f32 = 0.7;
pub const ANGVEL_DAMP: f32 = 0.95; // per 60Hz frame, x/z axes only

// Drift
pub const DRIFT_STEER_THRESHOLD: f32 = 0.3;
pub const DRIFT_SPEED_THRESHOLD: f32 = 50.0; // km/h

// Nitro
pub const NITRO_FORCE_MULT: f32 = 1.5;
pub const NITRO_SPEED_MULT: f32 = 1.15;
pub const NITRO_DRAIN_RATE: f32 = 20.0; // per second while boosting

// Fuel and damage
pub const FUEL_CONSUMPTION_RATE: f32 = 0.6; // percent per second under throttle
pub const DAMAGE_MIN_IMPACT: f32 = 2.5; // m/s, softer hits are ignored
pub const DAMAGE_IMPACT_SCALE: f32 = 2.0; // health lost per m/s of impact
pub const DAMAGE_COOLDOWN: f32 = 0.5; // seconds between registered hits

// Gearbox
pub const IDLE_RPM: f32 = 1000.0;
pub const MAX_RPM: f32 = 8000.0;
pub const SHIFT_UP_RPM: f32 = 6800.0;
pub const SHIFT_UP_RESET_RPM: f32 = 4000.0;
pub const SHIFT_DOWN_RESET_RPM: f32 = 5500.0;
pub const SHIFT_INTERVAL: f32 = 0.25; // seconds between shifts
pub const IDLE_SNAP_SPEED: f32 = 3.0; // km/h
pub const TOP_GEAR: i8 = 6;

// Police
pub const SPEED_LIMIT: f32 = 80.0; // km/h
pub const SPEED_MARGIN: f32 = 20.0; // violation starts above limit + margin
pub const WANTED_GAIN: f32 = 0.1;
pub const WANTED_DECAY: f32 = 0.05;
pub const WANTED_MAX: f32 = 5.0;
pub const SPEED_SAMPLE_INTERVAL: f32 = 1.0; // 1 Hz sampling
pub const ESCAPE_DISTANCE: f32 = 100.0;
pub const ESCAPE_TIMEOUT: f32 = 10.0;
pub const BACKUP_DELAY: f32 = 30.0; // chase seconds before reinforcements
pub const MAX_POLICE_CARS: usize = 3;
pub const POLICE_TOP_SPEED: f32 = 50.0;
pub const POLICE_HOLD_DISTANCE: f32 = 5.0;

// Checkpoints
pub const CHECKPOINT_RADIUS: f32 = 10.0;

// Clock
pub const TIME_SPEED: f32 = 1.0; // one real minute per game hour

// Gas station
pub const STATION_RANGE: f32 = 20.0;
pub const STATION_MAX_SPEED: f32 = 5.0; // km/h, must nearly stop to refuel
pub const SERVICE_DURATION: f32 = 2.5; // seconds for a full fill + repair
pub const FUEL_PRICE_PER_UNIT: f32 = 0.5;
pub const REPAIR_PRICE_PER_UNIT: f32 = 1.0;

// Conversions
pub const MS_TO_KMH: f32 = 3.6;
