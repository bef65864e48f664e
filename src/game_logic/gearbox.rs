use crate::game_logic::constants::*;

/// Per-gear force multiplier, modelling mechanical advantage. Index 0 is gear 1.
pub const GEAR_POWER: [f32; 6] = [3.0, 2.2, 1.7, 1.35, 1.1, 0.9];

/// Fraction of the car's rated top speed each gear can reach. Index 0 is gear 1.
pub const GEAR_SPEED_FRAC: [f32; 6] = [0.2, 0.35, 0.5, 0.65, 0.82, 1.0];

const REVERSE_POWER: f32 = 0.5;

/// Gearbox state machine. Gear -1 is reverse, 1..=6 are forward gears;
/// gear 0 (neutral) never persists outside a transition.
#[derive(Clone, Debug)]
pub struct Gearbox {
    pub gear: i8,
    pub rpm: f32,
    shift_cooldown: f32,
}

impl Default for Gearbox {
    fn default() -> Self {
        Self {
            gear: 1,
            rpm: IDLE_RPM,
            shift_cooldown: 0.0,
        }
    }
}

impl Gearbox {
    /// Top speed of a forward gear in km/h. Gear 0 maps to zero so the
    /// band below gear 1 starts at standstill.
    pub fn gear_max_speed(gear: i8, max_speed_kmh: f32) -> f32 {
        if gear <= 0 {
            0.0
        } else {
            max_speed_kmh * GEAR_SPEED_FRAC[(gear as usize - 1).min(5)]
        }
    }

    /// Force multiplier for the current gear.
    pub fn power_ratio(&self) -> f32 {
        if self.gear == -1 {
            REVERSE_POWER
        } else {
            GEAR_POWER[(self.gear.max(1) as usize - 1).min(5)]
        }
    }

    pub fn rpm_ratio(&self) -> f32 {
        (self.rpm / MAX_RPM).clamp(0.0, 1.0)
    }

    /// Advance the gearbox one tick.
    ///
    /// `reverse` held forces reverse gear unconditionally; releasing it while
    /// in reverse snaps back to first. Upshifts require 250ms between shifts.
    pub fn update(
        &mut self,
        speed_kmh: f32,
        throttle: bool,
        reverse: bool,
        max_speed_kmh: f32,
        dt: f32,
    ) {
        self.shift_cooldown = (self.shift_cooldown - dt).max(0.0);

        if reverse {
            self.gear = -1;
            let target = IDLE_RPM + (speed_kmh / Self::gear_max_speed(1, max_speed_kmh)).min(1.0)
                * (SHIFT_DOWN_RESET_RPM - IDLE_RPM);
            self.ease_rpm(target, throttle || reverse, dt);
            return;
        }

        if self.gear == -1 {
            self.gear = 1;
            self.rpm = IDLE_RPM;
        }

        // stationary cars sit in first at idle
        if speed_kmh < IDLE_SNAP_SPEED && !throttle {
            self.gear = 1;
            self.rpm = IDLE_RPM;
            return;
        }

        // shift down when well below the next-lower gear's band
        if self.gear > 1 && speed_kmh < 0.6 * Self::gear_max_speed(self.gear - 1, max_speed_kmh) {
            self.gear -= 1;
            self.rpm = SHIFT_DOWN_RESET_RPM;
            return;
        }

        let low = Self::gear_max_speed(self.gear - 1, max_speed_kmh);
        let high = Self::gear_max_speed(self.gear, max_speed_kmh);
        let band = (high - low).max(1.0);
        let frac = ((speed_kmh - low) / band).clamp(0.0, 1.0);
        let target = IDLE_RPM + frac * (MAX_RPM - IDLE_RPM);
        self.ease_rpm(target, throttle, dt);

        if self.rpm > SHIFT_UP_RPM
            && self.gear > 0
            && self.gear < TOP_GEAR
            && self.shift_cooldown <= 0.0
        {
            self.gear += 1;
            self.rpm = SHIFT_UP_RESET_RPM;
            self.shift_cooldown = SHIFT_INTERVAL;
        }
    }

    fn ease_rpm(&mut self, target: f32, throttle: bool, dt: f32) {
        // the needle climbs faster under throttle than it settles
        let rate = if throttle { 4000.0 } else { 2500.0 };
        let step = rate * dt;
        if self.rpm < target {
            self.rpm = (self.rpm + step).min(target);
        } else {
            self.rpm = (self.rpm - step).max(target);
        }
        self.rpm = self.rpm.clamp(IDLE_RPM, MAX_RPM);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_SPEED: f32 = 200.0;
    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn starts_in_first_at_idle() {
        let gb = Gearbox::default();
        assert_eq!(gb.gear, 1);
        assert_eq!(gb.rpm, IDLE_RPM);
    }

    #[test]
    fn gear_never_decreases_under_constant_throttle() {
        let mut gb = Gearbox::default();
        let mut speed = 0.0;
        let mut last_gear = gb.gear;
        // crude acceleration ramp up to rated top speed
        for _ in 0..(60 * 30) {
            speed = (speed + 12.0 * DT).min(MAX_SPEED);
            gb.update(speed, true, false, MAX_SPEED, DT);
            assert!(gb.gear >= last_gear, "gearbox downshifted under throttle");
            last_gear = gb.gear;
        }
        assert_eq!(gb.gear, TOP_GEAR);
    }

    #[test]
    fn shifts_respect_minimum_interval() {
        let mut gb = Gearbox::default();
        let mut shift_times = Vec::new();
        let mut t = 0.0;
        let mut speed = 0.0;
        let mut prev_gear = gb.gear;
        for _ in 0..(60 * 30) {
            t += DT;
            speed = (speed + 20.0 * DT).min(MAX_SPEED);
            gb.update(speed, true, false, MAX_SPEED, DT);
            if gb.gear != prev_gear {
                shift_times.push(t);
                prev_gear = gb.gear;
            }
        }
        for pair in shift_times.windows(2) {
            assert!(
                pair[1] - pair[0] >= SHIFT_INTERVAL - DT,
                "shifts too close: {:?}",
                pair
            );
        }
    }

    #[test]
    fn reverse_overrides_forward_logic() {
        let mut gb = Gearbox::default();
        let mut speed = 0.0;
        for _ in 0..600 {
            speed = (speed + 20.0 * DT).min(MAX_SPEED);
            gb.update(speed, true, false, MAX_SPEED, DT);
        }
        assert!(gb.gear > 1);

        gb.update(speed, false, true, MAX_SPEED, DT);
        assert_eq!(gb.gear, -1);

        // releasing reverse snaps back to first
        gb.update(0.0, false, false, MAX_SPEED, DT);
        assert_eq!(gb.gear, 1);
    }

    #[test]
    fn idle_snap_below_walking_pace() {
        let mut gb = Gearbox {
            gear: 4,
            rpm: 3000.0,
            shift_cooldown: 0.0,
        };
        gb.update(1.0, false, false, MAX_SPEED, DT);
        assert_eq!(gb.gear, 1);
        assert_eq!(gb.rpm, IDLE_RPM);
    }

    #[test]
    fn downshift_resets_rpm() {
        let mut gb = Gearbox {
            gear: 3,
            rpm: 4000.0,
            shift_cooldown: 0.0,
        };
        // gear 2 tops out at 70 km/h here; 0.6x that is 42
        gb.update(30.0, false, false, MAX_SPEED, DT);
        assert_eq!(gb.gear, 2);
        assert_eq!(gb.rpm, SHIFT_DOWN_RESET_RPM);
    }

    #[test]
    fn power_ratio_decreases_with_gear() {
        for pair in GEAR_POWER.windows(2) {
            assert!(pair[0] > pair[1]);
        }
    }
}
