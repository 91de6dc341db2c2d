use std::time::{Duration, Instant};

use bevy_ecs::{schedule::ShouldRun, system::ResMut};

// This will cause the tile update stage to loop as long as there is still unsimulated time.
pub fn update_criteria(mut time: ResMut<TimeResource>) -> ShouldRun {
    if time.consume_step() {
        ShouldRun::YesAndCheckAgain
    } else {
        ShouldRun::No
    }
}

#[derive(Clone, Debug)]
pub struct TimeResource {
    // target delta time
    pub update_dt: Duration,
    pub frame_dt: Duration, // actual dt will be variable

    pub ingame_time: Duration,
    pub ticks: u64,

    pub last_frame: Instant,
    pub unsimulated_time: Duration, // amount of realtime passed that hasn't been simulated yet. This will increase when the amount of realtime passed is not an exact multiple of update_dt
}

impl TimeResource {
    pub fn new(update_dt: Duration, frame_dt: Duration) -> Self {
        Self {
            update_dt,
            frame_dt,

            ingame_time: Duration::default(),
            ticks: 0,
            last_frame: Instant::now(),
            unsimulated_time: Duration::default(),
        }
    }

    /// Frame limiter. When a frame is due, the real time since the last one is banked
    /// for the update steps and `true` is returned.
    pub fn begin_frame(&mut self) -> bool {
        let elapsed = self.last_frame.elapsed();
        if elapsed >= self.frame_dt {
            self.last_frame = Instant::now();
            self.unsimulated_time += elapsed;
            true
        } else {
            false
        }
    }

    /// Moves one `update_dt` from unsimulated to ingame time if enough is banked.
    pub fn consume_step(&mut self) -> bool {
        let dt = self.update_dt;
        if dt.is_zero() || self.unsimulated_time < dt {
            return false;
        }

        self.unsimulated_time -= dt;
        self.ingame_time += dt;
        self.ticks += 1;
        true
    }

    pub fn bank(&mut self, elapsed: Duration) {
        self.unsimulated_time += elapsed;
    }
}
