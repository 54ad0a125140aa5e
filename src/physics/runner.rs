use super::PhysicsWorld;

pub const DEFAULT_STEP_MS: f32 = 1000.0 / 60.0;
const MAX_STEPS_PER_ADVANCE: usize = 4;

/// Fixed-step pump for a [`PhysicsWorld`], fed with frame durations.
#[derive(Clone, Debug)]
pub struct Runner {
    running: bool,
    step_ms: f32,
    accumulator_ms: f32,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_MS)
    }
}

impl Runner {
    pub fn new(step_ms: f32) -> Self {
        Self {
            running: false,
            step_ms: step_ms.max(1.0),
            accumulator_ms: 0.0,
        }
    }

    pub fn run(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.accumulator_ms = 0.0;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Steps the world once by an explicit timestep, running or not.
    pub fn tick(&mut self, world: &mut dyn PhysicsWorld, delta_ms: f32) {
        world.step(delta_ms);
    }

    /// Consumes `frame_ms` in fixed steps. Backlog beyond a few steps is
    /// dropped so a stalled frame cannot snowball.
    pub fn advance(&mut self, world: &mut dyn PhysicsWorld, frame_ms: f32) -> usize {
        if !self.running || !frame_ms.is_finite() || frame_ms <= 0.0 {
            return 0;
        }

        self.accumulator_ms += frame_ms;
        let mut steps = 0;
        while self.accumulator_ms >= self.step_ms && steps < MAX_STEPS_PER_ADVANCE {
            world.step(self.step_ms);
            self.accumulator_ms -= self.step_ms;
            steps += 1;
        }

        if steps == MAX_STEPS_PER_ADVANCE {
            self.accumulator_ms = self.accumulator_ms.min(self.step_ms);
        }
        steps
    }
}
