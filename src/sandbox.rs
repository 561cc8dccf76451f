//! Demo subsystem owning a small physics-like state.
//!
//! The state is read from any thread through the reader functions, but only
//! written by the writer functions of the `physics` domain. Those are queued
//! and applied by [`PhysicsThread`] when it drains the domain at the start of
//! each tick, so all writes happen on that one thread.
//!
//! | function       | kind   | signature      |
//! |----------------|--------|----------------|
//! | `getSpeed`     | reader | `INT`          |
//! | `getGravity`   | reader | `VEC2DBL`      |
//! | `getTime`      | reader | `DOUBLE`       |
//! | `setSpeed`     | writer | `NONE_INT`     |
//! | `setGravity`   | writer | `NONE_2DOUBLE` |
//! | `setTimeScale` | writer | `NONE_DOUBLE`  |

use crate::com::{ComError, ComInterfaceProvider, ParamKind, Registry};
use glam::DVec2;
use log::{debug, error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;

/// Writer domain owned by the physics thread.
pub const PHYSICS_DOMAIN: &str = "physics";

const DEFAULT_GRAVITY: DVec2 = DVec2::new(0.0, -9.81);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsState {
    pub speed: i32,
    pub gravity: DVec2,
    /// Simulated seconds.
    pub time: f64,
    pub time_scale: f64,
    pub steps: u64,
}

impl Default for PhysicsState {
    fn default() -> Self {
        Self {
            speed: 0,
            gravity: DEFAULT_GRAVITY,
            time: 0.0,
            time_scale: 1.0,
            steps: 0,
        }
    }
}

/// The demo provider. Cloning shares the same state.
#[derive(Debug, Clone, Default)]
pub struct Sandbox {
    state: Arc<RwLock<PhysicsState>>,
}

impl Sandbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> PhysicsState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advances simulated time by `dt` real seconds. Owner thread only.
    pub fn step(&self, dt: f64) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.time += dt * state.time_scale;
        state.steps += 1;
    }

    fn read<T>(&self, f: impl FnOnce(&PhysicsState) -> T) -> T {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write(&self, f: impl FnOnce(&mut PhysicsState)) {
        f(&mut self.state.write().unwrap_or_else(PoisonError::into_inner))
    }
}

impl ComInterfaceProvider for Sandbox {
    fn register_functions(&self, registry: &Registry) -> Result<(), ComError> {
        registry.register_domain(PHYSICS_DOMAIN);

        let s = self.clone();
        registry.register(
            "getSpeed",
            move || s.read(|state| state.speed),
            "Current speed",
            vec![],
            PHYSICS_DOMAIN,
        )?;
        let s = self.clone();
        registry.register(
            "getGravity",
            move || s.read(|state| state.gravity),
            "Current gravity vector",
            vec![],
            PHYSICS_DOMAIN,
        )?;
        let s = self.clone();
        registry.register(
            "getTime",
            move || s.read(|state| state.time),
            "Simulated time in seconds",
            vec![],
            PHYSICS_DOMAIN,
        )?;

        let s = self.clone();
        registry.register_writer(
            "setSpeed",
            move |speed: i32| -> Result<(), ComError> {
                if speed < 0 {
                    return Err(ComError::invalid(format!("speed must be >= 0, got {}", speed)));
                }
                s.write(|state| state.speed = speed);
                Ok(())
            },
            "Set the speed",
            vec![(ParamKind::Int, "Speed (>= 0)".into())],
            PHYSICS_DOMAIN,
        )?;
        let s = self.clone();
        registry.register_writer(
            "setGravity",
            move |x: f64, y: f64| s.write(|state| state.gravity = DVec2::new(x, y)),
            "Set the gravity vector",
            vec![
                (ParamKind::Double, "X component".into()),
                (ParamKind::Double, "Y component".into()),
            ],
            PHYSICS_DOMAIN,
        )?;
        let s = self.clone();
        registry.register_writer(
            "setTimeScale",
            move |scale: f64| -> Result<(), ComError> {
                if !scale.is_finite() || scale < 0.0 {
                    return Err(ComError::invalid(format!("time scale must be >= 0, got {}", scale)));
                }
                s.write(|state| state.time_scale = scale);
                Ok(())
            },
            "Set the simulation time scale",
            vec![(ParamKind::Double, "Scale factor".into())],
            PHYSICS_DOMAIN,
        )?;

        registry.register_event(
            "physics_step",
            vec![(ParamKind::Double, "Simulated time after the step".into())],
            PHYSICS_DOMAIN,
        );
        Ok(())
    }
}

/// Background thread owning the `physics` domain.
pub struct PhysicsThread {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<u64>>,
}

impl PhysicsThread {
    /// Spawns the thread. Each tick drains the physics queue, then steps
    /// the sandbox by `tick`.
    pub fn spawn(registry: Arc<Registry>, sandbox: Sandbox, tick: Duration) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = std::thread::spawn(move || physics_loop(&registry, &sandbox, tick, &flag));
        info!("Physics thread started ({:?} per tick)", tick);
        Self {
            running,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stops the thread after a final drain and returns the number of ticks.
    pub fn shutdown(mut self) -> u64 {
        self.stop()
    }

    fn stop(&mut self) -> u64 {
        self.running.store(false, Ordering::Release);
        let ticks = match self.handle.take().map(JoinHandle::join) {
            Some(Ok(ticks)) => ticks,
            Some(Err(_)) => {
                error!("Physics thread panicked");
                0
            }
            None => 0,
        };
        debug!("Physics thread stopped after {} tick(s)", ticks);
        ticks
    }
}

impl Drop for PhysicsThread {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
        }
    }
}

fn physics_loop(registry: &Registry, sandbox: &Sandbox, tick: Duration, running: &AtomicBool) -> u64 {
    let mut ticks = 0;
    while running.load(Ordering::Acquire) {
        if let Err(e) = registry.drain(PHYSICS_DOMAIN) {
            error!("Physics thread cannot drain its queue: {}", e);
            running.store(false, Ordering::Release);
            return ticks;
        }
        sandbox.step(tick.as_secs_f64());
        ticks += 1;
        std::thread::sleep(tick);
    }
    // Writes queued before shutdown still apply.
    if let Err(e) = registry.drain(PHYSICS_DOMAIN) {
        error!("Physics thread cannot apply writes queued before shutdown: {}", e);
    }
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Arc<Registry>, Sandbox) {
        let registry = Registry::new();
        let sandbox = Sandbox::new();
        sandbox.register_functions(&registry).unwrap();
        (Arc::new(registry), sandbox)
    }

    #[test]
    fn test_registers_readers_writers_and_event() {
        let (registry, _) = setup();
        assert_eq!(
            registry.functions_in_domain(PHYSICS_DOMAIN),
            vec!["getGravity", "getSpeed", "getTime", "setGravity", "setSpeed", "setTimeScale"]
        );
        assert!(registry.info("setSpeed").unwrap().is_writer);
        assert!(!registry.info("getSpeed").unwrap().is_writer);
        assert_eq!(registry.events()[0].0, "physics_step");
    }

    #[test]
    fn test_writes_apply_only_on_drain() {
        let (registry, sandbox) = setup();
        registry.call_text("setSpeed 12").unwrap();
        registry.call_text("setGravity 1.5 -3").unwrap();
        assert_eq!(registry.call_text("getSpeed").unwrap(), "0");

        registry.drain(PHYSICS_DOMAIN).unwrap();
        assert_eq!(registry.call::<i32, _>("getSpeed", ()), 12);
        assert_eq!(sandbox.state().gravity, DVec2::new(1.5, -3.0));
        assert_eq!(registry.call_text("getGravity").unwrap(), "1.5 -3");
    }

    #[test]
    fn test_rejected_write_leaves_state() {
        let (registry, sandbox) = setup();
        registry.call_text("setSpeed 4").unwrap();
        registry.call_text("setSpeed -1").unwrap();
        assert_eq!(registry.drain(PHYSICS_DOMAIN).unwrap(), 2);
        assert_eq!(sandbox.state().speed, 4);
    }

    #[test]
    fn test_time_scale_affects_step() {
        let (registry, sandbox) = setup();
        registry.call_text("setTimeScale 2").unwrap();
        registry.drain(PHYSICS_DOMAIN).unwrap();
        sandbox.step(0.5);
        assert_eq!(registry.call::<f64, _>("getTime", ()), 1.0);
    }

    #[test]
    fn test_physics_thread_applies_queued_writes() {
        let (registry, sandbox) = setup();
        let thread = PhysicsThread::spawn(Arc::clone(&registry), sandbox.clone(), Duration::from_millis(1));
        assert!(thread.is_running());
        registry.enqueue("setSpeed", (9,)).unwrap();
        let ticks = thread.shutdown();
        assert_eq!(sandbox.state().speed, 9);
        assert_eq!(sandbox.state().steps, ticks);
        assert_eq!(registry.pending(PHYSICS_DOMAIN).unwrap(), 0);
    }

    #[test]
    fn test_physics_thread_without_domain_stops() {
        let registry = Arc::new(Registry::new());
        let sandbox = Sandbox::new();
        let thread = PhysicsThread::spawn(registry, sandbox.clone(), Duration::from_millis(1));
        assert_eq!(thread.shutdown(), 0);
        assert_eq!(sandbox.state().steps, 0);
    }
}
