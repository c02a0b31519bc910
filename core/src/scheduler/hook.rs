/// Elapsed time for one frame, in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameDeltas {
    /// Game time, affected by the host's time scale
    pub scaled: f32,
    /// Wall time, ignoring the time scale
    pub unscaled: f32,
}

impl FrameDeltas {
    pub fn new(scaled: f32, unscaled: f32) -> Self {
        Self { scaled, unscaled }
    }

    /// Same delta for both clocks (time scale of 1)
    pub fn uniform(delta: f32) -> Self {
        Self::new(delta, delta)
    }
}

/// Per-frame update installed into a host pipeline
pub type FrameHook = Box<dyn FnMut(FrameDeltas)>;

/// Host frame pipelines that can run one timer hook per frame.
/// Implement this for whatever drives the application's main loop.
pub trait FrameScheduler {
    /// Insert the hook after the host's time update stage.
    /// Returns false (and drops `hook`) if one is already installed.
    fn install(&mut self, hook: FrameHook) -> bool;

    /// Remove the hook. Returns false if none was installed.
    fn uninstall(&mut self) -> bool;

    /// Whether a hook is currently installed
    fn is_installed(&self) -> bool;
}
