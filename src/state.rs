/// Animation driver mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverMode {
    Stopped,
    Running,
}

/// Handle of the next scheduled frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHandle(pub u64);

/// Simulation state
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    /// Current rotation phase in degrees, kept in [0, 360)
    pub phase: f64,
    /// Running or stopped
    pub mode: DriverMode,
    /// Frame scheduled to run next, if any
    pub pending_frame: Option<FrameHandle>,
    /// Frames executed since the last reset
    pub frames: u64,
    /// Selected number of masses
    pub mass_count: usize,
}

impl SimulationState {
    pub fn new(mass_count: usize) -> Self {
        SimulationState {
            phase: 0.0,
            mode: DriverMode::Stopped,
            pending_frame: None,
            frames: 0,
            mass_count,
        }
    }

    pub fn is_running(&self) -> bool {
        self.mode == DriverMode::Running
    }
}
