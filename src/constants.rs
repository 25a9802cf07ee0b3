pub const MAX_FRAMES: usize = 10;
pub const MAX_PROCESSES: usize = 10;
pub const MAX_RESOURCES: usize = 10;

pub const DEFAULT_TIME_QUANTUM: u32 = 2;

/// Fault-rate bands used by the paging analysis (percent).
pub const EXCELLENT_FAULT_RATE: f64 = 30.0;
pub const MODERATE_FAULT_RATE: f64 = 60.0;

/// Built-in paging inputs: (label, reference string, frame count).
pub static PAGING_SAMPLES: [(&str, &[u32], usize); 3] = [
    ("Classic Example", &[7, 0, 1, 2, 0, 3, 0, 4, 2, 3, 0, 3, 2], 3),
    ("Extended Sequence", &[1, 2, 3, 4, 1, 2, 5, 1, 2, 3, 4, 5, 6, 7, 1], 4),
    ("Complex Case", &[2, 3, 2, 1, 5, 2, 4, 5, 3, 2, 5, 2, 1, 3, 4], 3),
];
