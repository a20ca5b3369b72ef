/// Board edge length used when no configuration overrides it.
pub const DEFAULT_BOARD_SIZE: usize = 15;

/// Turn length, in timer ticks.
pub const DEFAULT_TURN_DURATION_TICKS: u32 = 30;

/// Length of an unbroken run that wins. Longer runs do not count.
pub const WINNING_RUN: usize = 5;
