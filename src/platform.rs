//! Platform pass-throughs.
//!
//! Every operation here is a one-line forward to the embedding platform; no
//! driver logic lives in this crate. The embedder hands the bindings a
//! [`Platform`] implementation at startup.

use std::cell::RefCell;
use std::rc::Rc;

/// The hardware surface the script-facing pass-through ops forward to.
pub trait Platform {
    fn pin_mode(&mut self, pin: i64, mode: i64);
    fn digital_write(&mut self, pin: i64, level: i64);
    /// Accepted and discarded on platforms without DAC support.
    fn analog_write(&mut self, pin: i64, value: i64);
    fn analog_read(&mut self, pin: i64) -> i64;
    fn delay_ms(&mut self, ms: i64);
    /// Milliseconds since boot.
    fn millis(&mut self) -> i64;
    /// Local wall clock as (hour, minute), for the script-facing `GetTime`.
    fn wall_clock(&mut self) -> (u8, u8);
    fn battery_percent(&mut self) -> i64;
    fn vibrate(&mut self, duration_ms: i64);
}

/// One recorded platform call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    PinMode(i64, i64),
    DigitalWrite(i64, i64),
    AnalogWrite(i64, i64),
    AnalogRead(i64),
    Delay(i64),
    Millis,
    WallClock,
    Battery,
    Vibrate(i64),
}

/// Canned answers for the recorder's read operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedReadings {
    pub analog_level: i64,
    pub clock_ms: i64,
    pub battery: i64,
    pub time_of_day: (u8, u8),
}

#[derive(Debug, Default)]
struct RecorderState {
    calls: Vec<PlatformCall>,
    readings: CannedReadings,
}

/// Test double that records every call and answers with canned values.
/// Clones share the same state, so a test can keep one clone while the
/// host owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingPlatform {
    shared: Rc<RefCell<RecorderState>>,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_readings(readings: CannedReadings) -> Self {
        let platform = Self::default();
        platform.shared.borrow_mut().readings = readings;
        platform
    }

    /// Calls recorded so far, oldest first.
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.shared.borrow().calls.clone()
    }

    fn record(&mut self, call: PlatformCall) {
        self.shared.borrow_mut().calls.push(call);
    }
}

impl Platform for RecordingPlatform {
    fn pin_mode(&mut self, pin: i64, mode: i64) {
        self.record(PlatformCall::PinMode(pin, mode));
    }

    fn digital_write(&mut self, pin: i64, level: i64) {
        self.record(PlatformCall::DigitalWrite(pin, level));
    }

    fn analog_write(&mut self, pin: i64, value: i64) {
        self.record(PlatformCall::AnalogWrite(pin, value));
    }

    fn analog_read(&mut self, pin: i64) -> i64 {
        self.record(PlatformCall::AnalogRead(pin));
        self.shared.borrow().readings.analog_level
    }

    fn delay_ms(&mut self, ms: i64) {
        self.record(PlatformCall::Delay(ms));
    }

    fn millis(&mut self) -> i64 {
        self.record(PlatformCall::Millis);
        self.shared.borrow().readings.clock_ms
    }

    fn wall_clock(&mut self) -> (u8, u8) {
        self.record(PlatformCall::WallClock);
        self.shared.borrow().readings.time_of_day
    }

    fn battery_percent(&mut self) -> i64 {
        self.record(PlatformCall::Battery);
        self.shared.borrow().readings.battery
    }

    fn vibrate(&mut self, duration_ms: i64) {
        self.record(PlatformCall::Vibrate(duration_ms));
    }
}
