//! This module defines the protocol-level identifiers used by the detector
//! control servers, together with the stable text tokens accepted at the
//! facade boundary.
//!
//! Tokens are case-sensitive lowercase-with-underscore strings. Lookup is
//! data driven through [`core::str::FromStr`]; a token that is not in a
//! table is an error, never a default.

use core::str::FromStr;

use strum_macros::{EnumIter, EnumString, IntoStaticStr};

use crate::error::{Error, Result};

/// DAC and ADC channels on a module.
///
/// The temperature sensors share this id space with the writable DACs; the
/// control servers report them in millidegrees through the ADC read path.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, EnumString, IntoStaticStr, EnumIter)]
#[repr(i32)]
pub enum DacIndex {
    /// Global comparator threshold.
    #[strum(serialize = "vthreshold")]
    Threshold = 0,
    /// Shaper positive supply.
    #[strum(serialize = "vsvp")]
    Svp = 1,
    #[strum(serialize = "vtr")]
    Vtr = 2,
    /// Preamp feedback reference.
    #[strum(serialize = "vrf")]
    Vrf = 3,
    #[strum(serialize = "vrs")]
    Vrs = 4,
    /// Shaper negative supply.
    #[strum(serialize = "vsvn")]
    Svn = 5,
    #[strum(serialize = "vtgstv")]
    Vtgstv = 6,
    /// Comparator, lower-left chip quadrant.
    #[strum(serialize = "vcmp_ll")]
    VcmpLl = 7,
    /// Comparator, lower-right chip quadrant.
    #[strum(serialize = "vcmp_lr")]
    VcmpLr = 8,
    /// Calibration pulse height. 4000 is no pulse, 0 the highest pulse.
    #[strum(serialize = "vcall")]
    Cal = 9,
    /// Comparator, upper-left chip quadrant.
    #[strum(serialize = "vcmp_rl")]
    VcmpRl = 10,
    #[strum(serialize = "rxb_rb")]
    RxbRb = 11,
    #[strum(serialize = "rxb_lb")]
    RxbLb = 12,
    /// Comparator, upper-right chip quadrant.
    #[strum(serialize = "vcmp_rr")]
    VcmpRr = 13,
    #[strum(serialize = "vcp")]
    Vcp = 14,
    #[strum(serialize = "vcn")]
    Vcn = 15,
    #[strum(serialize = "vis")]
    Vis = 16,
    /// Digital IO delay line.
    #[strum(serialize = "iodelay")]
    IoDelay = 17,
    /// Sensor bias voltage.
    #[strum(serialize = "vhighvoltage")]
    HighVoltage = 18,
    /// Readout FPGA temperature.
    #[strum(serialize = "temp_fpga")]
    TemperatureFpga = 19,
    /// Board temperature next to the FPGA.
    #[strum(serialize = "temp_fpgaext")]
    TemperatureFpgaExt = 20,
    /// 10GbE transceiver temperature.
    #[strum(serialize = "temp_10ge")]
    Temperature10Ge = 21,
    /// DC-DC converter temperature.
    #[strum(serialize = "temp_dcdc")]
    TemperatureDcdc = 22,
    /// Left SO-DIMM temperature.
    #[strum(serialize = "temp_sodl")]
    TemperatureSodl = 23,
    /// Right SO-DIMM temperature.
    #[strum(serialize = "temp_sodr")]
    TemperatureSodr = 24,
    /// Front-left FPGA temperature.
    #[strum(serialize = "temp_fpgafl")]
    TemperatureFpga2 = 25,
    /// Front-right FPGA temperature.
    #[strum(serialize = "temp_fpgafr")]
    TemperatureFpga3 = 26,
}

impl DacIndex {
    /// Whether this channel is a read-only temperature sensor.
    pub fn is_temperature(self) -> bool {
        (self as i32) >= (DacIndex::TemperatureFpga as i32)
    }
}

impl From<DacIndex> for i32 {
    fn from(value: DacIndex) -> Self {
        value as i32
    }
}

/// Shared acquisition timers and counters of the group.
///
/// Time-valued timers carry nanoseconds; the counters are unitless.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, EnumIter)]
#[repr(i32)]
pub enum TimerIndex {
    /// Frames per cycle.
    FrameNumber = 0,
    /// Exposure time of a single frame, in ns.
    AcquisitionTime = 1,
    /// Start-to-start period between frames, in ns.
    FramePeriod = 2,
    /// Delay between an external trigger and the exposure, in ns.
    DelayAfterTrigger = 3,
    /// Gates per frame when gating is enabled.
    GatesNumber = 4,
    /// Probes per measurement.
    ProbesNumber = 5,
    /// Trigger cycles per acquisition.
    CyclesNumber = 6,
    /// Repeated measurements per acquire call.
    MeasurementsNumber = 7,
    /// Exposure of one sub-frame in autosumming mode, in ns.
    SubframeAcquisitionTime = 8,
}

impl TimerIndex {
    /// Whether this timer carries a nanosecond time rather than a count.
    pub fn is_time(self) -> bool {
        matches!(
            self,
            TimerIndex::AcquisitionTime
                | TimerIndex::FramePeriod
                | TimerIndex::DelayAfterTrigger
                | TimerIndex::SubframeAcquisitionTime
        )
    }
}

/// Network configuration parameters of the modules and the receiver.
///
/// All of these are transported as strings by the control protocol, even
/// the ones that are numeric at the facade boundary (ports, delays).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, EnumString, IntoStaticStr, EnumIter)]
#[repr(i32)]
pub enum NetworkParameter {
    #[strum(serialize = "detector_mac")]
    DetectorMac = 0,
    #[strum(serialize = "detector_ip")]
    DetectorIp = 1,
    /// Hostname or IP of the receiver process.
    #[strum(serialize = "rx_hostname")]
    ReceiverHostname = 2,
    #[strum(serialize = "rx_udpip")]
    ReceiverUdpIp = 3,
    /// Historic spelling accepted by deployed call sites.
    #[strum(serialize = "rx_updport")]
    ReceiverUdpPort = 4,
    #[strum(serialize = "rx_udpmac")]
    ReceiverUdpMac = 5,
    /// UDP port of the second half module. Historic spelling, see above.
    #[strum(serialize = "rx_updport2")]
    ReceiverUdpPort2 = 6,
    /// Transmission delay on the left port for the next frame, in ns.
    #[strum(serialize = "delay_left")]
    DelayLeft = 7,
    /// Transmission delay on the right port for the next frame, in ns.
    #[strum(serialize = "delay_right")]
    DelayRight = 8,
    /// Transmission delay of a whole frame across all ports, in ns.
    #[strum(serialize = "delay_frame")]
    DelayFrame = 9,
    #[strum(serialize = "flow_control_10g")]
    FlowControl10G = 10,
    /// Client-side streaming TCP port.
    #[strum(serialize = "client_zmqport")]
    ClientStreamingPort = 11,
    /// Receiver-side streaming TCP port.
    #[strum(serialize = "rx_zmqport")]
    ReceiverStreamingPort = 12,
    /// Receiver-side streaming source IP.
    #[strum(serialize = "rx_zmqip")]
    ReceiverStreamingSrcIp = 13,
}

/// Readout mode flags. Values are bit positions in the flag register and
/// can be combined by the firmware.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, EnumString, IntoStaticStr, EnumIter)]
#[repr(u32)]
pub enum ReadoutFlag {
    #[strum(serialize = "none")]
    None = 0x0,
    /// Buffer frames in module RAM before sending.
    #[strum(serialize = "storeinram")]
    StoreInRam = 0x1,
    /// Time-over-threshold mode.
    #[strum(serialize = "tot")]
    TotMode = 0x2000,
    /// Historic spelling accepted by deployed call sites.
    #[strum(serialize = "continous")]
    ContinuousReadout = 0x4000,
    /// Read all chip quadrants in parallel.
    #[strum(serialize = "parallel")]
    Parallel = 0x10000,
    #[strum(serialize = "nonparallel")]
    NonParallel = 0x20000,
    /// Reduced-speed safe mode.
    #[strum(serialize = "safe")]
    Safe = 0x40000,
}

impl From<ReadoutFlag> for u32 {
    fn from(value: ReadoutFlag) -> Self {
        value as u32
    }
}

/// Gain and calibration settings of the detector.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, EnumString, IntoStaticStr, EnumIter)]
#[repr(i32)]
pub enum DetectorSettings {
    #[strum(serialize = "standard")]
    Standard = 0,
    #[strum(serialize = "fast")]
    Fast = 1,
    #[strum(serialize = "highgain")]
    HighGain = 2,
    #[strum(serialize = "dynamicgain")]
    DynamicGain = 3,
    #[strum(serialize = "lowgain")]
    LowGain = 4,
    #[strum(serialize = "mediumgain")]
    MediumGain = 5,
    #[strum(serialize = "veryhighgain")]
    VeryHighGain = 6,
    #[strum(serialize = "lownoise")]
    LowNoise = 7,
    #[strum(serialize = "dynamichg0")]
    DynamicHg0 = 8,
    #[strum(serialize = "fixgain1")]
    FixGain1 = 9,
    #[strum(serialize = "fixgain2")]
    FixGain2 = 10,
    #[strum(serialize = "forceswitchg1")]
    ForceSwitchG1 = 11,
    #[strum(serialize = "forceswitchg2")]
    ForceSwitchG2 = 12,
    #[strum(serialize = "verylowgain")]
    VeryLowGain = 13,
    /// Reported when the modules in a group disagree.
    #[strum(serialize = "undefined")]
    Undefined = -1,
}

impl TryFrom<i32> for DetectorSettings {
    type Error = i32;
    fn try_from(value: i32) -> core::result::Result<Self, Self::Error> {
        use strum::IntoEnumIterator;
        DetectorSettings::iter()
            .find(|s| *s as i32 == value)
            .ok_or(value)
    }
}

/// External timing (synchronization) modes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, EnumString, IntoStaticStr, EnumIter)]
#[repr(i32)]
pub enum TimingMode {
    /// Internal timing, frames taken back to back.
    #[strum(serialize = "auto")]
    Auto = 0,
    /// One exposure per external trigger.
    #[strum(serialize = "trigger")]
    TriggerExposure = 1,
    /// Exposure runs, readout on external trigger.
    #[strum(serialize = "ro_trigger")]
    TriggerReadout = 2,
    /// Fixed number of gates per frame.
    #[strum(serialize = "gating")]
    GateFixNumber = 3,
    /// Gating armed by a start trigger.
    #[strum(serialize = "triggered_gating")]
    GateWithStartTrigger = 4,
    /// One trigger starts a burst of frames.
    #[strum(serialize = "burst_trigger")]
    BurstTrigger = 5,
}

impl TryFrom<i32> for TimingMode {
    type Error = i32;
    fn try_from(value: i32) -> core::result::Result<Self, Self::Error> {
        use strum::IntoEnumIterator;
        TimingMode::iter().find(|m| *m as i32 == value).ok_or(value)
    }
}

/// Run state of the acquisition state machine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, IntoStaticStr, EnumIter)]
#[repr(i32)]
pub enum RunStatus {
    #[strum(serialize = "idle")]
    Idle = 0,
    #[strum(serialize = "error")]
    Error = 1,
    /// Armed, waiting for a trigger.
    #[strum(serialize = "waiting")]
    Waiting = 2,
    #[strum(serialize = "finished")]
    Finished = 3,
    /// Acquisition done, frames still leaving the modules.
    #[strum(serialize = "data")]
    Transmitting = 4,
    #[strum(serialize = "running")]
    Running = 5,
    #[strum(serialize = "stopped")]
    Stopped = 6,
}

/// Readout clock divider of the module FPGAs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter)]
#[repr(i32)]
pub enum ClockDivider {
    FullSpeed = 0,
    HalfSpeed = 1,
    QuarterSpeed = 2,
    SuperSlowSpeed = 3,
}

impl TryFrom<i32> for ClockDivider {
    type Error = i32;
    fn try_from(value: i32) -> core::result::Result<Self, Self::Error> {
        use strum::IntoEnumIterator;
        ClockDivider::iter().find(|c| *c as i32 == value).ok_or(value)
    }
}

/// Geometric axis of the detector plane.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i32)]
pub enum Dimension {
    /// Along a module row (columns).
    X = 0,
    /// Across module rows.
    Y = 1,
}

/// Addressing scope for operations that can target one module or the
/// whole group.
///
/// The control protocol encodes "all modules" as module id `-1`; that
/// convention stays below this type and is never part of the public API.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ModuleId {
    /// Apply to every module with one group-level call.
    All,
    /// Apply to the single module at this index.
    Module(usize),
}

impl ModuleId {
    /// Protocol encoding of this scope.
    pub(crate) fn to_protocol(self) -> i32 {
        match self {
            ModuleId::All => -1,
            ModuleId::Module(i) => i as i32,
        }
    }
}

fn lookup<T: FromStr>(name: &str) -> Result<T> {
    T::from_str(name).map_err(|_| Error::UnknownParameter {
        name: name.to_string(),
    })
}

/// Translate a DAC or ADC name into its protocol id.
pub fn dac_from_name(name: &str) -> Result<DacIndex> {
    lookup(name)
}

/// Translate a network parameter name into its protocol id.
pub fn network_parameter_from_name(name: &str) -> Result<NetworkParameter> {
    lookup(name)
}

/// Translate a readout flag name into its flag bit.
pub fn readout_flag_from_name(name: &str) -> Result<ReadoutFlag> {
    lookup(name)
}

/// Translate a settings name into its settings id.
pub fn settings_from_name(name: &str) -> Result<DetectorSettings> {
    lookup(name)
}

/// Translate a timing mode name into its mode id.
pub fn timing_mode_from_name(name: &str) -> Result<TimingMode> {
    lookup(name)
}
