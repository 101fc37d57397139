//! Interface consumed from the low-level multi-module control library.
//!
//! The library exposes one object per detector group plus one non-owning
//! handle per module. Its calls follow two conventions the facade has to
//! work with rather than around:
//!
//! * Read/write primitives are bidirectional. Passing `-1` queries the
//!   current value without modifying it; any other value writes and the
//!   current (new) value is returned. The facade keeps this convention
//!   strictly below [`crate::detector::Detector`] and exposes separate
//!   `get_*`/`set_*` operations instead.
//! * Failures are not returned from the call. Every fallible operation
//!   accumulates bits into a group-wide error mask which has to be read
//!   and cleared explicitly, see [`GroupControl::error_mask`].
//!
//! Implementations are free to block; every call runs to completion
//! before returning. One group instance must not be shared between
//! threads without external serialization, because the error mask is
//! read-then-cleared state.

use crate::ids::{DacIndex, Dimension, NetworkParameter, RunStatus, TimerIndex};

/// Non-owning handle to a single module within a group.
///
/// A handle is only valid while the module stays attached to its group;
/// handles are therefore borrowed per call and never stored.
pub trait ModuleControl {
    /// Dead-time constant tau of the rate correction, in ns. 0 disables.
    fn rate_correction(&self) -> f64;
    fn set_rate_correction(&mut self, tau_ns: f64);

    /// Readout flip of this module along `dim`. `-1` queries, 0/1 set.
    fn flipped_data(&mut self, dim: Dimension, value: i32) -> i32;

    /// Output path of the receiver writing this module's frames.
    fn file_path(&self) -> String;
    fn set_file_path(&mut self, path: &str);

    /// Frames the receiver has caught for this module in the current run.
    fn frames_caught(&self) -> i32;

    /// Per-module network parameter, transported as a string.
    fn network_parameter(&self, par: NetworkParameter) -> String;
    fn set_network_parameter(&mut self, par: NetworkParameter, value: &str);

    /// Activation state. A deactivated module stays in the group but is
    /// skipped by acquisitions. `-1` queries, 0/1 set.
    fn activate(&mut self, value: i32) -> i32;

    /// Control port of the receiver process for this module.
    /// `-1` queries, any other value sets.
    fn receiver_tcp_port(&mut self, value: i32) -> i32;

    /// Type string reported by this module's server.
    fn detector_type(&self) -> String;
}

/// One detector group: N modules plus the associated receiver.
pub trait GroupControl {
    type Module: ModuleControl;

    /// Number of modules currently attached to the group.
    fn module_count(&self) -> usize;
    /// Handle for the module at `index`, or `None` when the slot is empty
    /// or the module has been detached.
    fn module(&mut self, index: usize) -> Option<&mut Self::Module>;
    /// Module grid as (horizontal, vertical).
    fn geometry(&self) -> (i32, i32);
    /// Total channels of the assembled image along `dim`.
    fn max_channels(&self, dim: Dimension) -> i32;
    fn set_max_channels(&mut self, dim: Dimension, channels: i32);

    /// Run a full blocking acquisition: arm, expose, read out, hand
    /// frames to the receiver.
    fn acquire(&mut self);
    fn start_acquisition(&mut self);
    fn stop_acquisition(&mut self);
    fn start_receiver(&mut self);
    fn stop_receiver(&mut self);
    fn run_status(&self) -> RunStatus;
    fn acquiring_flag(&self) -> bool;
    fn set_acquiring_flag(&mut self, busy: bool);

    /// Shared group timer. `-1` queries, any other value sets.
    fn timer(&mut self, timer: TimerIndex, value: i64) -> i64;
    /// DAC access. `value` `-1` queries; `module` `-1` addresses every
    /// module with one call.
    fn dac(&mut self, dac: DacIndex, module: i32, value: i32) -> i32;
    /// ADC read. Temperature channels report millidegrees Celsius.
    fn adc(&mut self, adc: DacIndex, module: usize) -> i32;
    /// Bits per pixel. `-1` queries.
    fn dynamic_range(&mut self, value: i32) -> i32;
    /// Uniform level for all trimbits of all modules. `-1` queries.
    fn all_trimbits(&mut self, value: i32) -> i32;
    /// Comparator threshold in eV. `-1` queries.
    fn threshold_energy(&mut self, value: i32) -> i32;
    /// Settings id as defined by [`crate::ids::DetectorSettings`].
    /// `-1` queries.
    fn settings(&mut self, value: i32) -> i32;
    fn settings_dir(&self) -> String;
    fn set_settings_dir(&mut self, dir: &str);
    /// Load a trimbit file; `module` `-1` resolves per-module files by
    /// serial-number suffix.
    fn load_trimbit_file(&mut self, path: &str, module: i32);
    /// Energies at which the loaded calibration was trimmed, in eV.
    fn trim_energies(&self) -> Vec<i32>;
    fn set_trim_energies(&mut self, energies_ev: &[i32]);
    /// Matrix-reset bit. `-1` queries, 0/1 set.
    fn counter_bit(&mut self, value: i32) -> i32;
    /// Readout clock divider id. `-1` queries.
    fn speed(&mut self, value: i32) -> i32;
    /// Readout flag register. `-1` queries, any other value sets bits.
    fn readout_flags(&mut self, value: i32) -> i32;
    /// Timing mode id as defined by [`crate::ids::TimingMode`].
    /// `-1` queries.
    fn external_communication_mode(&mut self, value: i32) -> i32;

    /// `'+'`-joined hostnames of all module servers.
    fn hostname(&self) -> String;
    fn set_hostname(&mut self, hostname: &str);
    /// Type string of the group, e.g. a `'+'`-joined list per module.
    fn detector_type(&self) -> String;
    fn firmware_version(&self) -> i64;
    fn software_version(&self) -> i64;
    /// Probe every configured server. Returns the names that did not
    /// answer; empty when everything is reachable.
    fn check_online(&mut self) -> String;
    /// Online flag of the detector servers. `-1` queries, 0/1 set.
    fn online(&mut self, value: i32) -> i32;
    /// Online flag of the receiver. `-1` queries, 0/1 set.
    fn receiver_online(&mut self, value: i32) -> i32;
    /// IP of the last client that talked to the servers.
    fn last_client_ip(&self) -> String;

    fn file_name(&self) -> String;
    fn set_file_name(&mut self, name: &str);
    fn file_path(&self) -> String;
    fn set_file_path(&mut self, path: &str);
    /// Index appended to output files. `-1` queries.
    fn file_index(&mut self, value: i32) -> i32;
    /// Receiver file writing. `-1` queries, 0/1 set.
    fn enable_write_to_file(&mut self, value: i32) -> i32;
    fn file_format(&self) -> String;
    /// Streaming of frames out of the receiver. `-1` queries, 0/1 set.
    fn receiver_data_stream(&mut self, value: i32) -> i32;
    fn reset_frames_caught(&mut self);
    fn receiver_current_frame_index(&self) -> i32;

    /// Group-scoped network parameter, one call for all modules.
    fn network_parameter(&self, par: NetworkParameter) -> String;
    fn set_network_parameter(&mut self, par: NetworkParameter, value: &str);

    /// 10GbE data path. `-1` queries, 0/1 set.
    fn ten_gigabit_ethernet(&mut self, value: i32) -> i32;
    /// Receiver-side threaded frame processing. `-1` queries, 0/1 set.
    fn threaded_processing(&mut self, value: i32) -> i32;
    /// Remote lock of the detector servers to this client.
    /// `-1` queries, 0/1 set.
    fn server_lock(&mut self, value: i32) -> i32;
    /// Remote lock of the receiver to this client. `-1` queries, 0/1 set.
    fn receiver_lock(&mut self, value: i32) -> i32;
    /// Chip power. `-1` queries, 0/1 set.
    fn power_chip(&mut self, value: i32) -> i32;

    fn read_register(&mut self, addr: u32) -> u32;
    /// Write a control register and return its new value.
    fn write_register(&mut self, addr: u32, value: u32) -> u32;
    fn write_adc_register(&mut self, addr: u32, value: u32);

    /// Send `n` calibration pulses to the currently addressed pixel at
    /// offset (`x`, `y`).
    fn pulse_pixel(&mut self, n: i32, x: i32, y: i32);
    /// Send `n` pulses, then move the addressed pixel by (`dx`, `dy`).
    fn pulse_pixel_and_move(&mut self, n: i32, dx: i32, dy: i32);
    /// Toggle chip enable `n` times, advancing the pixel counters.
    fn pulse_chip(&mut self, n: i32);

    /// Cumulative error mask since the last clear.
    fn error_mask(&self) -> i64;
    /// Human-readable description of the set mask bits.
    fn error_message(&self) -> String;
    fn clear_error_mask(&mut self);
    /// Errors flagged critical since the last clear.
    fn critical_error_count(&self) -> usize;

    /// Execute a configuration file on the group.
    fn read_configuration_file(&mut self, path: &str);
    /// Execute a saved parameters/setup file on the group.
    fn retrieve_detector_setup(&mut self, path: &str);
    /// Drop the shared-memory segment backing the group. Every handle
    /// into the group is invalid afterwards.
    fn free_shared_memory(&mut self);
}
