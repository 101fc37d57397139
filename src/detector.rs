use tracing::{debug, warn};

use crate::client::{GroupControl, ModuleControl};
use crate::error::{Error, Result};
use crate::ids::{
    self, ClockDivider, DacIndex, DetectorSettings, Dimension, ModuleId, NetworkParameter,
    RunStatus, TimerIndex, TimingMode,
};
use crate::{pulse, scaling};

/// Bits per pixel the readout can be switched between.
const DYNAMIC_RANGES: [i32; 4] = [4, 8, 16, 32];
/// Width of the per-pixel trim DAC.
const TRIMBIT_MAX: i32 = 63;

/// Facade over one detector group and its receiver.
///
/// The facade owns its group client exclusively; it splits the client's
/// bidirectional sentinel primitives into paired `get_*`/`set_*`
/// operations, validates values against their semantic domain before any
/// hardware round-trip, and converts the client's error-mask register into
/// [`Error::Hardware`] results.
///
/// Every operation blocks until the hardware round-trip completes. The
/// error mask is read-then-cleared state shared across all calls on one
/// group, so access to a `Detector` must be serialized by its owner; the
/// server and receiver locks exposed here lock the *remote* side to this
/// client and do nothing for in-process callers.
pub struct Detector<C: GroupControl> {
    client: C,
    /// Identifier of the shared-memory segment this group lives in.
    group_id: i32,
}

impl<C: GroupControl> Detector<C> {
    /// Bind the facade to a group in the default shared-memory segment.
    pub fn new(client: C) -> Self {
        Self::with_group_id(client, 0)
    }

    /// Bind the facade to a group in an explicit shared-memory segment.
    ///
    /// Marks the detector and the receiver online, so configuration calls
    /// reach the hardware instead of the local cache.
    pub fn with_group_id(mut client: C, group_id: i32) -> Self {
        client.online(1);
        client.receiver_online(1);
        Self { client, group_id }
    }

    /// Identifier this facade was constructed with.
    pub fn group_id(&self) -> i32 {
        self.group_id
    }

    /// Number of modules attached to the group.
    pub fn module_count(&self) -> usize {
        self.client.module_count()
    }

    /// Module grid as (horizontal, vertical).
    pub fn module_geometry(&self) -> (i32, i32) {
        self.client.geometry()
    }

    /// Assembled image size in (rows, columns).
    pub fn get_image_size(&mut self) -> Result<(i32, i32)> {
        self.checked(|c| {
            Ok((
                c.max_channels(Dimension::Y),
                c.max_channels(Dimension::X),
            ))
        })
    }

    pub fn set_image_size(&mut self, rows: i32, columns: i32) -> Result<()> {
        if rows <= 0 {
            return Err(Error::OutOfRange {
                what: "image rows",
                value: rows.into(),
            });
        }
        if columns <= 0 {
            return Err(Error::OutOfRange {
                what: "image columns",
                value: columns.into(),
            });
        }
        self.checked(|c| {
            c.set_max_channels(Dimension::Y, rows);
            c.set_max_channels(Dimension::X, columns);
            Ok(())
        })
    }

    /// Hostnames of all module control servers.
    pub fn hostnames(&mut self) -> Result<Vec<String>> {
        self.checked(|c| Ok(scaling::split_hostnames(&c.hostname())))
    }

    pub fn set_hostname(&mut self, hostname: &str) -> Result<()> {
        self.checked(|c| {
            c.set_hostname(hostname);
            Ok(())
        })
    }

    /// Type string of the group.
    pub fn detector_type(&mut self) -> Result<String> {
        self.checked(|c| Ok(c.detector_type()))
    }

    /// Type string of every module, in index order.
    pub fn module_detector_types(&mut self) -> Result<Vec<String>> {
        self.checked(|c| {
            let n = c.module_count();
            let mut types = Vec::with_capacity(n);
            for index in 0..n {
                types.push(with_module(c, index, |m| m.detector_type())?);
            }
            Ok(types)
        })
    }

    pub fn firmware_version(&mut self) -> Result<i64> {
        self.checked(|c| Ok(c.firmware_version()))
    }

    pub fn software_version(&mut self) -> Result<i64> {
        self.checked(|c| Ok(c.software_version()))
    }

    /// Probe every configured server. Returns the names that did not
    /// answer; an empty string means everything is reachable.
    pub fn check_online(&mut self) -> Result<String> {
        self.checked(|c| Ok(c.check_online()))
    }

    pub fn get_online(&mut self) -> Result<bool> {
        self.checked(|c| Ok(c.online(-1) != 0))
    }

    pub fn set_online(&mut self, online: bool) -> Result<()> {
        self.checked(|c| {
            c.online(i32::from(online));
            Ok(())
        })
    }

    pub fn get_receiver_online(&mut self) -> Result<bool> {
        self.checked(|c| Ok(c.receiver_online(-1) != 0))
    }

    pub fn set_receiver_online(&mut self, online: bool) -> Result<()> {
        self.checked(|c| {
            c.receiver_online(i32::from(online));
            Ok(())
        })
    }

    /// IP of the last client that talked to the servers.
    pub fn last_client_ip(&mut self) -> Result<String> {
        self.checked(|c| Ok(c.last_client_ip()))
    }

    /// Run a full blocking acquisition with the configured timers.
    pub fn acquire(&mut self) -> Result<()> {
        debug!("starting blocking acquisition");
        self.checked(|c| {
            c.acquire();
            Ok(())
        })
    }

    /// Arm and start without waiting. Pair with the receiver calls.
    pub fn start_acquisition(&mut self) -> Result<()> {
        debug!("starting acquisition");
        self.checked(|c| {
            c.start_acquisition();
            Ok(())
        })
    }

    /// Stop a running acquisition early.
    pub fn stop_acquisition(&mut self) -> Result<()> {
        debug!("stopping acquisition");
        self.checked(|c| {
            c.stop_acquisition();
            Ok(())
        })
    }

    pub fn start_receiver(&mut self) -> Result<()> {
        self.checked(|c| {
            c.start_receiver();
            Ok(())
        })
    }

    pub fn stop_receiver(&mut self) -> Result<()> {
        self.checked(|c| {
            c.stop_receiver();
            Ok(())
        })
    }

    pub fn run_status(&mut self) -> Result<RunStatus> {
        self.checked(|c| Ok(c.run_status()))
    }

    /// Whether an acquisition is currently in progress.
    pub fn get_acquiring_flag(&mut self) -> Result<bool> {
        self.checked(|c| Ok(c.acquiring_flag()))
    }

    pub fn set_acquiring_flag(&mut self, busy: bool) -> Result<()> {
        self.checked(|c| {
            c.set_acquiring_flag(busy);
            Ok(())
        })
    }

    /// Read any group timer. Times are ns, counters unitless.
    pub fn get_timer(&mut self, timer: TimerIndex) -> Result<i64> {
        self.checked(|c| Ok(c.timer(timer, -1)))
    }

    /// Write any group timer; the value must be non-negative.
    pub fn set_timer(&mut self, timer: TimerIndex, value: i64) -> Result<()> {
        self.write_timer(timer, "timer value", value)
    }

    /// Exposure time of a single frame in ns.
    pub fn get_exposure_time(&mut self) -> Result<i64> {
        self.get_timer(TimerIndex::AcquisitionTime)
    }

    pub fn set_exposure_time(&mut self, time_ns: i64) -> Result<()> {
        self.write_timer(TimerIndex::AcquisitionTime, "exposure time", time_ns)
    }

    /// Exposure of one sub-frame in 32 bit autosumming mode, in ns.
    pub fn get_sub_exposure_time(&mut self) -> Result<i64> {
        self.get_timer(TimerIndex::SubframeAcquisitionTime)
    }

    pub fn set_sub_exposure_time(&mut self, time_ns: i64) -> Result<()> {
        self.write_timer(
            TimerIndex::SubframeAcquisitionTime,
            "sub-frame exposure time",
            time_ns,
        )
    }

    /// Start-to-start period between frames in ns. 0 lets the detector
    /// run as fast as it can.
    pub fn get_period(&mut self) -> Result<i64> {
        self.get_timer(TimerIndex::FramePeriod)
    }

    pub fn set_period(&mut self, time_ns: i64) -> Result<()> {
        self.write_timer(TimerIndex::FramePeriod, "frame period", time_ns)
    }

    /// Delay between an external trigger and the exposure, in ns.
    pub fn get_delay_after_trigger(&mut self) -> Result<i64> {
        self.get_timer(TimerIndex::DelayAfterTrigger)
    }

    pub fn set_delay_after_trigger(&mut self, time_ns: i64) -> Result<()> {
        self.write_timer(
            TimerIndex::DelayAfterTrigger,
            "delay after trigger",
            time_ns,
        )
    }

    pub fn get_number_of_frames(&mut self) -> Result<i64> {
        self.get_timer(TimerIndex::FrameNumber)
    }

    pub fn set_number_of_frames(&mut self, frames: i64) -> Result<()> {
        self.write_timer(TimerIndex::FrameNumber, "number of frames", frames)
    }

    pub fn get_number_of_cycles(&mut self) -> Result<i64> {
        self.get_timer(TimerIndex::CyclesNumber)
    }

    pub fn set_number_of_cycles(&mut self, cycles: i64) -> Result<()> {
        self.write_timer(TimerIndex::CyclesNumber, "number of cycles", cycles)
    }

    pub fn get_number_of_gates(&mut self) -> Result<i64> {
        self.get_timer(TimerIndex::GatesNumber)
    }

    pub fn set_number_of_gates(&mut self, gates: i64) -> Result<()> {
        self.write_timer(TimerIndex::GatesNumber, "number of gates", gates)
    }

    pub fn get_number_of_probes(&mut self) -> Result<i64> {
        self.get_timer(TimerIndex::ProbesNumber)
    }

    pub fn set_number_of_probes(&mut self, probes: i64) -> Result<()> {
        self.write_timer(TimerIndex::ProbesNumber, "number of probes", probes)
    }

    pub fn get_number_of_measurements(&mut self) -> Result<i64> {
        self.get_timer(TimerIndex::MeasurementsNumber)
    }

    pub fn set_number_of_measurements(&mut self, measurements: i64) -> Result<()> {
        self.write_timer(
            TimerIndex::MeasurementsNumber,
            "number of measurements",
            measurements,
        )
    }

    /// Read a DAC by name, for one module or the whole group.
    ///
    /// A group read reports `-1` when the modules disagree.
    pub fn get_dac(&mut self, name: &str, module: ModuleId) -> Result<i32> {
        let dac = writable_dac(name)?;
        self.validate_scope(module)?;
        self.checked(|c| Ok(c.dac(dac, module.to_protocol(), -1)))
    }

    /// Write a DAC by name, for one module or the whole group with a
    /// single call.
    pub fn set_dac(&mut self, name: &str, module: ModuleId, value: i32) -> Result<()> {
        let dac = writable_dac(name)?;
        if value < 0 {
            return Err(Error::OutOfRange {
                what: "dac value",
                value: value.into(),
            });
        }
        self.validate_scope(module)?;
        self.checked(|c| {
            c.dac(dac, module.to_protocol(), value);
            Ok(())
        })
    }

    /// Read a temperature sensor of one module, in degrees Celsius.
    pub fn get_temperature(&mut self, sensor: &str, module: usize) -> Result<f64> {
        let adc = ids::dac_from_name(sensor)?;
        if !adc.is_temperature() {
            return Err(Error::Unsupported {
                operation: "temperature read of a dac channel",
            });
        }
        self.validate_scope(ModuleId::Module(module))?;
        self.checked(|c| Ok(scaling::millidegrees_to_degrees(c.adc(adc, module))))
    }

    /// Comparator threshold of the whole group, in DAC units.
    pub fn get_vthreshold(&mut self) -> Result<i32> {
        self.checked(|c| Ok(c.dac(DacIndex::Threshold, ModuleId::All.to_protocol(), -1)))
    }

    pub fn set_vthreshold(&mut self, value: i32) -> Result<()> {
        self.set_dac("vthreshold", ModuleId::All, value)
    }

    /// Sensor bias voltage, in volts.
    pub fn get_high_voltage(&mut self) -> Result<i32> {
        self.checked(|c| Ok(c.dac(DacIndex::HighVoltage, ModuleId::All.to_protocol(), -1)))
    }

    pub fn set_high_voltage(&mut self, voltage: i32) -> Result<()> {
        self.set_dac("vhighvoltage", ModuleId::All, voltage)
    }

    /// Threshold energy in eV the trimbits are interpolated for.
    pub fn get_threshold_energy(&mut self) -> Result<i32> {
        self.checked(|c| Ok(c.threshold_energy(-1)))
    }

    pub fn set_threshold_energy(&mut self, energy_ev: i32) -> Result<()> {
        if energy_ev < 0 {
            return Err(Error::OutOfRange {
                what: "threshold energy",
                value: energy_ev.into(),
            });
        }
        self.checked(|c| {
            c.threshold_energy(energy_ev);
            Ok(())
        })
    }

    /// Gain and calibration settings of the group.
    pub fn get_settings(&mut self) -> Result<DetectorSettings> {
        self.checked(|c| {
            let raw = c.settings(-1);
            DetectorSettings::try_from(raw).map_err(|v| Error::Conversion {
                value: v.to_string(),
            })
        })
    }

    pub fn set_settings(&mut self, settings: DetectorSettings) -> Result<()> {
        self.checked(|c| {
            c.settings(settings as i32);
            Ok(())
        })
    }

    /// Directory the settings and trimbit files are searched in.
    pub fn get_settings_dir(&mut self) -> Result<String> {
        self.checked(|c| Ok(c.settings_dir()))
    }

    pub fn set_settings_dir(&mut self, dir: &str) -> Result<()> {
        self.checked(|c| {
            c.set_settings_dir(dir);
            Ok(())
        })
    }

    /// Load a trimbit file into one module, or resolve per-module files
    /// by serial-number suffix for the whole group.
    pub fn load_trimbit_file(&mut self, path: &str, module: ModuleId) -> Result<()> {
        self.validate_scope(module)?;
        self.checked(|c| {
            c.load_trimbit_file(path, module.to_protocol());
            Ok(())
        })
    }

    /// Energies in eV the loaded calibration was trimmed at.
    pub fn get_trim_energies(&mut self) -> Result<Vec<i32>> {
        self.checked(|c| Ok(c.trim_energies()))
    }

    pub fn set_trim_energies(&mut self, energies_ev: &[i32]) -> Result<()> {
        self.checked(|c| {
            c.set_trim_energies(energies_ev);
            Ok(())
        })
    }

    /// Uniform level of all trimbits, when one has been set.
    pub fn get_all_trimbits(&mut self) -> Result<i32> {
        self.checked(|c| Ok(c.all_trimbits(-1)))
    }

    /// Set every trimbit of every module to one level in 0..=63.
    pub fn set_all_trimbits(&mut self, level: i32) -> Result<()> {
        if !(0..=TRIMBIT_MAX).contains(&level) {
            return Err(Error::OutOfRange {
                what: "trimbit level",
                value: level.into(),
            });
        }
        self.checked(|c| {
            c.all_trimbits(level);
            Ok(())
        })
    }

    /// Bits per pixel of the readout.
    pub fn get_dynamic_range(&mut self) -> Result<i32> {
        self.checked(|c| Ok(c.dynamic_range(-1)))
    }

    /// Switch the readout to 4, 8, 16 or 32 bits per pixel.
    pub fn set_dynamic_range(&mut self, bits: i32) -> Result<()> {
        if !DYNAMIC_RANGES.contains(&bits) {
            return Err(Error::OutOfRange {
                what: "dynamic range",
                value: bits.into(),
            });
        }
        self.checked(|c| {
            c.dynamic_range(bits);
            Ok(())
        })
    }

    pub fn get_readout_clock(&mut self) -> Result<ClockDivider> {
        self.checked(|c| {
            let raw = c.speed(-1);
            ClockDivider::try_from(raw).map_err(|v| Error::Conversion {
                value: v.to_string(),
            })
        })
    }

    pub fn set_readout_clock(&mut self, divider: ClockDivider) -> Result<()> {
        self.checked(|c| {
            c.speed(divider as i32);
            Ok(())
        })
    }

    /// Raw readout flag register.
    pub fn get_readout_flags(&mut self) -> Result<u32> {
        self.checked(|c| Ok(c.readout_flags(-1) as u32))
    }

    /// Set a readout flag by name, e.g. `"tot"` or `"parallel"`.
    pub fn set_readout_flag(&mut self, flag: &str) -> Result<()> {
        let flag = ids::readout_flag_from_name(flag)?;
        self.checked(|c| {
            c.readout_flags(flag as u32 as i32);
            Ok(())
        })
    }

    /// Timing mode token, e.g. `"auto"` or `"trigger"`.
    pub fn get_timing_mode(&mut self) -> Result<String> {
        self.checked(|c| {
            let raw = c.external_communication_mode(-1);
            TimingMode::try_from(raw)
                .map(|mode| <&'static str>::from(mode).to_string())
                .map_err(|v| Error::Conversion {
                    value: v.to_string(),
                })
        })
    }

    pub fn set_timing_mode(&mut self, mode: &str) -> Result<()> {
        let mode = ids::timing_mode_from_name(mode)?;
        self.checked(|c| {
            c.external_communication_mode(mode as i32);
            Ok(())
        })
    }

    /// Matrix reset bit. `true` resets the matrix before each frame;
    /// disable to keep analog test pulses across an acquisition.
    pub fn get_counter_bit(&mut self) -> Result<bool> {
        self.checked(|c| Ok(c.counter_bit(-1) != 0))
    }

    pub fn set_counter_bit(&mut self, reset: bool) -> Result<()> {
        self.checked(|c| {
            c.counter_bit(i32::from(reset));
            Ok(())
        })
    }

    pub fn read_register(&mut self, addr: u32) -> Result<u32> {
        self.checked(|c| Ok(c.read_register(addr)))
    }

    /// Write a control register and return its new value.
    pub fn write_register(&mut self, addr: u32, value: u32) -> Result<u32> {
        self.checked(|c| Ok(c.write_register(addr, value)))
    }

    pub fn write_adc_register(&mut self, addr: u32, value: u32) -> Result<()> {
        self.checked(|c| {
            c.write_adc_register(addr, value);
            Ok(())
        })
    }

    pub fn is_chip_powered(&mut self) -> Result<bool> {
        self.checked(|c| Ok(c.power_chip(-1) != 0))
    }

    pub fn power_chip(&mut self, on: bool) -> Result<()> {
        self.checked(|c| {
            c.power_chip(i32::from(on));
            Ok(())
        })
    }

    /// Base name of the output files.
    pub fn get_file_name(&mut self) -> Result<String> {
        self.checked(|c| Ok(c.file_name()))
    }

    pub fn set_file_name(&mut self, name: &str) -> Result<()> {
        self.checked(|c| {
            c.set_file_name(name);
            Ok(())
        })
    }

    /// Directory the receiver writes output files into.
    pub fn get_file_path(&mut self) -> Result<String> {
        self.checked(|c| Ok(c.file_path()))
    }

    pub fn set_file_path(&mut self, path: &str) -> Result<()> {
        self.checked(|c| {
            c.set_file_path(path);
            Ok(())
        })
    }

    /// Index appended to output file names.
    pub fn get_file_index(&mut self) -> Result<i32> {
        self.checked(|c| Ok(c.file_index(-1)))
    }

    pub fn set_file_index(&mut self, index: i32) -> Result<()> {
        if index < 0 {
            return Err(Error::OutOfRange {
                what: "file index",
                value: index.into(),
            });
        }
        self.checked(|c| {
            c.file_index(index);
            Ok(())
        })
    }

    /// Whether the receiver writes frames to disk.
    pub fn get_file_write(&mut self) -> Result<bool> {
        self.checked(|c| Ok(c.enable_write_to_file(-1) == 1))
    }

    pub fn set_file_write(&mut self, write: bool) -> Result<()> {
        self.checked(|c| {
            c.enable_write_to_file(i32::from(write));
            Ok(())
        })
    }

    /// Format of the receiver output files.
    pub fn file_format(&mut self) -> Result<String> {
        self.checked(|c| Ok(c.file_format()))
    }

    /// Whether the receiver streams frames out over its data port.
    pub fn get_rx_datastream(&mut self) -> Result<bool> {
        self.checked(|c| Ok(c.receiver_data_stream(-1) != 0))
    }

    pub fn set_rx_datastream(&mut self, stream: bool) -> Result<()> {
        self.checked(|c| {
            c.receiver_data_stream(i32::from(stream));
            Ok(())
        })
    }

    /// Frames the receiver caught for one module in the current run.
    pub fn get_frames_caught(&mut self, module: usize) -> Result<i32> {
        self.checked(|c| with_module(c, module, |m| m.frames_caught()))
    }

    /// Frames caught for every module, in index order. Fails as a whole
    /// if any module does not resolve.
    pub fn get_frames_caught_per_module(&mut self) -> Result<Vec<i32>> {
        self.checked(|c| {
            let n = c.module_count();
            let mut counts = Vec::with_capacity(n);
            for index in 0..n {
                counts.push(with_module(c, index, |m| m.frames_caught())?);
            }
            Ok(counts)
        })
    }

    pub fn reset_frames_caught(&mut self) -> Result<()> {
        self.checked(|c| {
            c.reset_frames_caught();
            Ok(())
        })
    }

    pub fn receiver_current_frame_index(&mut self) -> Result<i32> {
        self.checked(|c| Ok(c.receiver_current_frame_index()))
    }

    /// Read a group-scoped network parameter by name.
    pub fn get_network_parameter(&mut self, name: &str) -> Result<String> {
        let par = ids::network_parameter_from_name(name)?;
        self.checked(|c| Ok(c.network_parameter(par)))
    }

    /// Write a group-scoped network parameter by name with one call for
    /// the whole group.
    pub fn set_network_parameter(&mut self, name: &str, value: &str) -> Result<()> {
        let par = ids::network_parameter_from_name(name)?;
        self.checked(|c| {
            c.set_network_parameter(par, value);
            Ok(())
        })
    }

    /// Transmission delay of a whole frame for one module, in ns.
    pub fn get_delay_frame(&mut self, module: usize) -> Result<i64> {
        self.module_delay(module, NetworkParameter::DelayFrame)
    }

    pub fn set_delay_frame(&mut self, module: usize, delay_ns: i64) -> Result<()> {
        self.set_module_delay(module, NetworkParameter::DelayFrame, "frame delay", delay_ns)
    }

    /// Transmission delay on the left port for one module, in ns.
    pub fn get_delay_left(&mut self, module: usize) -> Result<i64> {
        self.module_delay(module, NetworkParameter::DelayLeft)
    }

    pub fn set_delay_left(&mut self, module: usize, delay_ns: i64) -> Result<()> {
        self.set_module_delay(module, NetworkParameter::DelayLeft, "left port delay", delay_ns)
    }

    /// Transmission delay on the right port for one module, in ns.
    pub fn get_delay_right(&mut self, module: usize) -> Result<i64> {
        self.module_delay(module, NetworkParameter::DelayRight)
    }

    pub fn set_delay_right(&mut self, module: usize, delay_ns: i64) -> Result<()> {
        self.set_module_delay(
            module,
            NetworkParameter::DelayRight,
            "right port delay",
            delay_ns,
        )
    }

    /// Rate correction tau of every module in ns, in index order.
    pub fn get_rate_correction(&mut self) -> Result<Vec<f64>> {
        self.checked(|c| {
            let n = c.module_count();
            let mut taus = Vec::with_capacity(n);
            for index in 0..n {
                taus.push(with_module(c, index, |m| m.rate_correction())?);
            }
            Ok(taus)
        })
    }

    /// Set the rate correction tau of every module. Takes one value per
    /// module; 0 disables the correction for that module.
    pub fn set_rate_correction(&mut self, tau_ns: &[f64]) -> Result<()> {
        let expected = self.client.module_count();
        if tau_ns.len() != expected {
            return Err(Error::LengthMismatch {
                expected,
                got: tau_ns.len(),
            });
        }
        self.checked(|c| {
            for (index, tau) in tau_ns.iter().enumerate() {
                with_module(c, index, |m| m.set_rate_correction(*tau))?;
            }
            Ok(())
        })
    }

    /// Whether one module's data is flipped along x.
    pub fn get_flipped_data_x(&mut self, module: usize) -> Result<bool> {
        self.flipped(module, Dimension::X)
    }

    pub fn set_flipped_data_x(&mut self, module: usize, flipped: bool) -> Result<()> {
        self.set_flipped(module, Dimension::X, flipped)
    }

    /// Whether one module's data is flipped along y.
    pub fn get_flipped_data_y(&mut self, module: usize) -> Result<bool> {
        self.flipped(module, Dimension::Y)
    }

    pub fn set_flipped_data_y(&mut self, module: usize, flipped: bool) -> Result<()> {
        self.set_flipped(module, Dimension::Y, flipped)
    }

    /// Whether one module takes part in acquisitions.
    pub fn get_active(&mut self, module: usize) -> Result<bool> {
        self.checked(|c| Ok(with_module(c, module, |m| m.activate(-1))? != 0))
    }

    pub fn set_active(&mut self, module: usize, active: bool) -> Result<()> {
        self.checked(|c| {
            with_module(c, module, |m| {
                m.activate(i32::from(active));
            })
        })
    }

    /// Control port of the receiver process serving one module.
    pub fn get_rx_tcp_port(&mut self, module: usize) -> Result<i32> {
        self.checked(|c| with_module(c, module, |m| m.receiver_tcp_port(-1)))
    }

    pub fn set_rx_tcp_port(&mut self, module: usize, port: i32) -> Result<()> {
        if !(1..=65535).contains(&port) {
            return Err(Error::OutOfRange {
                what: "receiver tcp port",
                value: port.into(),
            });
        }
        self.checked(|c| {
            with_module(c, module, |m| {
                m.receiver_tcp_port(port);
            })
        })
    }

    /// Output path of the receiver writing one module's frames.
    pub fn get_module_file_path(&mut self, module: usize) -> Result<String> {
        self.checked(|c| with_module(c, module, |m| m.file_path()))
    }

    pub fn set_module_file_path(&mut self, module: usize, path: &str) -> Result<()> {
        self.checked(|c| {
            with_module(c, module, |m| {
                m.set_file_path(path);
            })
        })
    }

    /// Remote lock of the detector servers to this client.
    pub fn get_server_lock(&mut self) -> Result<bool> {
        self.checked(|c| Ok(c.server_lock(-1) != 0))
    }

    pub fn set_server_lock(&mut self, locked: bool) -> Result<()> {
        self.checked(|c| {
            c.server_lock(i32::from(locked));
            Ok(())
        })
    }

    /// Remote lock of the receiver to this client.
    pub fn get_receiver_lock(&mut self) -> Result<bool> {
        self.checked(|c| Ok(c.receiver_lock(-1) != 0))
    }

    pub fn set_receiver_lock(&mut self, locked: bool) -> Result<()> {
        self.checked(|c| {
            c.receiver_lock(i32::from(locked));
            Ok(())
        })
    }

    /// Whether the modules send data over the 10GbE path.
    pub fn get_ten_gigabit_ethernet(&mut self) -> Result<bool> {
        self.checked(|c| Ok(c.ten_gigabit_ethernet(-1) != 0))
    }

    pub fn set_ten_gigabit_ethernet(&mut self, enabled: bool) -> Result<()> {
        self.checked(|c| {
            c.ten_gigabit_ethernet(i32::from(enabled));
            Ok(())
        })
    }

    /// Whether the receiver processes frames on worker threads.
    pub fn get_threaded_processing(&mut self) -> Result<bool> {
        self.checked(|c| Ok(c.threaded_processing(-1) != 0))
    }

    pub fn set_threaded_processing(&mut self, threaded: bool) -> Result<()> {
        self.checked(|c| {
            c.threaded_processing(i32::from(threaded));
            Ok(())
        })
    }

    /// Gap pixel interpolation is reserved for the assembled-module
    /// variant of the readout.
    pub fn get_gap_pixels(&mut self) -> Result<bool> {
        Err(Error::Unsupported {
            operation: "gap pixels",
        })
    }

    pub fn set_gap_pixels(&mut self, _enabled: bool) -> Result<()> {
        Err(Error::Unsupported {
            operation: "gap pixels",
        })
    }

    /// Toggle chip enable `n` times, advancing the pixel counters by
    /// `2n + 2`. `-1` resets the counters.
    pub fn pulse_chip(&mut self, n: i32) -> Result<()> {
        if n < -1 {
            return Err(Error::OutOfRange {
                what: "chip pulse count",
                value: n.into(),
            });
        }
        self.checked(|c| {
            c.pulse_chip(n);
            Ok(())
        })
    }

    /// Pulse every pixel `n` times with the analog test pulses. The pulse
    /// height is set through the `"vcall"` dac.
    pub fn pulse_all_pixels(&mut self, n: i32) -> Result<()> {
        if n < 0 {
            return Err(Error::OutOfRange {
                what: "pixel pulse count",
                value: n.into(),
            });
        }
        self.checked(|c| {
            pulse::pulse_all_pixels(c, n);
            Ok(())
        })
    }

    /// Pulse the diagonal calibration pattern `n` times.
    pub fn pulse_diagonal(&mut self, n: i32) -> Result<()> {
        if n < 0 {
            return Err(Error::OutOfRange {
                what: "pixel pulse count",
                value: n.into(),
            });
        }
        self.checked(|c| {
            pulse::pulse_diagonal(c, n);
            Ok(())
        })
    }

    /// Execute a configuration file on the group.
    pub fn load_config(&mut self, path: &str) -> Result<()> {
        debug!(path, "loading configuration file");
        self.checked(|c| {
            c.read_configuration_file(path);
            Ok(())
        })
    }

    /// Execute a saved parameters file on the group.
    pub fn load_parameters(&mut self, path: &str) -> Result<()> {
        debug!(path, "loading parameters file");
        self.checked(|c| {
            c.retrieve_detector_setup(path);
            Ok(())
        })
    }

    /// Cumulative error mask since the last clear.
    pub fn error_mask(&self) -> i64 {
        self.client.error_mask()
    }

    /// Description of the currently set mask bits.
    pub fn error_message(&self) -> String {
        self.client.error_message()
    }

    pub fn clear_error_mask(&mut self) {
        self.client.clear_error_mask();
    }

    /// Errors flagged critical since the last clear.
    pub fn critical_error_count(&self) -> usize {
        self.client.critical_error_count()
    }

    /// Drop the shared-memory segment backing the group.
    ///
    /// Consumes the facade: nothing can address the group afterwards
    /// until it is reconfigured from scratch.
    pub fn free_shared_memory(mut self) {
        debug!(group_id = self.group_id, "freeing shared memory segment");
        self.client.free_shared_memory();
    }

    /// Run one client operation under the error-mask protocol: clear the
    /// mask, run, re-read the mask, and surface a set mask as
    /// [`Error::Hardware`] with the mask cleared again, so the next call
    /// starts from a clean register.
    fn checked<T>(&mut self, op: impl FnOnce(&mut C) -> Result<T>) -> Result<T> {
        self.client.clear_error_mask();
        let result = op(&mut self.client)?;
        let mask = self.client.error_mask();
        if mask != 0 {
            let message = self.client.error_message();
            self.client.clear_error_mask();
            warn!(mask, %message, "control servers rejected the request");
            return Err(Error::Hardware { message });
        }
        Ok(result)
    }

    /// Bounds-check an addressing scope before any hardware call.
    fn validate_scope(&self, module: ModuleId) -> Result<()> {
        if let ModuleId::Module(index) = module {
            if index >= self.client.module_count() {
                return Err(Error::ModuleNotFound { index });
            }
        }
        Ok(())
    }

    fn write_timer(&mut self, timer: TimerIndex, what: &'static str, value: i64) -> Result<()> {
        if value < 0 {
            return Err(Error::OutOfRange { what, value });
        }
        self.checked(|c| {
            c.timer(timer, value);
            Ok(())
        })
    }

    fn module_delay(&mut self, module: usize, par: NetworkParameter) -> Result<i64> {
        self.checked(|c| {
            let raw = with_module(c, module, |m| m.network_parameter(par))?;
            scaling::parse_delay_ns(&raw)
        })
    }

    fn set_module_delay(
        &mut self,
        module: usize,
        par: NetworkParameter,
        what: &'static str,
        delay_ns: i64,
    ) -> Result<()> {
        if delay_ns < 0 {
            return Err(Error::OutOfRange {
                what,
                value: delay_ns,
            });
        }
        self.checked(|c| {
            with_module(c, module, |m| {
                m.set_network_parameter(par, &delay_ns.to_string());
            })
        })
    }

    fn flipped(&mut self, module: usize, dim: Dimension) -> Result<bool> {
        self.checked(|c| Ok(with_module(c, module, |m| m.flipped_data(dim, -1))? != 0))
    }

    fn set_flipped(&mut self, module: usize, dim: Dimension, flipped: bool) -> Result<()> {
        self.checked(|c| {
            with_module(c, module, |m| {
                m.flipped_data(dim, i32::from(flipped));
            })
        })
    }
}

/// Resolve a module for the duration of one operation.
///
/// The handle is borrowed from the group and never outlives the call, so
/// a module detached between two facade calls can never be addressed
/// through a stale handle.
fn with_module<C: GroupControl, T>(
    client: &mut C,
    index: usize,
    op: impl FnOnce(&mut C::Module) -> T,
) -> Result<T> {
    if index >= client.module_count() {
        return Err(Error::ModuleNotFound { index });
    }
    match client.module(index) {
        Some(module) => Ok(op(module)),
        None => Err(Error::ModuleNotFound { index }),
    }
}

/// Look up a DAC name, rejecting the read-only temperature channels.
fn writable_dac(name: &str) -> Result<DacIndex> {
    let dac = ids::dac_from_name(name)?;
    if dac.is_temperature() {
        return Err(Error::Unsupported {
            operation: "dac access to a temperature channel",
        });
    }
    Ok(dac)
}
