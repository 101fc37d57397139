//! We use this mocking module in unit tests to emulate a detector group.
//!
//! The mock keeps every register in plain maps and fields, mirrors the
//! sentinel conventions of the real control library, records the pulse
//! primitives it receives, and can be armed to raise error-mask bits on
//! its next call.

use std::collections::HashMap;

use crate::client::{GroupControl, ModuleControl};
use crate::ids::{DacIndex, Dimension, NetworkParameter, RunStatus, TimerIndex};

/// One recorded pulse primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PulseCall {
    /// Pulse in place at an absolute offset.
    At { n: i32, x: i32, y: i32 },
    /// Pulse then step the address.
    Move { n: i32, dx: i32, dy: i32 },
    /// Chip-enable toggling.
    Chip { n: i32 },
}

/// Sentinel-aware register access: `-1` reads, everything else writes.
fn rw(slot: &mut i32, value: i32) -> i32 {
    if value != -1 {
        *slot = value;
    }
    *slot
}

/// Emulated single module.
pub(crate) struct MockModule {
    pub(crate) rate_correction: f64,
    pub(crate) flipped: [i32; 2],
    pub(crate) file_path: String,
    pub(crate) frames_caught: i32,
    pub(crate) network: HashMap<NetworkParameter, String>,
    pub(crate) active: i32,
    pub(crate) tcp_port: i32,
    pub(crate) detector_type: String,
}

impl MockModule {
    fn new() -> Self {
        Self {
            rate_correction: 0.0,
            flipped: [0, 0],
            file_path: String::new(),
            frames_caught: 0,
            network: HashMap::new(),
            active: 1,
            // Default control port of a freshly started receiver.
            tcp_port: 1954,
            detector_type: "Eiger".to_string(),
        }
    }
}

impl ModuleControl for MockModule {
    fn rate_correction(&self) -> f64 {
        self.rate_correction
    }

    fn set_rate_correction(&mut self, tau_ns: f64) {
        self.rate_correction = tau_ns;
    }

    fn flipped_data(&mut self, dim: Dimension, value: i32) -> i32 {
        rw(&mut self.flipped[dim as usize], value)
    }

    fn file_path(&self) -> String {
        self.file_path.clone()
    }

    fn set_file_path(&mut self, path: &str) {
        self.file_path = path.to_string();
    }

    fn frames_caught(&self) -> i32 {
        self.frames_caught
    }

    fn network_parameter(&self, par: NetworkParameter) -> String {
        self.network.get(&par).cloned().unwrap_or_else(|| "0".to_string())
    }

    fn set_network_parameter(&mut self, par: NetworkParameter, value: &str) {
        self.network.insert(par, value.to_string());
    }

    fn activate(&mut self, value: i32) -> i32 {
        rw(&mut self.active, value)
    }

    fn receiver_tcp_port(&mut self, value: i32) -> i32 {
        rw(&mut self.tcp_port, value)
    }

    fn detector_type(&self) -> String {
        self.detector_type.clone()
    }
}

/// Emulated detector group with a scriptable error mask.
pub(crate) struct MockGroup {
    pub(crate) modules: Vec<Option<MockModule>>,
    pub(crate) geometry: (i32, i32),
    pub(crate) image_channels: [i32; 2],

    pub(crate) timers: HashMap<TimerIndex, i64>,
    pub(crate) dacs: HashMap<(DacIndex, i32), i32>,
    pub(crate) adcs: HashMap<(DacIndex, usize), i32>,
    pub(crate) network: HashMap<NetworkParameter, String>,
    pub(crate) registers: HashMap<u32, u32>,
    pub(crate) adc_registers: HashMap<u32, u32>,

    pub(crate) dynamic_range: i32,
    pub(crate) trimbits: i32,
    pub(crate) threshold_ev: i32,
    pub(crate) settings: i32,
    pub(crate) counter_bit: i32,
    pub(crate) speed: i32,
    pub(crate) readout_flags: i32,
    pub(crate) timing_mode: i32,
    pub(crate) online: i32,
    pub(crate) receiver_online: i32,
    pub(crate) file_index: i32,
    pub(crate) write_to_file: i32,
    pub(crate) data_stream: i32,
    pub(crate) ten_giga: i32,
    pub(crate) threaded: i32,
    pub(crate) server_lock: i32,
    pub(crate) receiver_lock: i32,
    pub(crate) chip_power: i32,

    pub(crate) hostname: String,
    pub(crate) detector_type: String,
    pub(crate) file_name: String,
    pub(crate) file_path: String,
    pub(crate) file_format: String,
    pub(crate) settings_dir: String,
    pub(crate) last_client_ip: String,
    pub(crate) check_online_result: String,
    pub(crate) trim_energies: Vec<i32>,
    pub(crate) trimbit_loads: Vec<(String, i32)>,
    pub(crate) config_files: Vec<String>,
    pub(crate) setup_files: Vec<String>,

    pub(crate) run_status: RunStatus,
    pub(crate) acquiring: bool,
    pub(crate) acquire_count: usize,
    pub(crate) start_acquisition_count: usize,
    pub(crate) stop_acquisition_count: usize,
    pub(crate) start_receiver_count: usize,
    pub(crate) stop_receiver_count: usize,
    pub(crate) current_frame_index: i32,
    pub(crate) firmware_version: i64,
    pub(crate) software_version: i64,

    pub(crate) pulse_log: Vec<PulseCall>,

    pub(crate) error_mask: i64,
    pub(crate) error_message: String,
    pub(crate) critical_errors: usize,
    /// Armed failure applied by the next hardware-touching call.
    pending_failure: Option<(i64, String)>,

    pub(crate) freed: bool,
}

impl MockGroup {
    /// Create a group with `n` live modules and everything at defaults.
    pub(crate) fn new(n: usize) -> Self {
        Self {
            modules: (0..n).map(|_| Some(MockModule::new())).collect(),
            geometry: (1, n as i32),
            image_channels: [1024, 256 * n as i32],
            timers: HashMap::new(),
            dacs: HashMap::new(),
            adcs: HashMap::new(),
            network: HashMap::new(),
            registers: HashMap::new(),
            adc_registers: HashMap::new(),
            dynamic_range: 16,
            trimbits: 0,
            threshold_ev: 0,
            settings: 0,
            counter_bit: 1,
            speed: 1,
            readout_flags: 0,
            timing_mode: 0,
            online: 0,
            receiver_online: 0,
            // The real library reports -100 when no index was ever set.
            file_index: -100,
            write_to_file: 0,
            data_stream: 0,
            ten_giga: 0,
            threaded: 1,
            server_lock: 0,
            receiver_lock: 0,
            chip_power: 0,
            hostname: String::new(),
            detector_type: "Eiger".to_string(),
            file_name: "run".to_string(),
            file_path: String::new(),
            file_format: "binary".to_string(),
            settings_dir: String::new(),
            last_client_ip: String::new(),
            check_online_result: String::new(),
            trim_energies: Vec::new(),
            trimbit_loads: Vec::new(),
            config_files: Vec::new(),
            setup_files: Vec::new(),
            run_status: RunStatus::Idle,
            acquiring: false,
            acquire_count: 0,
            start_acquisition_count: 0,
            stop_acquisition_count: 0,
            start_receiver_count: 0,
            stop_receiver_count: 0,
            current_frame_index: 0,
            firmware_version: 0,
            software_version: 0,
            pulse_log: Vec::new(),
            error_mask: 0,
            error_message: String::new(),
            critical_errors: 0,
            pending_failure: None,
            freed: false,
        }
    }

    /// Arm the mask so the next hardware-touching call fails.
    pub(crate) fn fail_next(&mut self, mask: i64, message: &str) {
        self.pending_failure = Some((mask, message.to_string()));
    }

    /// Empty the slot at `index`, emulating a detached module.
    pub(crate) fn detach_module(&mut self, index: usize) {
        self.modules[index] = None;
    }

    /// Apply an armed failure, if any.
    fn touch(&mut self) {
        if let Some((mask, message)) = self.pending_failure.take() {
            self.error_mask |= mask;
            self.error_message = message;
        }
    }
}

impl GroupControl for MockGroup {
    type Module = MockModule;

    fn module_count(&self) -> usize {
        self.modules.len()
    }

    fn module(&mut self, index: usize) -> Option<&mut MockModule> {
        self.modules.get_mut(index).and_then(|slot| slot.as_mut())
    }

    fn geometry(&self) -> (i32, i32) {
        self.geometry
    }

    fn max_channels(&self, dim: Dimension) -> i32 {
        self.image_channels[dim as usize]
    }

    fn set_max_channels(&mut self, dim: Dimension, channels: i32) {
        self.image_channels[dim as usize] = channels;
    }

    fn acquire(&mut self) {
        self.touch();
        self.acquire_count += 1;
    }

    fn start_acquisition(&mut self) {
        self.touch();
        self.start_acquisition_count += 1;
    }

    fn stop_acquisition(&mut self) {
        self.touch();
        self.stop_acquisition_count += 1;
    }

    fn start_receiver(&mut self) {
        self.touch();
        self.start_receiver_count += 1;
    }

    fn stop_receiver(&mut self) {
        self.touch();
        self.stop_receiver_count += 1;
    }

    fn run_status(&self) -> RunStatus {
        self.run_status
    }

    fn acquiring_flag(&self) -> bool {
        self.acquiring
    }

    fn set_acquiring_flag(&mut self, busy: bool) {
        self.acquiring = busy;
    }

    fn timer(&mut self, timer: TimerIndex, value: i64) -> i64 {
        self.touch();
        if value != -1 {
            self.timers.insert(timer, value);
        }
        self.timers.get(&timer).copied().unwrap_or(-1)
    }

    fn dac(&mut self, dac: DacIndex, module: i32, value: i32) -> i32 {
        self.touch();
        if value != -1 {
            if module == -1 {
                for i in 0..self.modules.len() {
                    self.dacs.insert((dac, i as i32), value);
                }
            } else {
                self.dacs.insert((dac, module), value);
            }
        }
        if module == -1 {
            // Group reads report -1 unless every module agrees.
            let mut values = (0..self.modules.len())
                .map(|i| self.dacs.get(&(dac, i as i32)).copied().unwrap_or(-1));
            match values.next() {
                None => -1,
                Some(first) => {
                    if values.all(|v| v == first) {
                        first
                    } else {
                        -1
                    }
                }
            }
        } else {
            self.dacs.get(&(dac, module)).copied().unwrap_or(-1)
        }
    }

    fn adc(&mut self, adc: DacIndex, module: usize) -> i32 {
        self.touch();
        self.adcs.get(&(adc, module)).copied().unwrap_or(0)
    }

    fn dynamic_range(&mut self, value: i32) -> i32 {
        self.touch();
        rw(&mut self.dynamic_range, value)
    }

    fn all_trimbits(&mut self, value: i32) -> i32 {
        self.touch();
        rw(&mut self.trimbits, value)
    }

    fn threshold_energy(&mut self, value: i32) -> i32 {
        self.touch();
        rw(&mut self.threshold_ev, value)
    }

    fn settings(&mut self, value: i32) -> i32 {
        self.touch();
        rw(&mut self.settings, value)
    }

    fn settings_dir(&self) -> String {
        self.settings_dir.clone()
    }

    fn set_settings_dir(&mut self, dir: &str) {
        self.settings_dir = dir.to_string();
    }

    fn load_trimbit_file(&mut self, path: &str, module: i32) {
        self.touch();
        self.trimbit_loads.push((path.to_string(), module));
    }

    fn trim_energies(&self) -> Vec<i32> {
        self.trim_energies.clone()
    }

    fn set_trim_energies(&mut self, energies_ev: &[i32]) {
        self.trim_energies = energies_ev.to_vec();
    }

    fn counter_bit(&mut self, value: i32) -> i32 {
        self.touch();
        rw(&mut self.counter_bit, value)
    }

    fn speed(&mut self, value: i32) -> i32 {
        self.touch();
        rw(&mut self.speed, value)
    }

    fn readout_flags(&mut self, value: i32) -> i32 {
        self.touch();
        rw(&mut self.readout_flags, value)
    }

    fn external_communication_mode(&mut self, value: i32) -> i32 {
        self.touch();
        rw(&mut self.timing_mode, value)
    }

    fn hostname(&self) -> String {
        self.hostname.clone()
    }

    fn set_hostname(&mut self, hostname: &str) {
        self.hostname = hostname.to_string();
    }

    fn detector_type(&self) -> String {
        self.detector_type.clone()
    }

    fn firmware_version(&self) -> i64 {
        self.firmware_version
    }

    fn software_version(&self) -> i64 {
        self.software_version
    }

    fn check_online(&mut self) -> String {
        self.check_online_result.clone()
    }

    fn online(&mut self, value: i32) -> i32 {
        rw(&mut self.online, value)
    }

    fn receiver_online(&mut self, value: i32) -> i32 {
        rw(&mut self.receiver_online, value)
    }

    fn last_client_ip(&self) -> String {
        self.last_client_ip.clone()
    }

    fn file_name(&self) -> String {
        self.file_name.clone()
    }

    fn set_file_name(&mut self, name: &str) {
        self.file_name = name.to_string();
    }

    fn file_path(&self) -> String {
        self.file_path.clone()
    }

    fn set_file_path(&mut self, path: &str) {
        self.file_path = path.to_string();
    }

    fn file_index(&mut self, value: i32) -> i32 {
        self.touch();
        rw(&mut self.file_index, value)
    }

    fn enable_write_to_file(&mut self, value: i32) -> i32 {
        self.touch();
        rw(&mut self.write_to_file, value)
    }

    fn file_format(&self) -> String {
        self.file_format.clone()
    }

    fn receiver_data_stream(&mut self, value: i32) -> i32 {
        self.touch();
        rw(&mut self.data_stream, value)
    }

    fn reset_frames_caught(&mut self) {
        self.touch();
        for module in self.modules.iter_mut().flatten() {
            module.frames_caught = 0;
        }
    }

    fn receiver_current_frame_index(&self) -> i32 {
        self.current_frame_index
    }

    fn network_parameter(&self, par: NetworkParameter) -> String {
        self.network.get(&par).cloned().unwrap_or_default()
    }

    fn set_network_parameter(&mut self, par: NetworkParameter, value: &str) {
        self.touch();
        self.network.insert(par, value.to_string());
    }

    fn ten_gigabit_ethernet(&mut self, value: i32) -> i32 {
        self.touch();
        rw(&mut self.ten_giga, value)
    }

    fn threaded_processing(&mut self, value: i32) -> i32 {
        self.touch();
        rw(&mut self.threaded, value)
    }

    fn server_lock(&mut self, value: i32) -> i32 {
        self.touch();
        rw(&mut self.server_lock, value)
    }

    fn receiver_lock(&mut self, value: i32) -> i32 {
        self.touch();
        rw(&mut self.receiver_lock, value)
    }

    fn power_chip(&mut self, value: i32) -> i32 {
        self.touch();
        rw(&mut self.chip_power, value)
    }

    fn read_register(&mut self, addr: u32) -> u32 {
        self.touch();
        self.registers.get(&addr).copied().unwrap_or(0)
    }

    fn write_register(&mut self, addr: u32, value: u32) -> u32 {
        self.touch();
        self.registers.insert(addr, value);
        value
    }

    fn write_adc_register(&mut self, addr: u32, value: u32) {
        self.touch();
        self.adc_registers.insert(addr, value);
    }

    fn pulse_pixel(&mut self, n: i32, x: i32, y: i32) {
        self.pulse_log.push(PulseCall::At { n, x, y });
    }

    fn pulse_pixel_and_move(&mut self, n: i32, dx: i32, dy: i32) {
        self.pulse_log.push(PulseCall::Move { n, dx, dy });
    }

    fn pulse_chip(&mut self, n: i32) {
        self.touch();
        self.pulse_log.push(PulseCall::Chip { n });
    }

    fn error_mask(&self) -> i64 {
        self.error_mask
    }

    fn error_message(&self) -> String {
        self.error_message.clone()
    }

    fn clear_error_mask(&mut self) {
        self.error_mask = 0;
        self.error_message.clear();
    }

    fn critical_error_count(&self) -> usize {
        self.critical_errors
    }

    fn read_configuration_file(&mut self, path: &str) {
        self.touch();
        self.config_files.push(path.to_string());
    }

    fn retrieve_detector_setup(&mut self, path: &str) {
        self.touch();
        self.setup_files.push(path.to_string());
    }

    fn free_shared_memory(&mut self) {
        self.freed = true;
        self.modules.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_read_does_not_write() {
        let mut mock = MockGroup::new(1);
        assert_eq!(mock.dynamic_range(-1), 16);
        assert_eq!(mock.dynamic_range(32), 32);
        assert_eq!(mock.dynamic_range(-1), 32);
    }

    #[test]
    fn group_dac_read_requires_consensus() {
        let mut mock = MockGroup::new(2);
        mock.dac(DacIndex::Vrf, -1, 1500);
        assert_eq!(mock.dac(DacIndex::Vrf, -1, -1), 1500);

        // One module diverges, the group read turns indeterminate.
        mock.dac(DacIndex::Vrf, 1, 1700);
        assert_eq!(mock.dac(DacIndex::Vrf, -1, -1), -1);
        assert_eq!(mock.dac(DacIndex::Vrf, 0, -1), 1500);
        assert_eq!(mock.dac(DacIndex::Vrf, 1, -1), 1700);
    }

    #[test]
    fn armed_failure_fires_once() {
        let mut mock = MockGroup::new(1);
        mock.fail_next(0x4, "settings not implemented for this detector");
        mock.threshold_energy(5000);
        assert_eq!(mock.error_mask(), 0x4);
        mock.clear_error_mask();
        mock.threshold_energy(6000);
        assert_eq!(mock.error_mask(), 0);
    }

    #[test]
    fn detached_slot_resolves_to_none() {
        let mut mock = MockGroup::new(2);
        mock.detach_module(1);
        assert_eq!(mock.module_count(), 2);
        assert!(mock.module(0).is_some());
        assert!(mock.module(1).is_none());
        assert!(mock.module(2).is_none());
    }

    #[test]
    fn free_clears_the_group() {
        let mut mock = MockGroup::new(2);
        mock.free_shared_memory();
        assert!(mock.freed);
        assert_eq!(mock.module_count(), 0);
    }
}
