//! [`Board`] implementation for the F4 family

use core::cell::RefCell;

use volant_core::{
    AxisMap, BaroReading, Board, BoardConfig, Calibration, ClockDelay, ConfigMemory,
    DiffPressureReading, FaultRecovery, ImuDevice, ImuSample, ProbeReport, PulseRange,
    RcChannelSet, SensorKind, SensorRole,
};
use volant_drivers::{Hmc5883l, Ms4525, Ms5611, Mpu6000};
use volant_hal::{
    Clock, DataReadyLine, I2cBus, OutputPin, PwmOutput, RcInputKind, RcReceiver, SerialPort,
    SharedI2c, SharedSpi, SystemControl,
};

use crate::platform::{F4Peripherals, F4Platform};
use crate::sensors::{ExternalI2c, ImuSpi, InternalI2c, SensorBus};

/// MPU6000 axes to body axes: `[-y, -x, -z]`
pub const F4_AXES: AxisMap = AxisMap::new([[0, -1, 0], [-1, 0, 0], [0, 0, -1]]);

const _: () = assert!(F4_AXES.is_signed_permutation());

/// Only one revision exists; recovery just re-probes
pub static F4_REVISIONS: [u8; 1] = [1];

/// F4-family flight controller
pub struct F4Board<'a, P: F4Platform> {
    clock: P::Clock,
    system: P::System,
    serial: P::Serial,
    internal_i2c: &'a RefCell<P::InternalI2c>,
    drdy: P::DataReady,
    ppm: P::Ppm,
    sbus: P::Sbus,
    pwm: P::Pwm,
    led0: P::Led,
    led1: P::Led,

    config: BoardConfig,
    bus: SensorBus<'a, P>,
    imu: SensorRole<Mpu6000<ImuSpi<'a, P>>>,
    mag: SensorRole<Hmc5883l<InternalI2c<'a, P>>>,
    baro: SensorRole<Ms5611<InternalI2c<'a, P>>>,
    airspeed: SensorRole<Ms4525<ExternalI2c<'a, P>>>,
    /// Data-ready edge whose burst has not been queued yet
    imu_edge: Option<u64>,
    cal: Calibration,
    recovery: FaultRecovery,
    rc_kind: RcInputKind,
    rc_channels: RcChannelSet,
    pulse_range: PulseRange,
    memory: ConfigMemory<P::Storage>,
}

impl<'a, P: F4Platform> F4Board<'a, P> {
    pub fn new(p: F4Peripherals<'a, P>, config: BoardConfig) -> Self {
        let recovery = FaultRecovery::new(&F4_REVISIONS);
        Self {
            clock: p.clock,
            system: p.system,
            serial: p.serial,
            internal_i2c: p.internal_i2c,
            drdy: p.drdy,
            ppm: p.ppm,
            sbus: p.sbus,
            pwm: p.pwm,
            led0: p.led0,
            led1: p.led1,

            bus: SensorBus {
                internal: SharedI2c::new(p.internal_i2c),
                external: SharedI2c::new(p.external_i2c),
                spi: SharedSpi::new(p.spi),
            },
            imu: SensorRole::new(SensorKind::Imu),
            mag: SensorRole::new(SensorKind::Magnetometer),
            baro: SensorRole::new(SensorKind::Barometer),
            airspeed: SensorRole::new(SensorKind::DifferentialPressure),
            imu_edge: None,
            cal: Calibration::new(recovery.initial_revision()),
            recovery,
            rc_kind: RcInputKind::Ppm,
            rc_channels: RcChannelSet::new(&config),
            pulse_range: PulseRange::from_config(&config),
            memory: ConfigMemory::new(p.storage),
            config,
        }
    }

    pub fn calibration(&self) -> &Calibration {
        &self.cal
    }

    pub fn recovery(&self) -> &FaultRecovery {
        &self.recovery
    }

    fn poll_rc(&mut self) {
        let now = self.clock.millis();
        match self.rc_kind {
            RcInputKind::Ppm => self.rc_channels.poll(&mut self.ppm, now),
            RcInputKind::Sbus => self.rc_channels.poll(&mut self.sbus, now),
        };
    }
}

impl<P: F4Platform> Board for F4Board<'_, P> {
    fn init_board(&mut self) {
        self.system.init();
        self.cal = Calibration::new(self.recovery.initial_revision());
    }

    fn board_reset(&mut self, bootloader: bool) -> ! {
        self.system.reset(bootloader)
    }

    fn clock_millis(&self) -> u32 {
        self.clock.millis()
    }

    fn clock_micros(&self) -> u64 {
        self.clock.micros()
    }

    fn clock_delay(&mut self, ms: u32) {
        self.clock.delay_ms(ms);
    }

    fn serial_init(&mut self, baudrate: u32) {
        debug!("f4: vcp ignores baud rate {}", baudrate);
        self.serial.open(baudrate);
    }

    fn serial_write(&mut self, data: &[u8]) {
        self.serial.write(data);
    }

    fn serial_bytes_available(&self) -> u16 {
        self.serial.bytes_available()
    }

    fn serial_read(&mut self) -> Option<u8> {
        self.serial.read_byte()
    }

    fn serial_flush(&mut self) {
        self.serial.flush();
    }

    fn sensors_init(&mut self) -> ProbeReport {
        while self.clock.millis() < self.config.sensor_boot_ms {
            self.clock.delay_ms(1);
        }

        self.imu_edge = None;
        let mut report = ProbeReport::new();
        let mut delay = ClockDelay::new(&mut self.clock);

        let imu = self.imu.probe(&self.bus, &[SensorBus::mpu6000], &mut delay);
        report.record(SensorKind::Imu, imu);
        if let Some(device) = self.imu.device() {
            self.cal.adopt(device);
        }

        let mag = self.mag.probe(&self.bus, &[SensorBus::hmc5883l], &mut delay);
        report.record(SensorKind::Magnetometer, mag);

        let baro = self.baro.probe(&self.bus, &[SensorBus::ms5611], &mut delay);
        report.record(SensorKind::Barometer, baro);

        let airspeed = self.airspeed.probe(&self.bus, &[SensorBus::ms4525], &mut delay);
        report.record(SensorKind::DifferentialPressure, airspeed);

        // No rangefinder port on this family
        report.record(SensorKind::Rangefinder, None);
        report.record(SensorKind::RcInput, Some(self.rc_kind.as_str()));
        report
    }

    fn num_sensor_errors(&self) -> u16 {
        self.internal_i2c
            .try_borrow()
            .map_or(0, |bus| bus.error_count())
    }

    fn new_imu_data(&mut self) -> bool {
        if let Some(edge_us) = self.drdy.take_edge() {
            self.imu_edge = Some(edge_us);
        }
        self.imu.collect();
        if let Some(edge_us) = self.imu_edge {
            // Kept until the burst is queued, so a refused kick retries
            if self.imu.kick(edge_us) || !self.imu.is_bound() {
                self.imu_edge = None;
            }
        }
        self.imu.collect();
        self.imu.has_fresh()
    }

    fn imu_read(&mut self) -> Option<ImuSample> {
        self.imu.collect();
        let raw = self.imu.take()?;
        let temperature_c = self.imu.device()?.temperature_c(raw.value.temperature);
        let sample = ImuSample::from_raw(raw, &F4_AXES, &self.cal, temperature_c)?;
        self.recovery.on_good_sample();
        Some(sample)
    }

    fn imu_not_responding_error(&mut self) {
        if !self.recovery.begin(&mut self.cal) {
            return;
        }
        self.sensors_init();
        self.recovery.finish();
    }

    fn mag_check(&mut self) -> bool {
        self.mag.check(self.clock.micros())
    }

    fn mag_read(&mut self) -> [f32; 3] {
        self.mag.update(self.clock.micros());
        self.mag.latest().map_or([0.0; 3], |r| r.value)
    }

    fn baro_check(&mut self) -> bool {
        self.baro.check(self.clock.micros())
    }

    fn baro_read(&mut self) -> BaroReading {
        self.baro.update(self.clock.micros());
        self.baro.latest().map(|r| r.value).unwrap_or_default()
    }

    fn diff_pressure_check(&mut self) -> bool {
        self.airspeed.check(self.clock.micros())
    }

    fn diff_pressure_read(&mut self) -> DiffPressureReading {
        self.airspeed.update(self.clock.micros());
        self.airspeed.latest().map(|r| r.value).unwrap_or_default()
    }

    fn sonar_check(&mut self) -> bool {
        false
    }

    fn sonar_read(&mut self) -> f32 {
        0.0
    }

    fn rc_init(&mut self, kind: RcInputKind) {
        self.rc_kind = kind;
        match kind {
            RcInputKind::Ppm => self.ppm.start(kind),
            RcInputKind::Sbus => self.sbus.start(kind),
        }
        self.rc_channels.reset();
        info!("f4: rc input {}", kind.as_str());
    }

    fn rc_read(&mut self, channel: u8) -> f32 {
        self.poll_rc();
        self.rc_channels.normalized(channel)
    }

    fn rc_lost(&mut self) -> bool {
        self.poll_rc();
        self.rc_channels.lost(self.clock.millis())
    }

    fn pwm_init(&mut self, refresh_rate_hz: u32, idle_us: u16) {
        self.pwm.configure(refresh_rate_hz, idle_us);
    }

    fn pwm_write(&mut self, channel: u8, value: f32) {
        if channel >= self.pwm.channel_count() {
            return;
        }
        self.pwm.write_us(channel, self.pulse_range.pulse_for(value));
    }

    fn memory_init(&mut self) -> bool {
        match self.memory.init() {
            Ok(()) => true,
            Err(e) => {
                error!("f4: flash init failed: {:?}", e);
                false
            }
        }
    }

    fn memory_read(&mut self, buf: &mut [u8]) -> bool {
        self.memory.load(buf).is_ok()
    }

    fn memory_write(&mut self, data: &[u8]) -> bool {
        match self.memory.store(data) {
            Ok(()) => true,
            Err(e) => {
                warn!("f4: flash write failed: {:?}", e);
                false
            }
        }
    }

    fn led0_on(&mut self) {
        self.led0.set_high();
    }

    fn led0_off(&mut self) {
        self.led0.set_low();
    }

    fn led0_toggle(&mut self) {
        self.led0.toggle();
    }

    fn led1_on(&mut self) {
        self.led1.set_high();
    }

    fn led1_off(&mut self) {
        self.led1.set_low();
    }

    fn led1_toggle(&mut self) {
        self.led1.toggle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volant_core::STANDARD_GRAVITY;
    use volant_drivers::airspeed::ms4525;
    use volant_drivers::baro::ms5611;
    use volant_drivers::imu::{reg, WHO_AM_I_VALUE};
    use volant_drivers::mag::hmc5883l;
    use volant_hal::mock::{
        MockClock, MockDataReady, MockI2c, MockI2cDevice, MockLed, MockPwm, MockRc, MockSerial,
        MockSpi, MockStorage, MockSystem,
    };

    struct MockF4;

    impl F4Platform for MockF4 {
        type Clock = MockClock;
        type System = MockSystem;
        type Serial = MockSerial;
        type Spi = MockSpi;
        type InternalI2c = MockI2c;
        type ExternalI2c = MockI2c;
        type DataReady = MockDataReady;
        type Ppm = MockRc;
        type Sbus = MockRc;
        type Pwm = MockPwm;
        type Storage = MockStorage;
        type Led = MockLed;
    }

    const MS5611_PROM: [u8; 16] = [
        8, 0, 156, 191, 144, 60, 91, 21, 90, 242, 130, 184, 110, 152, 0, 9,
    ];

    struct Buses {
        spi: RefCell<MockSpi>,
        internal: RefCell<MockI2c>,
        external: RefCell<MockI2c>,
    }

    /// Every part fitted, airspeed sensor on the external port
    fn buses(imu: MockSpi) -> Buses {
        let mut internal = MockI2c::new();
        internal.attach(
            hmc5883l::ADDRESS,
            MockI2cDevice::new()
                .with_registers(hmc5883l::reg::ID_A, &hmc5883l::IDENTIFICATION)
                .with_registers(hmc5883l::reg::DATA, &[0, 230, 0, 0, 255, 26]),
        );
        let mut baro = MockI2cDevice::new().with_registers(ms5611::cmd::PROM_READ, &MS5611_PROM);
        baro.on_command(ms5611::cmd::CONVERT_D1, ms5611::cmd::ADC_READ, &[138, 162, 26]);
        baro.on_command(ms5611::cmd::CONVERT_D2, ms5611::cmd::ADC_READ, &[130, 193, 62]);
        internal.attach(ms5611::ADDRESS, baro);
        let mut external = MockI2c::new();
        external.attach(
            ms4525::ADDRESS,
            MockI2cDevice::new().with_registers(0, &[44, 204, 191, 224]),
        );
        Buses {
            spi: RefCell::new(imu),
            internal: RefCell::new(internal),
            external: RefCell::new(external),
        }
    }

    fn mpu6000() -> MockSpi {
        let spi = MockSpi::new();
        spi.set_registers(reg::WHO_AM_I, &[WHO_AM_I_VALUE]);
        spi
    }

    struct Rig {
        clock: MockClock,
        drdy: MockDataReady,
        ppm: MockRc,
        sbus: MockRc,
        storage: MockStorage,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                clock: MockClock::new(),
                drdy: MockDataReady::new(),
                ppm: MockRc::new(),
                sbus: MockRc::new(),
                storage: MockStorage::new(4096),
            }
        }

        fn board<'a>(&self, buses: &'a Buses) -> F4Board<'a, MockF4> {
            let mut board = F4Board::new(
                F4Peripherals {
                    clock: self.clock.clone(),
                    system: MockSystem::new(),
                    serial: MockSerial::new(64),
                    spi: &buses.spi,
                    internal_i2c: &buses.internal,
                    external_i2c: &buses.external,
                    drdy: self.drdy.clone(),
                    ppm: self.ppm.clone(),
                    sbus: self.sbus.clone(),
                    pwm: MockPwm::new(8),
                    storage: self.storage.clone(),
                    led0: MockLed::new(),
                    led1: MockLed::new(),
                },
                BoardConfig::default(),
            );
            board.init_board();
            board
        }
    }

    #[test]
    fn test_probe_binds_fixed_variants() {
        let rig = Rig::new();
        let buses = buses(mpu6000());
        let mut board = rig.board(&buses);

        let report = board.sensors_init();
        assert_eq!(report.bound(SensorKind::Imu), Some("mpu6000"));
        assert_eq!(report.bound(SensorKind::Magnetometer), Some("hmc5883l"));
        assert_eq!(report.bound(SensorKind::Barometer), Some("ms5611"));
        assert_eq!(report.bound(SensorKind::DifferentialPressure), Some("ms4525"));
        assert!(report.probed(SensorKind::Rangefinder));
        assert_eq!(report.bound(SensorKind::Rangefinder), None);
        assert_eq!(board.num_sensor_errors(), 0);
    }

    #[test]
    fn test_rangefinder_is_always_absent() {
        let rig = Rig::new();
        let buses = buses(mpu6000());
        let mut board = rig.board(&buses);
        board.sensors_init();

        assert!(!board.sonar_check());
        assert_eq!(board.sonar_read(), 0.0);
    }

    #[test]
    fn test_airspeed_reads_from_external_bus() {
        let rig = Rig::new();
        let buses = buses(mpu6000());
        let mut board = rig.board(&buses);
        board.sensors_init();

        assert!(board.diff_pressure_check());
        let reading = board.diff_pressure_read();
        assert!((reading.pressure_pa - 3447.27).abs() < 0.5);
        assert!(buses.internal.borrow().device(ms4525::ADDRESS).is_none());
    }

    #[test]
    fn test_imu_axes() {
        let rig = Rig::new();
        let buses = buses(mpu6000());
        let mut board = rig.board(&buses);
        board.sensors_init();

        // +1 g on device X
        buses
            .spi
            .borrow()
            .set_registers(reg::ACCEL_XOUT_H, &[0x10, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        rig.drdy.fire(2_500);
        assert!(board.new_imu_data());

        let sample = board.imu_read().unwrap();
        assert_eq!(sample.time_us, 2_500);
        assert!((sample.accel[1] + STANDARD_GRAVITY).abs() < 1e-4);
        assert_eq!(sample.accel[0], 0.0);
        assert_eq!(sample.accel[2], 0.0);
    }

    #[test]
    fn test_mag_and_baro_share_internal_bus() {
        let rig = Rig::new();
        let buses = buses(mpu6000());
        let mut board = rig.board(&buses);
        board.sensors_init();
        buses.internal.borrow_mut().set_auto_complete(false);

        let mut mag_readings = 0;
        let mut baro_readings = 0;
        for _ in 0..100 {
            rig.clock.advance_ms(1);
            if board.mag_read() != [0.0; 3] {
                mag_readings += 1;
            }
            assert!(board.mag_check());
            let baro = board.baro_read();
            if baro.pressure_pa != 0.0 {
                assert_eq!(baro.pressure_pa, 100_009.0);
                baro_readings += 1;
            }
            buses.internal.borrow_mut().complete();
        }

        // Every read after the first sees a completed magnetometer burst
        assert_eq!(mag_readings, 99);
        assert!(baro_readings > 0);
        assert!((board.mag_read()[0] - 230.0 / 1090.0).abs() < 1e-6);
    }

    #[test]
    fn test_edge_is_kept_while_previous_burst_is_in_flight() {
        let rig = Rig::new();
        let spi = mpu6000();
        let buses = buses(spi.clone());
        let mut board = rig.board(&buses);
        board.sensors_init();
        spi.set_registers(reg::ACCEL_XOUT_H, &[0x10, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        spi.set_auto_complete(false);

        rig.drdy.fire(1_000);
        assert!(!board.new_imu_data());
        rig.drdy.fire(2_000);
        assert!(!board.new_imu_data());
        assert!(!rig.drdy.pending());

        spi.complete();
        assert!(board.new_imu_data());
        assert_eq!(board.imu_read().map(|s| s.time_us), Some(1_000));

        spi.complete();
        assert!(board.new_imu_data());
        assert_eq!(board.imu_read().map(|s| s.time_us), Some(2_000));
    }

    #[test]
    fn test_dead_imu_reads_none_and_recovery_reprobes() {
        let rig = Rig::new();
        let buses = buses(mpu6000());
        let mut board = rig.board(&buses);
        board.sensors_init();

        buses.spi.borrow().set_responding(false);
        rig.drdy.fire(1_000);
        assert!(board.new_imu_data());
        assert_eq!(board.imu_read(), None);

        board.imu_not_responding_error();
        assert_eq!(board.calibration().revision, 1);
        assert_eq!(board.recovery().reconfigurations(), 1);
    }

    #[test]
    fn test_sbus_selects_sbus_receiver() {
        let rig = Rig::new();
        let buses = buses(mpu6000());
        let mut board = rig.board(&buses);

        board.rc_init(RcInputKind::Sbus);
        assert_eq!(rig.sbus.kind(), Some(RcInputKind::Sbus));
        assert_eq!(rig.ppm.kind(), None);

        rig.ppm.push_frame(&[2000]);
        assert!(board.rc_lost());

        rig.sbus.push_frame(&[1250]);
        assert!((board.rc_read(0) - 0.25).abs() < 1e-6);
        assert!(!board.rc_lost());
    }

    #[test]
    fn test_memory_rejects_oversized_blob() {
        let rig = Rig::new();
        let buses = buses(mpu6000());
        let mut board = rig.board(&buses);

        assert!(board.memory_init());
        assert!(!board.memory_write(&[0xAA; 4096]));
        assert!(board.memory_write(&[0xAA; 64]));

        let mut buf = [0u8; 64];
        assert!(board.memory_read(&mut buf));
        assert_eq!(buf, [0xAA; 64]);
    }
}
