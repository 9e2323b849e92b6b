//! [`Board`] implementation for the F1 family

use core::cell::RefCell;

use volant_core::registry::SensorRole;
use volant_core::{
    AxisMap, BaroReading, Board, BoardConfig, Calibration, ClockDelay, ConfigMemory,
    DiffPressureReading, FaultRecovery, ImuDevice, ImuSample, ProbeReport, PulseRange,
    RcChannelSet, SensorKind,
};
use volant_drivers::{Hmc5883l, Ms4525, Mpu6050};
use volant_hal::{
    Clock, DataReadyLine, I2cBus, OutputPin, PwmOutput, RcInputKind, RcReceiver, SerialPort,
    SharedI2c, SystemControl,
};

use crate::platform::{F1Peripherals, F1Platform};
use crate::sensors::{F1Baro, F1Sonar, I2c, SensorBus};

/// MPU6050 axes to body axes: `[x, -y, -z]`
pub const F1_AXES: AxisMap = AxisMap::new([[1, 0, 0], [0, -1, 0], [0, 0, -1]]);

const _: () = assert!(F1_AXES.is_signed_permutation());

/// Board revisions tried on IMU faults; boot assumes the first
pub static F1_REVISIONS: [u8; 2] = [2, 5];

/// Highest revision with the IMU data-ready on PB13
const LAST_PB13_REVISION: u8 = 4;

/// F1-family flight controller
pub struct F1Board<'a, P: F1Platform> {
    clock: P::Clock,
    system: P::System,
    serial: P::Serial,
    i2c: &'a RefCell<P::I2c>,
    drdy_pb13: P::DataReady,
    drdy_pc13: P::DataReady,
    rc: P::Rc,
    pwm: P::Pwm,
    led0: P::Led,
    led1: P::Led,

    config: BoardConfig,
    bus: SensorBus<'a, P>,
    imu: SensorRole<Mpu6050<I2c<'a, P>>>,
    mag: SensorRole<Hmc5883l<I2c<'a, P>>>,
    baro: SensorRole<F1Baro<'a, P>>,
    airspeed: SensorRole<Ms4525<I2c<'a, P>>>,
    sonar: SensorRole<F1Sonar<'a, P>>,
    /// Data-ready edge whose burst has not been queued yet
    imu_edge: Option<u64>,
    cal: Calibration,
    recovery: FaultRecovery,
    rc_kind: RcInputKind,
    rc_channels: RcChannelSet,
    pulse_range: PulseRange,
    memory: ConfigMemory<P::Storage>,
}

impl<'a, P: F1Platform> F1Board<'a, P> {
    pub fn new(p: F1Peripherals<'a, P>, config: BoardConfig) -> Self {
        let recovery = FaultRecovery::new(&F1_REVISIONS);
        Self {
            clock: p.clock,
            system: p.system,
            serial: p.serial,
            i2c: p.i2c,
            drdy_pb13: p.drdy_pb13,
            drdy_pc13: p.drdy_pc13,
            rc: p.rc,
            pwm: p.pwm,
            led0: p.led0,
            led1: p.led1,

            bus: SensorBus {
                i2c: SharedI2c::new(p.i2c),
                capture: p.sonar_capture,
            },
            imu: SensorRole::new(SensorKind::Imu),
            mag: SensorRole::new(SensorKind::Magnetometer),
            baro: SensorRole::new(SensorKind::Barometer),
            airspeed: SensorRole::new(SensorKind::DifferentialPressure),
            sonar: SensorRole::new(SensorKind::Rangefinder),
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

    /// Board revision and IMU scales currently assumed
    pub fn calibration(&self) -> &Calibration {
        &self.cal
    }

    /// IMU fault-recovery state
    pub fn recovery(&self) -> &FaultRecovery {
        &self.recovery
    }

    fn data_ready(&mut self) -> &mut P::DataReady {
        if self.cal.revision <= LAST_PB13_REVISION {
            &mut self.drdy_pb13
        } else {
            &mut self.drdy_pc13
        }
    }

    fn poll_rc(&mut self) {
        let now = self.clock.millis();
        self.rc_channels.poll(&mut self.rc, now);
    }
}

impl<P: F1Platform> Board for F1Board<'_, P> {
    fn init_board(&mut self) {
        self.system.init();
        self.cal = Calibration::new(self.recovery.initial_revision());
        info!("f1: board revision {}", self.cal.revision);
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
        // Sensors need time to power up before they answer
        while self.clock.millis() < self.config.sensor_boot_ms {
            self.clock.delay_ms(1);
        }

        self.imu_edge = None;
        let mut report = ProbeReport::new();
        let mut delay = ClockDelay::new(&mut self.clock);

        let imu = self.imu.probe(&self.bus, &[SensorBus::mpu6050], &mut delay);
        report.record(SensorKind::Imu, imu);
        if let Some(device) = self.imu.device() {
            self.cal.adopt(device);
        }

        let mag = self.mag.probe(&self.bus, &[SensorBus::hmc5883l], &mut delay);
        report.record(SensorKind::Magnetometer, mag);

        let baro = self
            .baro
            .probe(&self.bus, &[F1Baro::bmp280, F1Baro::ms5611], &mut delay);
        report.record(SensorKind::Barometer, baro);

        let airspeed = self.airspeed.probe(&self.bus, &[SensorBus::ms4525], &mut delay);
        report.record(SensorKind::DifferentialPressure, airspeed);

        let sonar = self
            .sonar
            .probe(&self.bus, &[F1Sonar::mb1242, F1Sonar::pwm], &mut delay);
        report.record(SensorKind::Rangefinder, sonar);

        report.record(SensorKind::RcInput, Some(self.rc_kind.as_str()));
        report
    }

    fn num_sensor_errors(&self) -> u16 {
        self.i2c.try_borrow().map_or(0, |bus| bus.error_count())
    }

    fn new_imu_data(&mut self) -> bool {
        if let Some(edge_us) = self.data_ready().take_edge() {
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
        let sample = ImuSample::from_raw(raw, &F1_AXES, &self.cal, temperature_c)?;
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
        self.sonar.check(self.clock.micros())
    }

    fn sonar_read(&mut self) -> f32 {
        self.sonar.update(self.clock.micros());
        self.sonar.latest().map_or(0.0, |r| r.value)
    }

    fn rc_init(&mut self, kind: RcInputKind) {
        if kind == RcInputKind::Sbus {
            warn!("f1: sbus not supported, using ppm");
        }
        self.rc_kind = RcInputKind::Ppm;
        self.rc.start(self.rc_kind);
        self.rc_channels.reset();
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
                error!("f1: memory init failed: {:?}", e);
                false
            }
        }
    }

    fn memory_read(&mut self, buf: &mut [u8]) -> bool {
        match self.memory.load(buf) {
            Ok(()) => true,
            Err(e) => {
                debug!("f1: memory read failed: {:?}", e);
                false
            }
        }
    }

    fn memory_write(&mut self, data: &[u8]) -> bool {
        match self.memory.store(data) {
            Ok(()) => true,
            Err(e) => {
                warn!("f1: memory write failed: {:?}", e);
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
