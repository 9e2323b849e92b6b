//! Mock I2C bus with register-mapped devices

use std::collections::BTreeMap;
use std::vec::Vec;

use crate::i2c::{BusError, I2cBus, JobQueue, MAX_QUEUED_READ};

/// Simulated I2C slave
///
/// Writes set the register pointer from their first byte and store any
/// following bytes from that register on. Reads return bytes from the pointer on.
/// Command responses let a write of a single command byte load fresh
/// result bytes into the register file, the way conversion-based sensors
/// behave.
#[derive(Debug, Clone)]
pub struct MockI2cDevice {
    registers: [u8; 256],
    pointer: u8,
    responding: bool,
    commands: BTreeMap<u8, (u8, Vec<u8>)>,
    writes: Vec<Vec<u8>>,
}

impl Default for MockI2cDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MockI2cDevice {
    /// Create a responding device with all registers zero
    pub fn new() -> Self {
        Self {
            registers: [0; 256],
            pointer: 0,
            responding: true,
            commands: BTreeMap::new(),
            writes: Vec::new(),
        }
    }

    /// Preload registers starting at `start`
    pub fn with_registers(mut self, start: u8, bytes: &[u8]) -> Self {
        self.set_registers(start, bytes);
        self
    }

    /// Overwrite registers starting at `start`
    pub fn set_registers(&mut self, start: u8, bytes: &[u8]) {
        for (i, b) in bytes.iter().enumerate() {
            self.registers[(start as usize + i) & 0xFF] = *b;
        }
    }

    /// Read back a register
    pub fn register(&self, reg: u8) -> u8 {
        self.registers[reg as usize]
    }

    /// When `command` is written, copy `bytes` into registers at `target`
    pub fn on_command(&mut self, command: u8, target: u8, bytes: &[u8]) {
        self.commands.insert(command, (target, bytes.to_vec()));
    }

    /// Make the device stop (or resume) acknowledging
    pub fn set_responding(&mut self, responding: bool) {
        self.responding = responding;
    }

    /// All writes received, in order
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    fn write(&mut self, data: &[u8]) {
        self.writes.push(data.to_vec());
        let Some((&reg, payload)) = data.split_first() else {
            return;
        };
        self.pointer = reg;
        if let Some((target, bytes)) = self.commands.get(&reg).cloned() {
            self.set_registers(target, &bytes);
        }
        self.set_registers(reg, payload);
    }

    fn read(&mut self, buf: &mut [u8]) {
        for (i, b) in buf.iter_mut().enumerate() {
            *b = self.registers[(self.pointer as usize + i) & 0xFF];
        }
    }
}

/// Mock I2C bus
///
/// Queued transactions go through a [`JobQueue`] and complete as soon as
/// they start unless the test turns off auto-completion. Then they wait
/// until [`complete`](MockI2c::complete) runs the queue, which is when the
/// devices see them.
#[derive(Debug, Clone)]
pub struct MockI2c {
    devices: BTreeMap<u8, MockI2cDevice>,
    jobs: JobQueue,
    auto_complete: bool,
    errors: u16,
}

impl Default for MockI2c {
    fn default() -> Self {
        Self::new()
    }
}

impl MockI2c {
    /// Create an empty bus
    pub fn new() -> Self {
        Self {
            devices: BTreeMap::new(),
            jobs: JobQueue::new(),
            auto_complete: true,
            errors: 0,
        }
    }

    /// Attach a device at `address`
    pub fn attach(&mut self, address: u8, device: MockI2cDevice) {
        self.devices.insert(address, device);
    }

    /// Remove the device at `address`
    pub fn detach(&mut self, address: u8) {
        self.devices.remove(&address);
    }

    /// Access an attached device
    pub fn device(&self, address: u8) -> Option<&MockI2cDevice> {
        self.devices.get(&address)
    }

    /// Mutable access to an attached device
    pub fn device_mut(&mut self, address: u8) -> Option<&mut MockI2cDevice> {
        self.devices.get_mut(&address)
    }

    /// Choose whether queued transactions complete as soon as they start
    pub fn set_auto_complete(&mut self, auto_complete: bool) {
        self.auto_complete = auto_complete;
    }

    /// Run every queued transaction in order, as the transfer-complete
    /// interrupts would
    pub fn complete(&mut self) {
        while let Some(request) = self.jobs.next().cloned() {
            let mut buf = [0u8; MAX_QUEUED_READ];
            let read = &mut buf[..request.read_len];
            match self.write_read(request.address, &request.write, read) {
                Ok(()) => self.jobs.finish(Ok(&*read)),
                Err(e) => self.jobs.finish(Err(e)),
            }
        }
    }

    fn target(&mut self, address: u8) -> Result<&mut MockI2cDevice, BusError> {
        match self.devices.get_mut(&address) {
            Some(dev) if dev.responding => Ok(dev),
            _ => {
                self.errors = self.errors.saturating_add(1);
                Err(BusError::Nack)
            }
        }
    }
}

impl I2cBus for MockI2c {
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), BusError> {
        self.target(address)?.write(data);
        Ok(())
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.target(address)?.read(buf);
        Ok(())
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), BusError> {
        let dev = self.target(address)?;
        dev.write(write_data);
        dev.read(read_buf);
        Ok(())
    }

    fn start_write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_len: usize,
    ) -> Result<(), BusError> {
        self.jobs.push(address, write_data, read_len)?;
        if self.auto_complete {
            self.complete();
        }
        Ok(())
    }

    fn is_busy(&self) -> bool {
        self.jobs.in_flight()
    }

    fn poll_read(&mut self, address: u8, buf: &mut [u8]) -> nb::Result<(), BusError> {
        self.jobs.take(address, buf)
    }

    fn error_count(&self) -> u16 {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_write_then_read() {
        let mut bus = MockI2c::new();
        bus.attach(0x50, MockI2cDevice::new());

        bus.write(0x50, &[0x10, 0xAA, 0xBB]).unwrap();
        let mut buf = [0u8; 2];
        bus.write_read(0x50, &[0x10], &mut buf).unwrap();
        assert_eq!(buf, [0xAA, 0xBB]);
        assert_eq!(bus.device(0x50).unwrap().register(0x11), 0xBB);
    }

    #[test]
    fn test_missing_device_nacks_and_counts() {
        let mut bus = MockI2c::new();
        assert_eq!(bus.write(0x42, &[0x00]), Err(BusError::Nack));
        assert_eq!(bus.error_count(), 1);
    }

    #[test]
    fn test_queued_read_stays_in_flight_until_completed() {
        let mut bus = MockI2c::new();
        bus.attach(0x1E, MockI2cDevice::new().with_registers(0x03, &[1, 2]));
        bus.set_auto_complete(false);

        bus.start_write_read(0x1E, &[0x03], 2).unwrap();
        assert!(bus.is_busy());
        assert_eq!(bus.start_write_read(0x1E, &[0x03], 2), Err(BusError::Busy));

        let mut buf = [0u8; 2];
        assert_eq!(bus.poll_read(0x1E, &mut buf), Err(nb::Error::WouldBlock));

        bus.complete();
        bus.poll_read(0x1E, &mut buf).unwrap();
        assert_eq!(buf, [1, 2]);
        assert_eq!(
            bus.poll_read(0x1E, &mut buf),
            Err(nb::Error::Other(BusError::NoTransaction))
        );
    }

    #[test]
    fn test_interleaved_devices_keep_their_results() {
        let mut bus = MockI2c::new();
        bus.attach(0x68, MockI2cDevice::new().with_registers(0x3B, &[7, 8]));
        bus.attach(0x76, MockI2cDevice::new().with_registers(0xF7, &[1, 2, 3]));
        bus.set_auto_complete(false);

        bus.start_write_read(0x76, &[0xF7], 3).unwrap();
        bus.start_write_read(0x68, &[0x3B], 2).unwrap();
        bus.complete();
        assert!(!bus.is_busy());

        // The later transaction does not displace the earlier result
        let mut imu = [0u8; 2];
        bus.poll_read(0x68, &mut imu).unwrap();
        bus.start_write_read(0x68, &[0x3B], 2).unwrap();
        let mut baro = [0u8; 3];
        bus.poll_read(0x76, &mut baro).unwrap();
        assert_eq!(imu, [7, 8]);
        assert_eq!(baro, [1, 2, 3]);
    }

    #[test]
    fn test_device_sees_write_only_when_completed() {
        let mut bus = MockI2c::new();
        bus.attach(0x77, MockI2cDevice::new());
        bus.set_auto_complete(false);

        bus.start_write_read(0x77, &[0x48], 0).unwrap();
        assert!(bus.device(0x77).unwrap().writes().is_empty());
        bus.complete();
        assert_eq!(bus.device(0x77).unwrap().writes(), &[vec![0x48]]);
    }

    #[test]
    fn test_poll_for_other_address_sees_no_transaction() {
        let mut bus = MockI2c::new();
        bus.attach(0x76, MockI2cDevice::new());
        bus.start_write_read(0x76, &[0xF7], 6).unwrap();

        let mut buf = [0u8; 6];
        assert_eq!(
            bus.poll_read(0x77, &mut buf),
            Err(nb::Error::Other(BusError::NoTransaction))
        );
    }

    #[test]
    fn test_command_loads_response() {
        let mut dev = MockI2cDevice::new();
        dev.on_command(0x48, 0x00, &[0x12, 0x34, 0x56]);
        let mut bus = MockI2c::new();
        bus.attach(0x77, dev);

        bus.write(0x77, &[0x48]).unwrap();
        let mut buf = [0u8; 3];
        bus.write_read(0x77, &[0x00], &mut buf).unwrap();
        assert_eq!(buf, [0x12, 0x34, 0x56]);
    }
}
