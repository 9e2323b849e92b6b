//! Persisted configuration blob
//!
//! The caller's configuration is stored as an opaque byte blob behind a
//! small validated header:
//!
//! ```text
//! offset 0   header (postcard, zero-padded to 16 bytes)
//!              magic:   u32 = 0x564F_4C54 ("VOLT")
//!              version: u8  = 1
//!              len:     u32   payload length
//!              crc:     u32   CRC-32/ISO-HDLC of the payload
//! offset 16  payload (len bytes)
//! ```
//!
//! The header is programmed after the payload, so a write interrupted by a
//! power loss leaves an erased header and reads back as "no blob".

use crc::{Crc, CRC_32_ISO_HDLC};
use serde::{Deserialize, Serialize};
use volant_hal::{BlobStorage, FlashError};

/// Magic number identifying a blob
pub const BLOB_MAGIC: u32 = 0x564F_4C54;

/// Current header version
pub const BLOB_VERSION: u8 = 1;

/// Bytes reserved for the header
pub const HEADER_LEN: usize = 16;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Verification reads the payload through a stack buffer of this size
const CHUNK: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct BlobHeader {
    magic: u32,
    version: u8,
    len: u32,
    crc: u32,
}

/// Errors from persisted-blob access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MemoryError {
    /// Underlying storage failed
    Storage(FlashError),
    /// `init` has not succeeded
    NotReady,
    /// Blob plus header does not fit the region
    TooLarge,
    /// Header missing or unreadable (erased region)
    NoBlob,
    /// Blob was written by an incompatible layout
    VersionMismatch,
    /// Stored length differs from the requested length
    LengthMismatch,
    /// Payload failed its CRC
    Checksum,
    /// Header could not be encoded
    Encoding,
}

impl From<FlashError> for MemoryError {
    fn from(e: FlashError) -> Self {
        MemoryError::Storage(e)
    }
}

/// Validated blob store over a raw region
pub struct ConfigMemory<S> {
    storage: S,
    ready: bool,
}

impl<S: BlobStorage> ConfigMemory<S> {
    /// Wrap a storage region; call [`init`](Self::init) before use
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            ready: false,
        }
    }

    /// Bring up the storage device
    pub fn init(&mut self) -> Result<(), MemoryError> {
        self.ready = false;
        self.storage.prepare()?;
        self.ready = true;
        Ok(())
    }

    /// Whether `init` succeeded
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Largest payload the region can hold
    pub fn max_payload(&self) -> usize {
        self.storage.capacity().saturating_sub(HEADER_LEN)
    }

    /// Read the stored blob into `buf`
    ///
    /// The stored length must equal `buf.len()`. `buf` is only written once
    /// the payload has passed its CRC.
    pub fn load(&mut self, buf: &mut [u8]) -> Result<(), MemoryError> {
        if !self.ready {
            return Err(MemoryError::NotReady);
        }

        let mut raw = [0u8; HEADER_LEN];
        self.storage.read(0, &mut raw)?;
        let header = match postcard::take_from_bytes::<BlobHeader>(&raw) {
            Ok((header, _)) if header.magic == BLOB_MAGIC => header,
            _ => {
                debug!("memory: no blob");
                return Err(MemoryError::NoBlob);
            }
        };
        if header.version != BLOB_VERSION {
            warn!("memory: blob version {}, want {}", header.version, BLOB_VERSION);
            return Err(MemoryError::VersionMismatch);
        }
        if usize::try_from(header.len).ok() != Some(buf.len()) || buf.len() > self.max_payload() {
            warn!("memory: blob holds {} bytes, asked for {}", header.len, buf.len());
            return Err(MemoryError::LengthMismatch);
        }

        let mut digest = CRC32.digest();
        let mut chunk = [0u8; CHUNK];
        let mut offset = 0;
        while offset < buf.len() {
            let n = CHUNK.min(buf.len() - offset);
            self.storage.read(HEADER_LEN + offset, &mut chunk[..n])?;
            digest.update(&chunk[..n]);
            offset += n;
        }
        if digest.finalize() != header.crc {
            error!("memory: blob checksum mismatch");
            return Err(MemoryError::Checksum);
        }

        self.storage.read(HEADER_LEN, buf)?;
        Ok(())
    }

    /// Replace the stored blob with `data`
    pub fn store(&mut self, data: &[u8]) -> Result<(), MemoryError> {
        if !self.ready {
            return Err(MemoryError::NotReady);
        }
        if data.len() > self.max_payload() {
            return Err(MemoryError::TooLarge);
        }
        let len = u32::try_from(data.len()).map_err(|_| MemoryError::TooLarge)?;

        let header = BlobHeader {
            magic: BLOB_MAGIC,
            version: BLOB_VERSION,
            len,
            crc: CRC32.checksum(data),
        };
        let mut raw = [0u8; HEADER_LEN];
        postcard::to_slice(&header, &mut raw).map_err(|_| MemoryError::Encoding)?;

        self.storage.erase()?;
        self.storage.write(HEADER_LEN, data)?;
        self.storage.write(0, &raw)?;
        debug!("memory: stored {} bytes", data.len());
        Ok(())
    }

    /// The underlying region
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The underlying region, mutably
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volant_hal::mock::MockStorage;

    fn ready(capacity: usize) -> (ConfigMemory<MockStorage>, MockStorage) {
        let storage = MockStorage::new(capacity);
        let mut memory = ConfigMemory::new(storage.clone());
        memory.init().unwrap();
        (memory, storage)
    }

    #[test]
    fn test_header_fits_reserved_space() {
        let header = BlobHeader {
            magic: BLOB_MAGIC,
            version: BLOB_VERSION,
            len: u32::MAX,
            crc: u32::MAX,
        };
        let mut raw = [0u8; HEADER_LEN];
        assert!(postcard::to_slice(&header, &mut raw).is_ok());
    }

    #[test]
    fn test_store_then_load() {
        let (mut memory, _) = ready(256);
        let blob: Vec<u8> = (0..100u8).collect();
        memory.store(&blob).unwrap();

        let mut out = vec![0u8; 100];
        memory.load(&mut out).unwrap();
        assert_eq!(out, blob);
    }

    #[test]
    fn test_erased_region_has_no_blob() {
        let (mut memory, _) = ready(64);
        let mut out = [0u8; 8];
        assert_eq!(memory.load(&mut out), Err(MemoryError::NoBlob));
    }

    #[test]
    fn test_length_must_match() {
        let (mut memory, _) = ready(64);
        memory.store(&[1, 2, 3, 4]).unwrap();

        let mut out = [0u8; 5];
        assert_eq!(memory.load(&mut out), Err(MemoryError::LengthMismatch));
    }

    #[test]
    fn test_corrupt_payload_fails_and_leaves_buffer() {
        let (mut memory, storage) = ready(64);
        memory.store(&[1, 2, 3, 4]).unwrap();
        storage.corrupt(HEADER_LEN + 2);

        let mut out = [0xAA; 4];
        assert_eq!(memory.load(&mut out), Err(MemoryError::Checksum));
        assert_eq!(out, [0xAA; 4]);
    }

    #[test]
    fn test_too_large() {
        let (mut memory, _) = ready(32);
        assert_eq!(memory.store(&[0; 17]), Err(MemoryError::TooLarge));
        assert!(memory.store(&[0; 16]).is_ok());
    }

    #[test]
    fn test_requires_init() {
        let mut memory = ConfigMemory::new(MockStorage::new(64));
        assert_eq!(memory.store(&[1]), Err(MemoryError::NotReady));
        assert_eq!(memory.load(&mut [0]), Err(MemoryError::NotReady));
    }

    #[test]
    fn test_failed_write_reads_back_as_missing() {
        let (mut memory, storage) = ready(64);
        memory.store(&[9; 8]).unwrap();
        storage.set_fail_writes(true);

        assert!(memory.store(&[7; 8]).is_err());
        storage.set_fail_writes(false);
        let mut out = [0u8; 8];
        assert_eq!(memory.load(&mut out), Err(MemoryError::NoBlob));
    }
}
