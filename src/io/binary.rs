//! Raw binary files of 8-byte floats, without header
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Error, ErrorKind, Result};
use std::path::Path;

/// Byte order of the floats in a file
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    /// Little endian (default)
    #[default]
    Little,
    /// Big endian
    Big,
}

impl ByteOrder {
    fn decode(self, bytes: [u8; 8]) -> f64 {
        match self {
            Self::Little => f64::from_le_bytes(bytes),
            Self::Big => f64::from_be_bytes(bytes),
        }
    }

    fn encode(self, value: f64) -> [u8; 8] {
        match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        }
    }
}

/// Read all floats of a file
///
/// # Errors
/// File can't be read, or its size is not a multiple of 8 bytes.
pub fn read_f64_file<P: AsRef<Path>>(filename: P, order: ByteOrder) -> Result<Vec<f64>> {
    let raw = fs::read(filename.as_ref())?;
    if raw.len() % 8 != 0 {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!(
                "size of {:?} ({} bytes) is not a multiple of 8",
                filename.as_ref(),
                raw.len()
            ),
        ));
    }
    let mut data = Vec::with_capacity(raw.len() / 8);
    for chunk in raw.chunks_exact(8) {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(chunk);
        data.push(order.decode(bytes));
    }
    Ok(data)
}

/// Write floats to a file, overwriting it
///
/// # Errors
/// File can't be written.
pub fn write_f64_file<P, I>(filename: P, data: I, order: ByteOrder) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = f64>,
{
    let raw: Vec<u8> = data.into_iter().flat_map(|v| order.encode(v)).collect();
    fs::write(filename, raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_order() {
        let value = 0.1f64;
        assert_eq!(ByteOrder::Little.encode(value), value.to_le_bytes());
        assert_eq!(ByteOrder::Big.decode(value.to_be_bytes()), value);
    }

    #[test]
    fn test_rejects_truncated_file() {
        let dir = std::env::temp_dir().join(format!("taylorgreen-binary-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("truncated");
        fs::write(&path, [0u8; 12]).unwrap();
        let err = read_f64_file(&path, ByteOrder::Little).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        fs::remove_dir_all(&dir).unwrap();
    }
}
