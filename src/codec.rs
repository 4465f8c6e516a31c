use dicom_object::DefaultDicomObject;
use dicom_object::OpenFileOptions;
use dicom_object::file::ReadPreamble;
use std::io::Cursor;
use thiserror::Error;

/// Length of the file preamble that precedes the magic code.
pub const PREAMBLE_LENGTH: usize = 128;

/// Magic code every DICOM file carries right after its preamble.
pub const MAGIC_CODE: &[u8; 4] = b"DICM";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("{0}")]
    Read(String),

    #[error("{0}")]
    Write(String),
}

/// Returns `true` when `data` starts with a preamble followed by the DICOM magic code.
pub fn has_dicom_header(data: &[u8]) -> bool {
    data.get(PREAMBLE_LENGTH..PREAMBLE_LENGTH + MAGIC_CODE.len()) == Some(MAGIC_CODE.as_slice())
}

/// Low-level (de)serializer for the DICOM file format.
pub trait Codec {
    /// Parses a complete file, preamble included.
    fn read(&self, data: &[u8]) -> Result<DefaultDicomObject, CodecError>;

    /// Serializes a file object, preamble included.
    fn write(&self, obj: &DefaultDicomObject) -> Result<Vec<u8>, CodecError>;
}

/// [`Codec`] backed by `dicom-object`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DicomRsCodec;

impl DicomRsCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for DicomRsCodec {
    fn read(&self, data: &[u8]) -> Result<DefaultDicomObject, CodecError> {
        let body = data
            .get(PREAMBLE_LENGTH..)
            .ok_or_else(|| CodecError::Read("file is shorter than its preamble".into()))?;

        OpenFileOptions::new()
            .read_preamble(ReadPreamble::Never)
            .from_reader(Cursor::new(body.to_vec()))
            .map_err(|e| CodecError::Read(e.to_string()))
    }

    fn write(&self, obj: &DefaultDicomObject) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::new();
        obj.write_all(&mut buf)
            .map_err(|e| CodecError::Write(e.to_string()))?;
        Ok(buf)
    }
}
