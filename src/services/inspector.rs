//! Image inspection: pixel dimensions of a rendered variant.

use crate::models::variant_file::VariantFile;
use imagesize::ImageError;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use thiserror::Error;

/// Pixel dimensions reported by an inspector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u64,
    pub height: u64,
}

#[derive(Debug, Error)]
pub enum InspectError {
    /// The file is not image data. Expected for documents and archives.
    #[error("file is not a recognized image format")]
    NotAnImage,
    #[error("image data is corrupt: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Service reporting the pixel dimensions of a file.
pub trait ImageInspector {
    fn inspect(&self, file: &dyn VariantFile) -> Result<Dimensions, InspectError>;
}

/// Bytes read to identify the format before the header is parsed.
const SNIFF_LEN: u64 = 256;

/// Inspector that reads image headers with the `imagesize` crate.
///
/// The format is identified from the first bytes of the variant; anything
/// unrecognized, however short, is not an image. Only a recognized image
/// whose header cannot be parsed is an error. The payload is never read
/// past its header.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImagesizeInspector;

impl ImageInspector for ImagesizeInspector {
    fn inspect(&self, file: &dyn VariantFile) -> Result<Dimensions, InspectError> {
        let mut reader = BufReader::new(file.open()?);

        let mut header = Vec::with_capacity(SNIFF_LEN as usize);
        reader.by_ref().take(SNIFF_LEN).read_to_end(&mut header)?;
        if imagesize::image_type(&header).is_err() {
            return Err(InspectError::NotAnImage);
        }

        reader.seek(SeekFrom::Start(0))?;
        match imagesize::reader_size(reader) {
            Ok(size) => Ok(Dimensions {
                width: size.width as u64,
                height: size.height as u64,
            }),
            Err(ImageError::NotSupported) => Err(InspectError::Corrupt(
                "recognized format has no readable dimensions".into(),
            )),
            Err(ImageError::CorruptedImage) => {
                Err(InspectError::Corrupt("header could not be parsed".into()))
            }
            Err(ImageError::IoError(err)) => Err(InspectError::Io(err)),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::variant_file::{DiskFile, MemoryFile};

    /// Minimal PNG: signature plus an IHDR chunk carrying the dimensions.
    pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
        let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        data.extend_from_slice(&13u32.to_be_bytes());
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[8, 6, 0, 0, 0]);
        data.extend_from_slice(&[0, 0, 0, 0]);
        data
    }

    #[test]
    fn reads_png_dimensions() {
        let file = MemoryFile::new(png(320, 200));
        let dims = ImagesizeInspector.inspect(&file).unwrap();
        assert_eq!(
            dims,
            Dimensions {
                width: 320,
                height: 200
            }
        );
    }

    #[test]
    fn pdf_is_not_an_image() {
        let file = MemoryFile::new(&b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n1 0 obj\n<< /Type /Catalog >>\nendobj\n"[..]);
        assert!(matches!(
            ImagesizeInspector.inspect(&file),
            Err(InspectError::NotAnImage)
        ));
    }

    #[test]
    fn short_unrecognized_payloads_are_not_images() {
        for data in [&b""[..], &b"\0"[..], &b"hello world"[..], &br#"{"json":1}"#[..]] {
            assert!(
                matches!(
                    ImagesizeInspector.inspect(&MemoryFile::new(data)),
                    Err(InspectError::NotAnImage)
                ),
                "{data:?} should not be an image"
            );
        }
    }

    #[test]
    fn reads_dimensions_of_large_disk_variant() {
        let mut data = png(4000, 3000);
        data.resize(4 * 1024 * 1024, 0);
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut tmp, &data).unwrap();

        let dims = ImagesizeInspector.inspect(&DiskFile::new(tmp.path())).unwrap();
        assert_eq!(
            dims,
            Dimensions {
                width: 4000,
                height: 3000
            }
        );
    }

    #[test]
    fn truncated_png_is_an_error() {
        let mut data = png(10, 10);
        data.truncate(18);
        let err = ImagesizeInspector
            .inspect(&MemoryFile::new(data))
            .unwrap_err();
        assert!(!matches!(err, InspectError::NotAnImage), "got {err:?}");
    }
}
