// Source access for both passes: open, map, and byte-wise reading.
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use memmap2::Mmap;

use crate::core::error::{Error, ErrorKind};

const READ_CHUNK: usize = 64 * 1024;

pub(crate) fn open(path: &Path) -> Result<File, Error> {
    File::open(path).map_err(|err| {
        let hint = match err.kind() {
            io::ErrorKind::NotFound => Some("Check the file path."),
            io::ErrorKind::PermissionDenied => Some("Check read permissions on the file."),
            _ => None,
        };
        let mut out = Error::new(ErrorKind::Open)
            .with_message("failed to open source")
            .with_path(path);
        if let Some(hint) = hint {
            out = out.with_hint(hint);
        }
        out.with_source(err)
    })
}

pub(crate) struct MappedSource {
    map: Option<Mmap>,
}

impl MappedSource {
    pub(crate) fn bytes(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }
}

pub(crate) fn map(path: &Path) -> Result<MappedSource, Error> {
    let file = open(path)?;
    let len = file
        .metadata()
        .map(|meta| meta.len())
        .map_err(|err| {
            Error::new(ErrorKind::Open)
                .with_message("failed to stat source")
                .with_path(path)
                .with_source(err)
        })?;
    if len == 0 {
        // Zero-length mappings are rejected on some platforms.
        return Ok(MappedSource { map: None });
    }
    // Truncating the file while mapped is undefined; Mapped mode is opt-in.
    let map = unsafe {
        Mmap::map(&file).map_err(|err| {
            Error::new(ErrorKind::Read)
                .with_message("failed to map source")
                .with_path(path)
                .with_source(err)
        })?
    };
    Ok(MappedSource { map: Some(map) })
}

/// Feeds every byte of `reader` to `on_byte`, stopping at the first error.
pub(crate) fn for_each_byte<R, F>(reader: R, mut on_byte: F) -> Result<(), Error>
where
    R: Read,
    F: FnMut(u8) -> Result<(), Error>,
{
    let mut reader = BufReader::with_capacity(READ_CHUNK, reader);
    let mut consumed = 0u64;
    loop {
        let chunk = match reader.fill_buf() {
            Ok(chunk) => chunk,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                return Err(Error::new(ErrorKind::Read)
                    .with_message("failed to read source")
                    .with_offset(consumed)
                    .with_source(err));
            }
        };
        if chunk.is_empty() {
            return Ok(());
        }
        let len = chunk.len();
        for &byte in chunk {
            on_byte(byte)?;
        }
        reader.consume(len);
        consumed += len as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::{for_each_byte, map, open};
    use crate::core::error::ErrorKind;
    use std::io::{self, Read};

    struct FailingReader {
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::other("disk gone"));
            }
            self.served = true;
            buf[..3].copy_from_slice(b"abc");
            Ok(3)
        }
    }

    #[test]
    fn reads_every_byte_in_order() {
        let mut seen = Vec::new();
        for_each_byte(&b"hello"[..], |byte| {
            seen.push(byte);
            Ok(())
        })
        .expect("read");
        assert_eq!(seen, b"hello");
    }

    #[test]
    fn read_failure_reports_offset() {
        let mut seen = 0usize;
        let err = for_each_byte(FailingReader { served: false }, |_| {
            seen += 1;
            Ok(())
        })
        .expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::Read);
        assert_eq!(err.offset(), Some(3));
        assert_eq!(seen, 3);
    }

    #[test]
    fn open_missing_file_is_open_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.csv");
        let err = open(&path).expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::Open);
        assert_eq!(err.path(), Some(path.as_path()));
        assert!(err.hint().is_some());
    }

    #[test]
    fn empty_file_maps_to_empty_slice() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, b"").expect("write");
        let mapped = map(&path).expect("map");
        assert!(mapped.bytes().is_empty());
    }
}
