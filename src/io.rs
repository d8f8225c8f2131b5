use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::error::{ConvertError, ConvertResult};

const READ_BUFFER_BYTES: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Plain,
    Gzip,
    Zstd,
}

fn sniff_magic(file: &mut File) -> io::Result<Compression> {
    let mut magic = [0u8; 4];
    let mut n = 0;
    while n < magic.len() {
        let read = file.read(&mut magic[n..])?;
        if read == 0 {
            break;
        }
        n += read;
    }
    if n >= 2 && magic[..2] == [0x1F, 0x8B] {
        return Ok(Compression::Gzip);
    }
    if n == 4 && magic == [0x28, 0xB5, 0x2F, 0xFD] {
        return Ok(Compression::Zstd);
    }
    Ok(Compression::Plain)
}

/// Detects compression by magic bytes, falling back to the extension.
pub fn detect_compression(path: &Path) -> io::Result<Compression> {
    let mut file = File::open(path)?;
    let kind = match sniff_magic(&mut file)? {
        Compression::Plain => match path.extension().and_then(|e| e.to_str()) {
            Some("gz") => Compression::Gzip,
            Some("zst") => Compression::Zstd,
            _ => Compression::Plain,
        },
        other => other,
    };
    Ok(kind)
}

/// Opens `path` as a decompressed byte stream.
///
/// Decoding happens lazily while the stream is read; dropping the reader
/// releases the file and the decoder buffers.
pub fn open_input(path: &Path) -> ConvertResult<Box<dyn Read>> {
    let open_err = |source: io::Error| ConvertError::Open {
        path: path.to_path_buf(),
        source,
    };

    let kind = detect_compression(path).map_err(open_err)?;
    let file = File::open(path).map_err(open_err)?;
    log::debug!("opening {} as {:?}", path.display(), kind);

    let reader: Box<dyn Read> = match kind {
        Compression::Plain => Box::new(file),
        Compression::Gzip => Box::new(flate2::read::MultiGzDecoder::new(file)),
        Compression::Zstd => Box::new(zstd::Decoder::new(file).map_err(open_err)?),
    };
    Ok(Box::new(BufReader::with_capacity(READ_BUFFER_BYTES, reader)))
}
