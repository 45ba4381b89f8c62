use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::Crc;

const CHUNK_SIZE: usize = 1024;

/// CRC-32 (zlib polynomial, seed 0) over everything `reader` yields, fed in
/// fixed-size chunks.
pub fn checksum<R: Read>(mut reader: R) -> std::io::Result<u32> {
    let mut crc = Crc::new();
    let mut chunk = [0u8; CHUNK_SIZE];

    loop {
        let read = reader.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        crc.update(&chunk[..read]);
    }

    Ok(crc.sum())
}

pub fn checksum_file(path: &Path) -> std::io::Result<u32> {
    checksum(BufReader::new(File::open(path)?))
}
