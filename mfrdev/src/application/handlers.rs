use std::io::{Read, Write};
use std::path::PathBuf;

use mfr_core::domain::{position_row, stat_report};
use mfr_core::error::{MfrError, Result};
use mfr_core::util::hex::parse_hex_array;
use mfr_core::{DirStore, MultiFileReader, ReaderOptions, Status, Whence};
use mfr_core::{collect_entries, digest_reader};
use tracing::info;

fn reader_from_args(
    root: PathBuf,
    entries: Vec<String>,
    sequential_stat: bool,
) -> Result<MultiFileReader<DirStore>> {
    let entries = if entries.is_empty() {
        let found = collect_entries(&root)?;
        info!(root = %root.display(), entries = found.len(), "walked root for entries");
        found
    } else {
        entries
    };
    let opts = ReaderOptions {
        parallel_stat: !sequential_stat,
        ..Default::default()
    };
    MultiFileReader::with_options(DirStore::new(root), entries, &opts)
}

fn to_json<T: serde::Serialize>(v: &T) -> Result<String> {
    serde_json::to_string_pretty(v)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e).into())
}

pub fn handle_cat(
    root: PathBuf,
    entries: Vec<String>,
    offset: u64,
    len: Option<u64>,
    buf_size: usize,
    sequential_stat: bool,
) -> Result<()> {
    let mut reader = reader_from_args(root, entries, sequential_stat)?;
    let mut out = std::io::stdout().lock();
    cat_to(&mut reader, &mut out, offset, len, buf_size)?;
    out.flush()?;
    reader.close()
}

fn cat_to<W: Write>(
    reader: &mut MultiFileReader<DirStore>,
    out: &mut W,
    offset: u64,
    len: Option<u64>,
    buf_size: usize,
) -> Result<u64> {
    if buf_size == 0 {
        return Err(MfrError::invalid("--buf-size must be positive"));
    }
    let start = i64::try_from(offset)
        .map_err(|_| MfrError::invalid(format!("offset {offset} out of range")))?;
    if let (_, Status::EndOfStream) = reader.seek_raw(start, Whence::Start)? {
        return Ok(0);
    }

    let mut src: Box<dyn Read + '_> = match len {
        Some(l) => Box::new(reader.take(l)),
        None => Box::new(reader),
    };
    let mut buf = vec![0u8; buf_size];
    let mut written = 0u64;
    loop {
        let n = src.read(&mut buf)?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
        written += n as u64;
    }
    Ok(written)
}

pub fn handle_sum(
    root: PathBuf,
    entries: Vec<String>,
    expect: Option<String>,
    sequential_stat: bool,
) -> Result<()> {
    let expected = expect.map(|h| parse_hex_array::<32>(&h)).transpose()?;
    let mut reader = reader_from_args(root, entries, sequential_stat)?;
    let (digest, n) = digest_reader(&mut reader)?;
    reader.close()?;
    println!("{}  {} bytes", digest.to_hex(), n);

    if let Some(want) = expected {
        if digest.as_bytes() != &want {
            return Err(
                std::io::Error::new(std::io::ErrorKind::Other, "checksum mismatch").into(),
            );
        }
        eprintln!("sum: OK");
    }
    Ok(())
}

pub fn handle_stat(
    root: PathBuf,
    entries: Vec<String>,
    json: bool,
    sequential_stat: bool,
) -> Result<()> {
    let reader = reader_from_args(root, entries, sequential_stat)?;
    let report = stat_report(reader.entries(), reader.layout());
    if json {
        println!("{}", to_json(&report)?);
        return Ok(());
    }
    for r in &report.entries {
        println!(
            "#{:<5} start={:<12} size={:<12} {}",
            r.index, r.start, r.size, r.path
        );
    }
    println!("total={}", report.total_size);
    Ok(())
}

pub fn handle_locate(root: PathBuf, offset: u64, entries: Vec<String>, json: bool) -> Result<()> {
    let reader = reader_from_args(root, entries, false)?;
    let row = position_row(reader.entries(), reader.layout(), offset);
    match (row, json) {
        (Some(p), true) => println!("{}", to_json(&p)?),
        (Some(p), false) => println!(
            "offset={} entry=#{} {} file_offset={}",
            p.offset, p.index, p.path, p.file_offset
        ),
        (None, _) => {
            return Err(MfrError::invalid(format!(
                "offset {offset} is at or past the end (total {})",
                reader.total_size()
            )));
        }
    }
    Ok(())
}
