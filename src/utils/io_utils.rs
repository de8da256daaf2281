use crate::utils::{Result, SvgtError};
use flate2::read::MultiGzDecoder;
use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

fn is_gzipped(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("gz") | Some("bgz")
    )
}

pub fn create_reader(path: Option<&PathBuf>) -> Result<Box<dyn BufRead>> {
    let path = match path {
        Some(path) => path,
        None => return Ok(Box::new(BufReader::new(io::stdin()))),
    };

    let file = File::open(path)
        .map_err(|e| SvgtError::Io(format!("Failed to open {}: {}", path.display(), e)))?;
    if is_gzipped(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

pub fn create_writer(path: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                SvgtError::Io(format!("Failed to create {}: {}", path.display(), e))
            })?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}
