//! Trace file parsing
//!
//! A trace line looks like ` L 7ff000388,4`: an operation letter,
//! a hexadecimal address and a decimal access size.
//! Lines of any other shape (instruction fetches, blanks) are skipped.

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use crate::cache::AccessKind;
use crate::error::SimulatorResult;
use crate::error::TraceError;
use crate::error::TraceLineError;

/// A decoded trace line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Access {
    pub kind: AccessKind,
    pub address: u64,
    /// Carried through for reporting, never used for lookups
    pub size: u32,
}

impl FromStr for AccessKind {
    type Err = TraceLineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "L" => Ok(AccessKind::Load),
            "S" => Ok(AccessKind::Store),
            "M" => Ok(AccessKind::Modify),
            _ => Err(TraceLineError::UnknownOperation(s.to_string())),
        }
    }
}

impl FromStr for Access {
    type Err = TraceLineError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (op, rest) = line
            .split_once(char::is_whitespace)
            .ok_or(if line.is_empty() {
                TraceLineError::Empty
            } else {
                TraceLineError::UnknownOperation(line.to_string())
            })?;
        let kind: AccessKind = op.parse()?;

        let (address_str, size_str) = rest
            .trim_start()
            .split_once(',')
            .ok_or(TraceLineError::MissingSize)?;
        let address_str = address_str.trim();
        let digits = address_str
            .strip_prefix("0x")
            .or_else(|| address_str.strip_prefix("0X"))
            .unwrap_or(address_str);
        let address = u64::from_str_radix(digits, 16).map_err(|_| {
            TraceLineError::InvalidAddress(address_str.to_string())
        })?;

        let size_str = size_str.trim();
        let size = size_str
            .parse()
            .map_err(|_| TraceLineError::InvalidSize(size_str.to_string()))?;

        Ok(Access {
            kind,
            address,
            size,
        })
    }
}

/// Streams the accesses of a trace in file order
pub struct TraceReader<R> {
    lines: std::io::Lines<R>,
    line_num: usize,
}

impl TraceReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> SimulatorResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| TraceError::OpenError(path.to_path_buf(), e))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_num: 0,
        }
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = SimulatorResult<Access>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_num += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    let error = TraceError::ReadError(self.line_num, e);
                    return Some(Err(error.into()));
                }
            };
            match line.parse::<Access>() {
                Ok(access) => return Some(Ok(access)),
                Err(reason) => {
                    tracing::trace!(
                        line = self.line_num,
                        %reason,
                        "skipping trace line"
                    );
                }
            }
        }
    }
}

/// Fetch all accesses from the trace file
pub fn fetch_accesses(
    trace_path: impl AsRef<Path>,
) -> SimulatorResult<Vec<Access>> {
    TraceReader::open(trace_path)?.collect()
}
