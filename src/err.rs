use std::num::ParseIntError;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgError {
    #[error("Invalid format in interval, expected CHROM:START-STOP")]
    IntervalInvalidFormat,
    #[error("Invalid integer coordinates in interval")]
    IntervalInvalidInts(#[from] ParseIntError),
    #[error("Interval start {start} is after stop {stop}")]
    IntervalInvalidBounds { start: u32, stop: u32 },
}
