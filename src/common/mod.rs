//! Common functionality.

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

use crate::err::ArgError;

pub mod io;

/// Commonly used command line arguments.
#[derive(Parser, Debug)]
pub struct Args {
    /// Verbosity of the program
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            verbose: Verbosity::new(0, 0),
        }
    }
}

/// Helper to print the current memory resident set size via `tracing`.
pub fn trace_rss_now() {
    let rss = procfs::process::Process::myself()
        .and_then(|me| me.stat())
        .map(|stat| stat.rss * procfs::page_size());
    match rss {
        Ok(rss) => tracing::debug!(
            "RSS now: {:.2}",
            byte_unit::Byte::from_u64(rss).get_appropriate_unit(byte_unit::UnitType::Binary)
        ),
        Err(e) => tracing::debug!("could not determine RSS: {}", e),
    }
}

/// A genomic region with 1-based, closed coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomicRegion {
    /// Chromosome name.
    pub chrom: String,
    /// 1-based start position.
    pub start: u32,
    /// 1-based, inclusive stop position.
    pub stop: u32,
}

impl std::str::FromStr for GenomicRegion {
    type Err = ArgError;

    /// Parse from `CHROM:START-STOP` or the gnomAD region id `CHROM-START-STOP`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (rest, stop) = s.rsplit_once('-').ok_or(ArgError::IntervalInvalidFormat)?;
        let (chrom, start) = rest
            .rsplit_once(':')
            .or_else(|| rest.rsplit_once('-'))
            .ok_or(ArgError::IntervalInvalidFormat)?;
        if chrom.is_empty() {
            return Err(ArgError::IntervalInvalidFormat);
        }
        let start = start.replace(',', "").parse::<u32>()?;
        let stop = stop.replace(',', "").parse::<u32>()?;
        if start > stop {
            return Err(ArgError::IntervalInvalidBounds { start, stop });
        }

        Ok(Self {
            chrom: chrom.to_string(),
            start,
            stop,
        })
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::GenomicRegion;
    use crate::err::ArgError;

    #[rstest::rstest]
    #[case("1:55505222-55530525", "1", 55505222, 55530525)]
    #[case("chrX:1,000-2,000", "chrX", 1000, 2000)]
    #[case("1-55505222-55530525", "1", 55505222, 55530525)]
    #[case("MT-1-16569", "MT", 1, 16569)]
    fn genomic_region_parse(
        #[case] s: &str,
        #[case] chrom: &str,
        #[case] start: u32,
        #[case] stop: u32,
    ) -> Result<(), anyhow::Error> {
        let region: GenomicRegion = s.parse()?;
        assert_eq!(
            region,
            GenomicRegion {
                chrom: chrom.to_string(),
                start,
                stop,
            }
        );

        Ok(())
    }

    #[test]
    fn genomic_region_parse_errors() {
        assert!(matches!(
            "1".parse::<GenomicRegion>(),
            Err(ArgError::IntervalInvalidFormat)
        ));
        assert!(matches!(
            "-100".parse::<GenomicRegion>(),
            Err(ArgError::IntervalInvalidFormat)
        ));
        assert!(matches!(
            "1:x-100".parse::<GenomicRegion>(),
            Err(ArgError::IntervalInvalidInts(_))
        ));
        assert!(matches!(
            "1:200-100".parse::<GenomicRegion>(),
            Err(ArgError::IntervalInvalidBounds {
                start: 200,
                stop: 100
            })
        ));
    }
}
