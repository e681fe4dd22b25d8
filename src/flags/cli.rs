//! Code implementing the "flags derive" sub command.

use std::{
    io::{BufRead, Write},
    time::Instant,
};

use clap::{ArgGroup, Parser};
use enum_map::EnumMap;
use strum::IntoEnumIterator;

use crate::common::{
    io::{open_read_maybe_gz, open_write_maybe_gz},
    trace_rss_now, GenomicRegion,
};

use super::{
    schema::{severity_order_violation, Variant},
    Flag, FlagDeriver, ViewContext,
};

/// Command line arguments for `flags derive` sub command.
#[derive(Parser, Debug)]
#[command(author, version, about = "Derive variant flags for a view context", long_about = None)]
#[command(group(
    ArgGroup::new("context")
        .required(true)
        .multiple(false)
        .args(["gene_id", "transcript_id", "region", "all_regions"])
))]
pub struct Args {
    /// Path to input JSONL file with variant records, may be gzip-compressed.
    #[arg(long, required = true)]
    pub path_input: String,
    /// Path to output JSONL file, gzip-compressed if ending in `.gz`.
    #[arg(long, required = true)]
    pub path_output: String,
    /// Derive flags for the gene page of this gene.
    #[arg(long)]
    pub gene_id: Option<String>,
    /// Derive flags for the transcript page of this transcript.
    #[arg(long)]
    pub transcript_id: Option<String>,
    /// Derive flags for the region page of `CHROM:START-STOP`.
    #[arg(long)]
    pub region: Option<String>,
    /// Derive flags for a region page without fixed coordinates.
    #[arg(long, default_value_t = false)]
    pub all_regions: bool,
    /// Warn about records whose consequences are not ordered by severity.
    #[arg(long, default_value_t = false)]
    pub check_severity_order: bool,
}

impl TryFrom<&Args> for ViewContext {
    type Error = anyhow::Error;

    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        match (
            &args.gene_id,
            &args.transcript_id,
            &args.region,
            args.all_regions,
        ) {
            (Some(gene_id), None, None, false) => Ok(ViewContext::Gene {
                gene_id: gene_id.clone(),
            }),
            (None, Some(transcript_id), None, false) => Ok(ViewContext::Transcript {
                transcript_id: transcript_id.clone(),
            }),
            (None, None, Some(region), false) => {
                let region: GenomicRegion = region.parse()?;
                Ok(ViewContext::Region {
                    chrom: Some(region.chrom),
                    start: Some(region.start),
                    stop: Some(region.stop),
                })
            }
            (None, None, None, true) => Ok(ViewContext::Region {
                chrom: None,
                start: None,
                stop: None,
            }),
            _ => anyhow::bail!(
                "exactly one of --gene-id, --transcript-id, --region, --all-regions is required"
            ),
        }
    }
}

/// Counters collected while deriving flags.
#[derive(Debug, Default)]
pub struct Stats {
    /// Number of records written.
    pub records: usize,
    /// Number of records with consequences not ordered by severity.
    pub unordered: usize,
    /// Number of times each flag was derived.
    pub flag_counts: EnumMap<Flag, usize>,
}

/// Read variant records line by line, derive their flags, and write them out.
pub fn derive_records<R, W>(
    deriver: &FlagDeriver,
    reader: R,
    writer: &mut W,
    check_severity_order: bool,
) -> Result<Stats, anyhow::Error>
where
    R: BufRead,
    W: Write + ?Sized,
{
    let mut stats = Stats::default();

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut variant: Variant = serde_json::from_str(&line)
            .map_err(|e| anyhow::anyhow!("invalid record in line {}: {}", lineno + 1, e))?;

        if check_severity_order {
            if let Some(idx) = severity_order_violation(&variant.transcript_consequences) {
                tracing::warn!(
                    "consequences of variant {} not ordered by severity at index {}",
                    &variant.variant_id,
                    idx
                );
                stats.unordered += 1;
            }
        }

        let derived = deriver.context_flags(&variant.transcript_consequences);
        for flag in &derived {
            stats.flag_counts[*flag] += 1;
        }
        tracing::trace!("variant {} => {:?}", &variant.variant_id, &derived);
        variant.flags.extend(derived.iter().map(Flag::to_string));

        serde_json::to_writer(&mut *writer, &variant)?;
        writeln!(writer)?;
        stats.records += 1;
    }

    Ok(stats)
}

/// Main entry point for `flags derive` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = Instant::now();
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let deriver = FlagDeriver::new(ViewContext::try_from(args)?);
    tracing::info!("deriving flags for context {:?}", deriver.context());

    tracing::info!("Processing records...");
    let reader = open_read_maybe_gz(&args.path_input)?;
    let mut writer = open_write_maybe_gz(&args.path_output)?;
    let stats = match derive_records(&deriver, reader, &mut writer, args.check_severity_order) {
        Ok(stats) => stats,
        Err(e) => {
            drop(writer);
            if let Err(e) = std::fs::remove_file(&args.path_output) {
                tracing::warn!("could not remove {}: {}", &args.path_output, e);
            }
            return Err(e);
        }
    };
    writer.finish()?;
    tracing::info!("... done processing {} records", stats.records);

    for flag in Flag::iter() {
        tracing::info!("  {:<14} {}", flag.to_string(), stats.flag_counts[flag]);
    }
    if stats.unordered > 0 {
        tracing::warn!(
            "{} records had consequences not ordered by severity",
            stats.unordered
        );
    }

    trace_rss_now();
    tracing::info!(
        "All of `flags derive` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}
