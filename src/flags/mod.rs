//! Derivation of the qualitative flags shown next to a variant.
//!
//! The flags depend on the view the variant is shown in: on a gene page only
//! the consequences in that gene are considered, on a region page all
//! consequences are, and on a transcript page only the one consequence on
//! that transcript.

pub mod cli;
pub mod schema;

use schema::{Lof, TranscriptConsequence, Variant};

use crate::err::ArgError;

/// Flags derived from the transcript consequences.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    enum_map::Enum,
    serde_with::SerializeDisplay,
    serde_with::DeserializeFromStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Flag {
    /// Low-confidence pLoF.
    LcLof,
    /// pLoF with LOFTEE caveats.
    LofFlag,
    /// pLoF consequence term on a transcript LOFTEE did not annotate.
    NcTranscript,
    /// Other splice pLoF.
    OsLof,
}

impl Flag {
    /// Human readable label as shown in the browser.
    pub fn label(&self) -> &'static str {
        match self {
            Flag::LcLof => "Low-confidence pLoF",
            Flag::LofFlag => "Flagged pLoF",
            Flag::NcTranscript => "pLoF consequence on non-coding transcript",
            Flag::OsLof => "Other splice pLoF",
        }
    }
}

/// The view that flags are derived for.
///
/// Region coordinates are checked on deserialization like `--region` on the
/// command line.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", try_from = "ViewContextRepr")]
pub enum ViewContext {
    /// Gene page.
    Gene {
        #[serde(rename = "geneId", alias = "gene_id")]
        gene_id: String,
    },
    /// Region page.  The coordinates do not influence the flags.
    Region {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chrom: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stop: Option<u32>,
    },
    /// Transcript page.
    Transcript {
        #[serde(rename = "transcriptId", alias = "transcript_id")]
        transcript_id: String,
    },
}

/// Unchecked `ViewContext` as read from JSON.
#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ViewContextRepr {
    Gene {
        #[serde(rename = "geneId", alias = "gene_id")]
        gene_id: String,
    },
    Region {
        #[serde(default)]
        chrom: Option<String>,
        #[serde(default)]
        start: Option<u32>,
        #[serde(default)]
        stop: Option<u32>,
    },
    Transcript {
        #[serde(rename = "transcriptId", alias = "transcript_id")]
        transcript_id: String,
    },
}

impl TryFrom<ViewContextRepr> for ViewContext {
    type Error = ArgError;

    fn try_from(value: ViewContextRepr) -> Result<Self, Self::Error> {
        Ok(match value {
            ViewContextRepr::Gene { gene_id } => ViewContext::Gene { gene_id },
            ViewContextRepr::Region { chrom, start, stop } => {
                if let (Some(start), Some(stop)) = (start, stop) {
                    if start > stop {
                        return Err(ArgError::IntervalInvalidBounds { start, stop });
                    }
                }
                ViewContext::Region { chrom, start, stop }
            }
            ViewContextRepr::Transcript { transcript_id } => {
                ViewContext::Transcript { transcript_id }
            }
        })
    }
}

/// Rules for a list of consequences, most severe first.
fn flags_for_consequences(consequences: &[&TranscriptConsequence]) -> Vec<Flag> {
    let mut result = Vec::new();

    let most_severe = consequences.first();
    let lof_consequences = consequences
        .iter()
        .filter(|csq| csq.lof.is_some())
        .collect::<Vec<_>>();

    if !lof_consequences.is_empty() {
        // A coding transcript without pLoF annotation may be ranked above a non-coding
        // transcript with a pLoF VEP term.  LOFTEE does not annotate non-coding transcripts,
        // so only flag LC if the most severe consequence is annotated itself.
        if !lof_consequences.iter().any(|csq| csq.lof == Some(Lof::Hc))
            && most_severe.is_some_and(|csq| csq.lof.is_some())
        {
            result.push(Flag::LcLof);
        }
        if lof_consequences.iter().all(|csq| csq.has_lof_flags()) {
            result.push(Flag::LofFlag);
        }
    }

    if let Some(most_severe) = most_severe {
        if most_severe.is_lof_on_non_coding_transcript() {
            result.push(Flag::NcTranscript);
        }
        if most_severe.lof == Some(Lof::Os) {
            result.push(Flag::OsLof);
        }
    }

    result
}

/// Rules for the single consequence on one transcript; the checks are
/// independent of each other.
fn flags_for_consequence(csq: &TranscriptConsequence) -> Vec<Flag> {
    let mut result = Vec::new();

    if csq.lof == Some(Lof::Lc) {
        result.push(Flag::LcLof);
    }
    if csq.lof == Some(Lof::Os) {
        result.push(Flag::OsLof);
    }
    if csq.lof.is_some() && csq.has_lof_flags() {
        result.push(Flag::LofFlag);
    }
    if csq.is_lof_on_non_coding_transcript() {
        result.push(Flag::NcTranscript);
    }

    result
}

/// Compute the flags derived from `consequences` in the given context.
///
/// `consequences` must be ordered by severity, most severe first.
pub fn context_flags(consequences: &[TranscriptConsequence], context: &ViewContext) -> Vec<Flag> {
    match context {
        ViewContext::Gene { gene_id } => {
            let in_gene = consequences
                .iter()
                .filter(|csq| &csq.gene_id == gene_id)
                .collect::<Vec<_>>();
            flags_for_consequences(&in_gene)
        }
        ViewContext::Region { .. } => {
            flags_for_consequences(&consequences.iter().collect::<Vec<_>>())
        }
        ViewContext::Transcript { transcript_id } => consequences
            .iter()
            .find(|csq| &csq.transcript_id == transcript_id)
            .map(flags_for_consequence)
            .unwrap_or_default(),
    }
}

/// Return the variant's flags followed by the flags derived in `context`.
///
/// The variant is left untouched.  Derived flags are appended even if the
/// variant already carries them.
pub fn derive_flags(variant: &Variant, context: &ViewContext) -> Vec<String> {
    let mut flags = variant.flags.clone();
    flags.extend(
        context_flags(&variant.transcript_consequences, context)
            .iter()
            .map(Flag::to_string),
    );
    flags
}

/// Derives flags for many variants shown in the same context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagDeriver {
    context: ViewContext,
}

impl FlagDeriver {
    /// Create a new deriver for the given context.
    pub fn new(context: ViewContext) -> Self {
        Self { context }
    }

    /// The context flags are derived for.
    pub fn context(&self) -> &ViewContext {
        &self.context
    }

    /// See [`context_flags`].
    pub fn context_flags(&self, consequences: &[TranscriptConsequence]) -> Vec<Flag> {
        context_flags(consequences, &self.context)
    }

    /// See [`derive_flags`].
    pub fn derive(&self, variant: &Variant) -> Vec<String> {
        derive_flags(variant, &self.context)
    }
}
