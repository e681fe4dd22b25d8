//! Code for representing variant records and their transcript consequences as
//! handed over by the upstream annotation stages.
//!
//! Records are read from JSON.  Fields that are not needed for deriving flags
//! are kept in `extra` so that records can be written back unchanged.

use std::str::FromStr;

use serde::Deserialize as _;

/// LOFTEE confidence class for a predicted loss-of-function consequence.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    serde_with::SerializeDisplay,
    serde_with::DeserializeFromStr,
)]
pub enum Lof {
    /// High confidence.
    #[strum(serialize = "HC")]
    Hc,
    /// Low confidence.
    #[strum(serialize = "LC")]
    Lc,
    /// Other splice.
    #[strum(serialize = "OS")]
    Os,
}

/// Deserialize an optional `Lof`, treating `null` and `""` as absent.
fn deserialize_lof<'de, D>(deserializer: D) -> Result<Option<Lof>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref() {
        None | Some("") => Ok(None),
        Some(value) => Lof::from_str(value)
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid LoF class: {:?}", value))),
    }
}

/// Marker for caveats on a LoF prediction.
///
/// LOFTEE writes the flag names (e.g., `"SINGLE_EXON"`), some exports only
/// carry a boolean.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum LofFlags {
    /// Boolean marker.
    Marker(bool),
    /// Comma-separated LOFTEE flag names.
    Names(String),
}

impl LofFlags {
    /// Whether the marker actually flags the prediction.
    pub fn is_set(&self) -> bool {
        match self {
            LofFlags::Marker(value) => *value,
            LofFlags::Names(names) => !names.is_empty(),
        }
    }
}

/// VEP consequence terms, most severe first.
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
    serde_with::SerializeDisplay,
    serde_with::DeserializeFromStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Consequence {
    // high impact
    TranscriptAblation,
    SpliceAcceptorVariant,
    SpliceDonorVariant,
    StopGained,
    FrameshiftVariant,
    StopLost,
    StartLost,
    /// gnomAD v2 legacy term.
    InitiatorCodonVariant,
    TranscriptAmplification,
    FeatureElongation,
    FeatureTruncation,

    // moderate impact
    InframeInsertion,
    InframeDeletion,
    MissenseVariant,
    ProteinAlteringVariant,

    // low impact
    #[strum(serialize = "splice_donor_5th_base_variant")]
    SpliceDonor5thBaseVariant,
    SpliceRegionVariant,
    SpliceDonorRegionVariant,
    SplicePolypyrimidineTractVariant,
    IncompleteTerminalCodonVariant,
    StartRetainedVariant,
    StopRetainedVariant,
    SynonymousVariant,

    // modifier
    CodingSequenceVariant,
    #[strum(serialize = "mature_miRNA_variant")]
    MatureMirnaVariant,
    #[strum(serialize = "5_prime_UTR_variant")]
    FivePrimeUtrVariant,
    #[strum(serialize = "3_prime_UTR_variant")]
    ThreePrimeUtrVariant,
    NonCodingTranscriptExonVariant,
    /// gnomAD v2 legacy term.
    NonCodingExonVariant,
    IntronVariant,
    #[strum(serialize = "NMD_transcript_variant")]
    NmdTranscriptVariant,
    NonCodingTranscriptVariant,
    /// gnomAD v2 legacy term.
    NcTranscriptVariant,
    CodingTranscriptVariant,
    UpstreamGeneVariant,
    DownstreamGeneVariant,
    #[strum(serialize = "TFBS_ablation")]
    TfbsAblation,
    #[strum(serialize = "TFBS_amplification")]
    TfbsAmplification,
    #[strum(serialize = "TF_binding_site_variant")]
    TfBindingSiteVariant,
    RegulatoryRegionAblation,
    RegulatoryRegionAmplification,
    RegulatoryRegionVariant,
    IntergenicVariant,
    SequenceVariant,
}

impl Consequence {
    /// Whether the term is one of the VEP terms that LOFTEE evaluates for
    /// loss-of-function.
    pub fn is_lof_term(&self) -> bool {
        matches!(
            self,
            Consequence::TranscriptAblation
                | Consequence::SpliceAcceptorVariant
                | Consequence::SpliceDonorVariant
                | Consequence::StopGained
                | Consequence::FrameshiftVariant
        )
    }
}

/// Major consequence term of a transcript consequence.
///
/// Terms outside the VEP vocabulary above are kept verbatim and are never
/// considered loss-of-function.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    serde_with::SerializeDisplay,
    serde_with::DeserializeFromStr,
)]
pub enum MajorConsequence {
    /// A term from the VEP vocabulary.
    Known(Consequence),
    /// Any other term.
    Other(String),
}

impl MajorConsequence {
    /// The VEP consequence, if the term is known.
    pub fn known(&self) -> Option<Consequence> {
        match self {
            MajorConsequence::Known(csq) => Some(*csq),
            MajorConsequence::Other(_) => None,
        }
    }

    /// See [`Consequence::is_lof_term`], false for unknown terms.
    pub fn is_lof_term(&self) -> bool {
        self.known().is_some_and(|csq| csq.is_lof_term())
    }
}

impl From<Consequence> for MajorConsequence {
    fn from(csq: Consequence) -> Self {
        MajorConsequence::Known(csq)
    }
}

impl FromStr for MajorConsequence {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match Consequence::from_str(s) {
            Ok(csq) => MajorConsequence::Known(csq),
            Err(_) => {
                tracing::trace!("unknown consequence term {:?}", s);
                MajorConsequence::Other(s.to_string())
            }
        })
    }
}

impl std::fmt::Display for MajorConsequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MajorConsequence::Known(csq) => write!(f, "{}", csq),
            MajorConsequence::Other(term) => write!(f, "{}", term),
        }
    }
}

/// Predicted effect of a variant on one transcript.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TranscriptConsequence {
    /// Identifier of the gene owning the transcript.
    #[serde(default)]
    pub gene_id: String,
    /// Identifier of the transcript.
    #[serde(default)]
    pub transcript_id: String,
    /// Most severe consequence term on this transcript.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_consequence: Option<MajorConsequence>,
    /// LOFTEE confidence, if the consequence is predicted LoF.
    ///
    /// `null` and `""` are read as absent and not written back.
    #[serde(
        default,
        deserialize_with = "deserialize_lof",
        skip_serializing_if = "Option::is_none"
    )]
    pub lof: Option<Lof>,
    /// LOFTEE caveats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lof_flags: Option<LofFlags>,
    /// Remaining fields, passed through.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TranscriptConsequence {
    /// Whether the LoF prediction carries caveats.
    pub fn has_lof_flags(&self) -> bool {
        self.lof_flags.as_ref().is_some_and(LofFlags::is_set)
    }

    /// A LoF consequence term on a transcript that LOFTEE did not annotate.
    ///
    /// LOFTEE only annotates coding transcripts, so this identifies pLoF
    /// terms on non-coding transcripts.
    pub fn is_lof_on_non_coding_transcript(&self) -> bool {
        self.lof.is_none()
            && self
                .major_consequence
                .as_ref()
                .is_some_and(MajorConsequence::is_lof_term)
    }
}

/// A variant record together with its transcript consequences.
///
/// `transcript_consequences` must be ordered by severity, most severe first.
/// Nothing in this crate re-sorts them.
#[serde_with::serde_as]
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Variant {
    /// Variant identifier, e.g., `"1-55516888-G-GA"`.
    #[serde(default)]
    pub variant_id: String,
    /// Flags already attached to the variant.
    #[serde_as(as = "serde_with::DefaultOnNull")]
    #[serde(default)]
    pub flags: Vec<String>,
    /// Transcript consequences, most severe first.
    #[serde_as(as = "serde_with::DefaultOnNull")]
    #[serde(default)]
    pub transcript_consequences: Vec<TranscriptConsequence>,
    /// Remaining fields, passed through.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Return the index of the first consequence that is strictly more severe
/// than its predecessor, comparing major consequences only.
///
/// Consequences without a known major consequence are skipped.
pub fn severity_order_violation(consequences: &[TranscriptConsequence]) -> Option<usize> {
    let mut prev: Option<Consequence> = None;
    for (idx, csq) in consequences.iter().enumerate() {
        if let Some(curr) = csq
            .major_consequence
            .as_ref()
            .and_then(MajorConsequence::known)
        {
            if prev.is_some_and(|prev| curr < prev) {
                return Some(idx);
            }
            prev = Some(curr);
        }
    }
    None
}
