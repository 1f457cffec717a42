//! Stream candidate detection.
//!
//! Normals and UVs are not declared by the header. They are found in two
//! steps:
//!
//! 1. [`StreamScan::scan`] walks the buffer once and records runs of
//!    plausible floats. This does not need the vertex count.
//! 2. [`StreamDetector::rank`] turns the configured [`StreamLayout`]s, plus
//!    single-field layouts for every stride in the search range, into
//!    candidate sites (anchors, the bytes right after the position and index
//!    streams, and long enough float runs), scores every site per semantic
//!    role with a [`StreamScorer`], and returns ranked candidates.
//!
//! Nothing here picks a winner silently. [`DetectionReport::resolve`]
//! applies the acceptance threshold, keeps accepted streams from claiming
//! the same bytes, and reports low-confidence and tied results as
//! diagnostics.

use std::collections::BTreeMap;

use byteorder::{ByteOrder, LittleEndian};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::diagnostics::Diagnostic;
use super::header::RrmHeader;
use super::indices::IndexStream;
use super::layout::{RrmLayout, StreamLayout};
use super::scanner::RawBuffer;
use super::streams::{FieldLayout, Semantic, StreamDescriptor, ranges_overlap};
use crate::error::Result;

// ============================================================================
// Configuration
// ============================================================================

/// Tunables for candidate scoring and acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Candidates below this confidence are not used unless explicitly allowed.
    pub min_confidence: f32,
    /// Two confidences closer than this are a tie.
    pub tie_epsilon: f32,
    /// UV components must satisfy `|c| <= uv_envelope` (tiling goes past [0, 1]).
    pub uv_envelope: f32,
    /// Normals must satisfy `| |n| - 1 | <= normal_tolerance`.
    pub normal_tolerance: f32,
    /// Position components must satisfy `|c| <= position_envelope`.
    pub position_envelope: f32,
    /// Shortest float run worth recording.
    pub min_run_floats: u32,
    /// Candidates kept per layout and role.
    pub max_ranked: usize,
    /// Strides seen in real files; other multiples of 4 score lower.
    pub common_strides: Vec<u32>,
    /// Smallest stride tried by the stride search.
    pub search_min_stride: u32,
    /// Largest stride tried by the stride search. Below `search_min_stride`
    /// disables the search.
    pub search_max_stride: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.9,
            tie_epsilon: 1.0e-4,
            uv_envelope: 8.0,
            normal_tolerance: 0.05,
            position_envelope: 1.0e5,
            min_run_floats: 8,
            max_ranked: 8,
            common_strides: vec![16, 24, 32],
            search_min_stride: 8,
            search_max_stride: 48,
        }
    }
}

const UNCOMMON_STRIDE_SCORE: f32 = 0.75;
const CONSTANT_FIELD_FACTOR: f32 = 0.5;
/// Magnitudes at or above this are treated as garbage bits, not data.
const MAX_PLAUSIBLE_MAGNITUDE: f32 = 1.0e7;

/// Finite, not denormal, and not absurdly large.
///
/// Small integers reinterpreted as f32 are denormals, so index and count
/// data break float runs.
#[must_use]
pub fn is_plausible_float(v: f32) -> bool {
    v == 0.0 || (v.is_normal() && v.abs() < MAX_PLAUSIBLE_MAGNITUDE)
}

// ============================================================================
// Stage 1: float runs
// ============================================================================

/// A contiguous, 4-byte aligned run of plausible floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FloatRun {
    pub offset: u64,
    pub floats: u32,
}

impl FloatRun {
    #[must_use]
    pub fn bytes(&self) -> u64 {
        u64::from(self.floats) * 4
    }
}

/// Result of the count-independent scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StreamScan {
    pub runs: Vec<FloatRun>,
}

impl StreamScan {
    #[must_use]
    pub fn scan(buffer: &RawBuffer, config: &DetectorConfig) -> Self {
        let chunks = buffer.as_bytes().chunks_exact(4);
        let total = chunks.len();
        let mut runs = Vec::new();
        let mut start: Option<usize> = None;

        for (i, chunk) in chunks.enumerate() {
            if is_plausible_float(LittleEndian::read_f32(chunk)) {
                start.get_or_insert(i);
            } else if let Some(s) = start.take() {
                push_run(&mut runs, s, i, config.min_run_floats);
            }
        }
        if let Some(s) = start {
            push_run(&mut runs, s, total, config.min_run_floats);
        }

        tracing::debug!("Float scan: {} runs of >= {} floats", runs.len(), config.min_run_floats);
        Self { runs }
    }
}

fn push_run(runs: &mut Vec<FloatRun>, start: usize, end: usize, min_floats: u32) {
    let floats = u32::try_from(end - start).unwrap_or(u32::MAX);
    if floats >= min_floats {
        runs.push(FloatRun {
            offset: start as u64 * 4,
            floats,
        });
    }
}

// ============================================================================
// Scoring
// ============================================================================

/// Breakdown of a candidate's confidence.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Score {
    /// Fraction of decoded values inside the role's envelope.
    pub values: f32,
    /// How usual the stride is.
    pub stride: f32,
    /// 1.0, or lower when a field never changes.
    pub variation: f32,
    /// Product of the above, in [0, 1].
    pub confidence: f32,
}

/// Inputs shared by every scoring call of one detection run.
#[derive(Debug, Clone, Copy)]
pub struct ScoreContext<'a> {
    pub vertex_count: u32,
    pub config: &'a DetectorConfig,
}

/// A strategy that rates how well a stream matches a semantic role.
pub trait StreamScorer: Send + Sync {
    /// Score the `semantic` fields of `descriptor` over `ctx.vertex_count` records.
    ///
    /// The descriptor is guaranteed to fit inside `buffer`.
    fn score(
        &self,
        buffer: &RawBuffer,
        descriptor: &StreamDescriptor,
        semantic: Semantic,
        ctx: &ScoreContext<'_>,
    ) -> Result<Score>;
}

/// Default scorer: value envelopes x stride plausibility x variation.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeScorer;

impl EnvelopeScorer {
    fn stride_score(stride: u32, config: &DetectorConfig) -> f32 {
        if stride == 0 || stride % 4 != 0 {
            0.0
        } else if config.common_strides.contains(&stride) {
            1.0
        } else {
            UNCOMMON_STRIDE_SCORE
        }
    }

    fn read_field(
        buffer: &RawBuffer,
        descriptor: &StreamDescriptor,
        index: u32,
        field: &FieldLayout,
    ) -> Result<[f32; 3]> {
        match field.semantic {
            Semantic::Uv => {
                let [u, v] = descriptor.read_vec2(buffer, index, field)?;
                Ok([u, v, 0.0])
            }
            Semantic::Position | Semantic::Normal => descriptor.read_vec3(buffer, index, field),
        }
    }

    fn plausible(semantic: Semantic, value: [f32; 3], config: &DetectorConfig) -> bool {
        let v = Vec3::from_array(value);
        if !v.is_finite() {
            return false;
        }
        match semantic {
            Semantic::Uv => v.abs().max_element() <= config.uv_envelope,
            Semantic::Normal => (v.length() - 1.0).abs() <= config.normal_tolerance,
            Semantic::Position => v.abs().max_element() <= config.position_envelope,
        }
    }
}

impl StreamScorer for EnvelopeScorer {
    #[allow(clippy::cast_precision_loss)]
    fn score(
        &self,
        buffer: &RawBuffer,
        descriptor: &StreamDescriptor,
        semantic: Semantic,
        ctx: &ScoreContext<'_>,
    ) -> Result<Score> {
        let fields: Vec<&FieldLayout> = descriptor.fields_of(semantic).collect();
        let stride = Self::stride_score(descriptor.stride, ctx.config);
        if fields.is_empty() || stride == 0.0 || ctx.vertex_count == 0 {
            return Ok(Score::default());
        }

        let mut plausible = 0usize;
        let mut total = 0usize;
        let mut first: Vec<[u32; 3]> = Vec::with_capacity(fields.len());
        let mut constant = vec![true; fields.len()];

        for index in 0..ctx.vertex_count {
            for (k, field) in fields.iter().enumerate() {
                let value = Self::read_field(buffer, descriptor, index, field)?;
                let bits = value.map(f32::to_bits);
                if index == 0 {
                    first.push(bits);
                } else if bits != first[k] {
                    constant[k] = false;
                }

                total += 1;
                if Self::plausible(semantic, value, ctx.config) {
                    plausible += 1;
                }
            }
        }

        let values = plausible as f32 / total as f32;
        let variation = if ctx.vertex_count > 1 && constant.iter().any(|&c| c) {
            CONSTANT_FIELD_FACTOR
        } else {
            1.0
        };

        Ok(Score {
            values,
            stride,
            variation,
            confidence: values * stride * variation,
        })
    }
}

// ============================================================================
// Stage 2: candidates and ranking
// ============================================================================

/// Why a site was considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SiteOrigin {
    /// Declared by the header.
    Header,
    /// A layout anchor seen in real files.
    Anchor,
    /// Right after the position stream.
    AfterPositions,
    /// Right after the index stream.
    AfterIndices,
    /// Start of a float run.
    FloatRun,
}

/// One scored hypothesis for one semantic role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamCandidate {
    /// Name of the layout this site was read with.
    pub layout: String,
    pub semantic: Semantic,
    pub descriptor: StreamDescriptor,
    pub origin: SiteOrigin,
    pub score: Score,
}

impl StreamCandidate {
    #[must_use]
    pub fn confidence(&self) -> f32 {
        self.score.confidence
    }
}

/// Ranked candidates for one semantic role, best first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleRanking {
    pub semantic: Semantic,
    pub candidates: Vec<StreamCandidate>,
}

/// Everything the detector found for one buffer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionReport {
    pub vertex_count: u32,
    pub rankings: Vec<RoleRanking>,
}

/// Candidate streams chosen for assembly.
#[derive(Debug, Clone, Default)]
pub struct ResolvedStreams {
    pub normal: Option<StreamCandidate>,
    /// One entry per UV-bearing layout with a usable candidate, in layout order.
    pub uv: Vec<StreamCandidate>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Scores candidate sites against configured layouts.
pub struct StreamDetector<'a> {
    layout: &'a RrmLayout,
    config: &'a DetectorConfig,
    scorer: &'a dyn StreamScorer,
}

static DEFAULT_SCORER: EnvelopeScorer = EnvelopeScorer;

impl<'a> StreamDetector<'a> {
    #[must_use]
    pub fn new(layout: &'a RrmLayout, config: &'a DetectorConfig) -> Self {
        Self::with_scorer(layout, config, &DEFAULT_SCORER)
    }

    #[must_use]
    pub fn with_scorer(
        layout: &'a RrmLayout,
        config: &'a DetectorConfig,
        scorer: &'a dyn StreamScorer,
    ) -> Self {
        Self {
            layout,
            config,
            scorer,
        }
    }

    /// Score every candidate site for `vertex_count` records.
    ///
    /// Configured layouts are ranked per layout, searched single-field
    /// layouts per stride; each keeps at most `max_ranked` candidates per
    /// role.
    ///
    /// # Errors
    /// Only if the scorer fails on a site that fits the buffer.
    pub fn rank(
        &self,
        buffer: &RawBuffer,
        scan: &StreamScan,
        header: &RrmHeader,
        indices: &IndexStream,
        vertex_count: u32,
    ) -> Result<DetectionReport> {
        let ctx = ScoreContext {
            vertex_count,
            config: self.config,
        };
        let positions = header.position_stream.byte_range(vertex_count);
        let index_bytes = indices.offset..indices.end();

        let mut position_candidates = Vec::new();
        let score = self
            .scorer
            .score(buffer, &header.position_stream, Semantic::Position, &ctx)?;
        position_candidates.push(StreamCandidate {
            layout: "header".to_string(),
            semantic: Semantic::Position,
            descriptor: header.position_stream.clone(),
            origin: SiteOrigin::Header,
            score,
        });

        let searched = self.searched_layouts();
        let configured = self.layout.streams.len();
        let mut normals = Vec::new();
        let mut uvs = Vec::new();
        // Searched candidates are ranked per (stride, role).
        let mut searched_groups: BTreeMap<(u32, bool), Vec<(usize, StreamCandidate)>> = BTreeMap::new();

        for (layout_index, stream_layout) in self.layout.streams.iter().chain(&searched).enumerate() {
            let sites = self.sites(stream_layout, scan, positions.end, indices.end(), vertex_count);
            for semantic in [Semantic::Normal, Semantic::Uv] {
                if !stream_layout.provides(semantic) {
                    continue;
                }
                let mut group: Vec<(usize, StreamCandidate)> = self
                    .score_sites(buffer, stream_layout, semantic, &sites, &[&positions, &index_bytes], &ctx)?
                    .into_iter()
                    .map(|c| (layout_index, c))
                    .collect();
                if layout_index >= configured {
                    searched_groups
                        .entry((stream_layout.stride, semantic == Semantic::Uv))
                        .or_default()
                        .extend(group);
                    continue;
                }
                sort_candidates(&mut group);
                group.truncate(self.config.max_ranked);
                match semantic {
                    Semantic::Normal => normals.extend(group),
                    _ => uvs.extend(group),
                }
            }
        }

        for ((_, is_uv), mut group) in searched_groups {
            sort_candidates(&mut group);
            group.truncate(self.config.max_ranked);
            if is_uv {
                uvs.extend(group);
            } else {
                normals.extend(group);
            }
        }
        sort_candidates(&mut normals);
        sort_candidates(&mut uvs);

        tracing::debug!(
            "Stream detection: {} normal and {} UV candidates for {} vertices ({} searched layouts)",
            normals.len(),
            uvs.len(),
            vertex_count,
            searched.len()
        );

        Ok(DetectionReport {
            vertex_count,
            rankings: vec![
                RoleRanking {
                    semantic: Semantic::Position,
                    candidates: position_candidates,
                },
                RoleRanking {
                    semantic: Semantic::Normal,
                    candidates: normals.into_iter().map(|(_, c)| c).collect(),
                },
                RoleRanking {
                    semantic: Semantic::Uv,
                    candidates: uvs.into_iter().map(|(_, c)| c).collect(),
                },
            ],
        })
    }

    /// Score `semantic` at every site that fits the buffer and stays clear
    /// of the `reserved` byte ranges. Zero-confidence sites are dropped.
    fn score_sites(
        &self,
        buffer: &RawBuffer,
        stream_layout: &StreamLayout,
        semantic: Semantic,
        sites: &[(u64, SiteOrigin)],
        reserved: &[&std::ops::Range<u64>],
        ctx: &ScoreContext<'_>,
    ) -> Result<Vec<StreamCandidate>> {
        let mut candidates = Vec::new();
        for &(offset, origin) in sites {
            let descriptor = StreamDescriptor::new(offset, stream_layout.stride, stream_layout.fields.clone());
            let range = descriptor.byte_range(ctx.vertex_count);
            if !descriptor.fits(buffer, ctx.vertex_count) || reserved.iter().any(|r| ranges_overlap(&range, r)) {
                continue;
            }
            let score = self.scorer.score(buffer, &descriptor, semantic, ctx)?;
            if score.confidence > 0.0 {
                candidates.push(StreamCandidate {
                    layout: stream_layout.name.clone(),
                    semantic,
                    descriptor,
                    origin,
                    score,
                });
            }
        }
        Ok(candidates)
    }

    /// One single-field layout per searched stride and field position:
    /// normals at +0, UV pairs at every 4-byte step that fits the record.
    /// Combinations a configured layout already describes are skipped.
    fn searched_layouts(&self) -> Vec<StreamLayout> {
        let mut layouts = Vec::new();
        let strides = (self.config.search_min_stride..=self.config.search_max_stride).filter(|s| s % 4 == 0);
        for stride in strides {
            for semantic in [Semantic::Normal, Semantic::Uv] {
                let width = semantic.components() * 4;
                if stride < width {
                    continue;
                }
                let last = if semantic == Semantic::Normal { 0 } else { stride - width };
                for byte_offset in (0..=last).step_by(4) {
                    let field = FieldLayout::new(byte_offset, semantic);
                    if self.is_configured(stride, &field) {
                        continue;
                    }
                    layouts.push(StreamLayout {
                        name: format!("stride{stride}"),
                        stride,
                        fields: vec![field],
                        anchors: Vec::new(),
                    });
                }
            }
        }
        layouts
    }

    fn is_configured(&self, stride: u32, field: &FieldLayout) -> bool {
        self.layout.streams.iter().any(|l| {
            l.stride == stride
                && l.fields
                    .iter()
                    .filter(|f| f.semantic == field.semantic)
                    .eq(std::iter::once(field))
        })
    }

    /// Candidate offsets for one layout, deduplicated, lowest origin wins.
    fn sites(
        &self,
        stream_layout: &StreamLayout,
        scan: &StreamScan,
        positions_end: u64,
        indices_end: u64,
        vertex_count: u32,
    ) -> Vec<(u64, SiteOrigin)> {
        let span = u64::from(stream_layout.stride) * u64::from(vertex_count);
        let mut sites: Vec<(u64, SiteOrigin)> = stream_layout
            .anchors
            .iter()
            .map(|&a| (a, SiteOrigin::Anchor))
            .collect();
        sites.push((positions_end, SiteOrigin::AfterPositions));
        sites.push((indices_end.next_multiple_of(4), SiteOrigin::AfterIndices));
        sites.extend(
            scan.runs
                .iter()
                .filter(|run| run.bytes() >= span)
                .map(|run| (run.offset, SiteOrigin::FloatRun)),
        );

        sites.sort_unstable();
        sites.dedup_by_key(|(offset, _)| *offset);
        sites
    }
}

/// Confidence descending, then offset, then layout order.
fn sort_candidates(group: &mut [(usize, StreamCandidate)]) {
    group.sort_by(|(la, a), (lb, b)| {
        b.confidence()
            .total_cmp(&a.confidence())
            .then_with(|| a.descriptor.offset.cmp(&b.descriptor.offset))
            .then_with(|| la.cmp(lb))
    });
}

/// Bytes of one record that `candidate` reads for its role.
fn role_bytes(candidate: &StreamCandidate) -> impl Iterator<Item = std::ops::Range<u64>> + '_ {
    candidate
        .descriptor
        .fields_of(candidate.semantic)
        .map(|f| u64::from(f.byte_offset)..u64::from(f.byte_offset) + u64::from(f.width))
}

/// Whether two candidates read any of the same bytes.
///
/// Roles of one record layout (same offset and stride) only conflict when
/// their fields overlap; anything else conflicts as soon as the streams do.
fn conflicts(a: &StreamCandidate, b: &StreamCandidate, vertex_count: u32) -> bool {
    if !ranges_overlap(&a.descriptor.byte_range(vertex_count), &b.descriptor.byte_range(vertex_count)) {
        return false;
    }
    if a.descriptor.offset != b.descriptor.offset || a.descriptor.stride != b.descriptor.stride {
        return true;
    }
    role_bytes(a).any(|x| role_bytes(b).any(|y| ranges_overlap(&x, &y)))
}

impl DetectionReport {
    /// Ranked candidates for `semantic`, best first.
    #[must_use]
    pub fn ranked(&self, semantic: Semantic) -> &[StreamCandidate] {
        self.rankings
            .iter()
            .find(|r| r.semantic == semantic)
            .map_or(&[], |r| r.candidates.as_slice())
    }

    /// Apply the acceptance threshold.
    ///
    /// The normal role takes its single best candidate. Every configured
    /// UV-bearing layout contributes its own best candidate, since competing
    /// UV hypotheses are kept side by side; searched strides are only
    /// consulted when no configured layout yields one. Once a stream is
    /// accepted (or tied for acceptance), candidates that read its bytes as
    /// something else are dropped. Sub-threshold candidates are only used
    /// when `allow_low_confidence` is set.
    #[must_use]
    pub fn resolve(
        &self,
        layout: &RrmLayout,
        config: &DetectorConfig,
        allow_low_confidence: bool,
    ) -> ResolvedStreams {
        let mut resolved = ResolvedStreams::default();
        let mut claimed: Vec<StreamCandidate> = Vec::new();

        if let Some(position) = self.ranked(Semantic::Position).first() {
            if position.confidence() < config.min_confidence {
                resolved.diagnostics.push(Diagnostic::LowConfidenceStream {
                    semantic: Semantic::Position,
                    best_confidence: Some(position.confidence()),
                    threshold: config.min_confidence,
                    used_anyway: true,
                });
            }
        }

        let normals: Vec<&StreamCandidate> = self.ranked(Semantic::Normal).iter().collect();
        resolved.normal = match accepted_best(&normals, config, &mut resolved.diagnostics, &mut claimed) {
            Some(best) => Some(best),
            None => low_confidence(
                normals.first().copied(),
                Semantic::Normal,
                config,
                allow_low_confidence,
                &mut resolved.diagnostics,
                &mut claimed,
            ),
        };

        let uvs = self.ranked(Semantic::Uv);
        let is_configured = |c: &StreamCandidate| layout.streams.iter().any(|l| l.name == c.layout);
        for stream_layout in layout.streams.iter().filter(|l| l.provides(Semantic::Uv)) {
            let of_layout = self.unclaimed(uvs.iter().filter(|c| c.layout == stream_layout.name), &claimed);
            if let Some(best) = accepted_best(&of_layout, config, &mut resolved.diagnostics, &mut claimed) {
                resolved.uv.push(best);
            }
        }

        if resolved.uv.is_empty() {
            let searched = self.unclaimed(uvs.iter().filter(|c| !is_configured(*c)), &claimed);
            if let Some(best) = accepted_best(&searched, config, &mut resolved.diagnostics, &mut claimed) {
                tracing::debug!("UV stream found by stride search: {}@{:#x}", best.layout, best.descriptor.offset);
                resolved.uv.push(best);
            }
        }

        if resolved.uv.is_empty() {
            let open = self.unclaimed(uvs.iter(), &claimed);
            resolved.uv.extend(low_confidence(
                open.first().copied(),
                Semantic::Uv,
                config,
                allow_low_confidence,
                &mut resolved.diagnostics,
                &mut claimed,
            ));
        }

        for diagnostic in &resolved.diagnostics {
            tracing::warn!("{diagnostic}");
        }
        resolved
    }

    fn unclaimed<'r>(
        &self,
        candidates: impl Iterator<Item = &'r StreamCandidate>,
        claimed: &[StreamCandidate],
    ) -> Vec<&'r StreamCandidate> {
        candidates
            .filter(|c| !claimed.iter().any(|k| conflicts(c, k, self.vertex_count)))
            .collect()
    }
}

/// Report a role with no accepted candidate; use the best one if allowed.
fn low_confidence(
    best: Option<&StreamCandidate>,
    semantic: Semantic,
    config: &DetectorConfig,
    allow_low_confidence: bool,
    diagnostics: &mut Vec<Diagnostic>,
    claimed: &mut Vec<StreamCandidate>,
) -> Option<StreamCandidate> {
    let used_anyway = allow_low_confidence && best.is_some();
    diagnostics.push(Diagnostic::LowConfidenceStream {
        semantic,
        best_confidence: best.map(StreamCandidate::confidence),
        threshold: config.min_confidence,
        used_anyway,
    });
    let best = best.filter(|_| used_anyway)?.clone();
    claimed.push(best.clone());
    Some(best)
}

/// Best candidate at or above the threshold; ties are reported.
///
/// The winner and a tied runner-up are both claimed.
fn accepted_best(
    ranked: &[&StreamCandidate],
    config: &DetectorConfig,
    diagnostics: &mut Vec<Diagnostic>,
    claimed: &mut Vec<StreamCandidate>,
) -> Option<StreamCandidate> {
    let mut accepted = ranked
        .iter()
        .filter(|c| c.confidence() >= config.min_confidence);
    let best = *accepted.next()?;
    if let Some(second) = accepted.next() {
        if (best.confidence() - second.confidence()).abs() <= config.tie_epsilon {
            diagnostics.push(Diagnostic::AmbiguousStream {
                semantic: best.semantic,
                layout: best.layout.clone(),
                offsets: vec![best.descriptor.offset, second.descriptor.offset],
                confidence: best.confidence(),
            });
            claimed.push((*second).clone());
        }
    }
    claimed.push(best.clone());
    Some(best.clone())
}
