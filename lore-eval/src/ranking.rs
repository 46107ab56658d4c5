//! Deterministic ranking of fused candidate scores.

use std::fmt;

use lore_core::PoiId;

/// One ranked candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedEntry {
    /// Candidate POI.
    pub poi: PoiId,
    /// Fused score; negative for masked training pairs.
    pub score: f64,
}

impl RankedEntry {
    /// Report whether this candidate was masked as a training pair.
    #[must_use]
    pub const fn is_masked(&self) -> bool {
        self.score < 0.0
    }
}

/// Candidates ordered by descending score, ties by ascending POI.
///
/// Masked candidates are kept at the tail so the execution record shows the
/// full ranking, but they never reach the metric view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedList {
    entries: Vec<RankedEntry>,
}

impl RankedList {
    /// Ranked entries, best first.
    #[must_use]
    pub const fn entries(&self) -> &[RankedEntry] {
        self.entries.as_slice()
    }

    /// Ranked POIs, best first.
    pub fn pois(&self) -> impl Iterator<Item = PoiId> + '_ {
        self.entries.iter().map(|entry| entry.poi)
    }

    /// Number of ranked entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Report whether nothing was ranked.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first `top_k` entries with masked candidates removed.
    ///
    /// The view is never padded; fewer than `top_k` POIs may be returned.
    #[must_use]
    pub fn metric_view(&self, top_k: usize) -> Vec<PoiId> {
        self.entries
            .iter()
            .take(top_k)
            .filter(|entry| !entry.is_masked())
            .map(|entry| entry.poi)
            .collect()
    }
}

/// Comma-joined POI identifiers, as written to the execution record.
impl fmt::Display for RankedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pois = self.pois();
        if let Some(first) = pois.next() {
            write!(f, "{first}")?;
        }
        for poi in pois {
            write!(f, ",{poi}")?;
        }
        Ok(())
    }
}

/// Rank `scores`, where index `i` scores POI `i`, keeping the best
/// `top_restricted` entries.
///
/// # Examples
/// ```
/// use lore_eval::rank;
///
/// let ranked = rank(&[0.1, 0.3, -1.0, 0.9, 0.2], 5);
/// assert_eq!(ranked.pois().collect::<Vec<_>>(), vec![3, 1, 4, 0, 2]);
/// assert_eq!(ranked.metric_view(5), vec![3, 1, 4, 0]);
/// ```
#[must_use]
pub fn rank(scores: &[f64], top_restricted: usize) -> RankedList {
    let mut entries: Vec<RankedEntry> = (0..)
        .zip(scores)
        .map(|(poi, &score)| RankedEntry { poi, score })
        .collect();
    entries.sort_unstable_by(|lhs, rhs| {
        sort_key(rhs.score)
            .total_cmp(&sort_key(lhs.score))
            .then_with(|| lhs.poi.cmp(&rhs.poi))
    });
    entries.truncate(top_restricted);
    RankedList { entries }
}

/// Total-order key: `-0.0` equals `0.0` and NaN sorts below everything.
#[expect(clippy::float_arithmetic, reason = "adding zero folds -0.0 into 0.0")]
const fn sort_key(score: f64) -> f64 {
    if score.is_nan() {
        f64::NEG_INFINITY
    } else {
        score + 0.0
    }
}
