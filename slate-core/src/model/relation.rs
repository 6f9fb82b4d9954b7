use std::fmt;

use serde::Serialize;

/// How one span sits relative to another.
///
/// Diagrams show `self` against `other` (`|-------|`); `.` marks an end that
/// falls strictly between positions of `other`, `|` an end that coincides
/// with one of them. The `one_*` relations are for a zero-width `self`,
/// `*_one` for a zero-width `other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanRelation {
    Smaller,
    SmallerLeft,
    OverlapEnd,
    OverlapRight,
    Cover,
    LeftInside,
    Equal,
    LeftOverlap,
    Inside,
    InsideRight,
    OverlapStart,
    RightLarger,
    Larger,
    OneSmaller,
    OneLeft,
    OneInside,
    OneRight,
    OneLarger,
    SmallerOne,
    SmallerMatch,
    CoverOne,
    EqualOne,
    MatchLarger,
    LargerOne,
    SmallerOneOne,
    LargerOneOne,
}

/// Signs of the six endpoint comparisons, in the order
/// (s0 vs s1, e0 vs e1, s0 vs e1, e0 vs s1, s0 vs e0, s1 vs e1), where
/// +1 means the left endpoint precedes the right one.
pub type ComparisonKey = (i8, i8, i8, i8, i8, i8);

/// Relations where `self` sits at or after the start of `other`
pub const SPAN_COMPARE_GE: &[SpanRelation] = &[
    SpanRelation::LeftInside,
    SpanRelation::Equal,
    SpanRelation::LeftOverlap,
    SpanRelation::Inside,
    SpanRelation::InsideRight,
    SpanRelation::OverlapStart,
    SpanRelation::RightLarger,
    SpanRelation::Larger,
    SpanRelation::OneLeft,
    SpanRelation::OneInside,
    SpanRelation::OneRight,
    SpanRelation::OneLarger,
    SpanRelation::EqualOne,
    SpanRelation::MatchLarger,
    SpanRelation::LargerOne,
    SpanRelation::LargerOneOne,
];

/// Relations where `self` sits at or before the end of `other`
pub const SPAN_COMPARE_LE: &[SpanRelation] = &[
    SpanRelation::Smaller,
    SpanRelation::SmallerLeft,
    SpanRelation::OverlapEnd,
    SpanRelation::OverlapRight,
    SpanRelation::LeftInside,
    SpanRelation::Equal,
    SpanRelation::Inside,
    SpanRelation::InsideRight,
    SpanRelation::OneSmaller,
    SpanRelation::OneLeft,
    SpanRelation::OneInside,
    SpanRelation::OneRight,
    SpanRelation::SmallerOne,
    SpanRelation::SmallerMatch,
    SpanRelation::EqualOne,
    SpanRelation::SmallerOneOne,
];

impl SpanRelation {
    /// Look up the relation for a comparison key. `None` only for keys that
    /// cannot come from spans whose start does not follow their end.
    #[rustfmt::skip]
    pub fn classify(key: ComparisonKey) -> Option<Self> {
        use SpanRelation::*;

        let relation = match key {
            //  s0s1 e0e1 s0e1 e0s1 s0e0 s1e1                   |-------|
            (1,  1,  1,  1,  1,  1) => Smaller,           // .--.
            (1,  1,  1,  0,  1,  1) => SmallerLeft,       // .-----|
            (1,  1,  1, -1,  1,  1) => OverlapEnd,        // .---------.
            (1,  0,  1, -1,  1,  1) => OverlapRight,      // .-------------|
            (1, -1,  1, -1,  1,  1) => Cover,             // .-------------------.
            (0,  1,  1, -1,  1,  1) => LeftInside,        //       |---.
            (0,  0,  1, -1,  1,  1) => Equal,             //       |-------|
            (0, -1,  1, -1,  1,  1) => LeftOverlap,       //       |-------------.
            (-1,  1,  1, -1,  1,  1) => Inside,           //          .-.
            (-1,  0,  1, -1,  1,  1) => InsideRight,      //           .---|
            (-1, -1,  1, -1,  1,  1) => OverlapStart,     //           .---------.
            (-1, -1,  0, -1,  1,  1) => RightLarger,      //               |-----.
            (-1, -1, -1, -1,  1,  1) => Larger,           //                  .--.
            (1,  1,  1,  1,  0,  1) => OneSmaller,        // .
            (0,  1,  1,  0,  0,  1) => OneLeft,           //       |
            (-1,  1,  1, -1,  0,  1) => OneInside,        //           .
            (-1,  0,  0, -1,  0,  1) => OneRight,         //               |
            (-1, -1, -1, -1,  0,  1) => OneLarger,        //                     .
            // Zero-width other                                       |
            (1,  1,  1,  1,  1,  0) => SmallerOne,        //     .--.
            (1,  0,  1,  0,  1,  0) => SmallerMatch,      //     .-----|
            (1, -1,  1, -1,  1,  0) => CoverOne,          //     .-----------.
            (0,  0,  0,  0,  0,  0) => EqualOne,          //           |
            (0, -1,  0, -1,  1,  0) => MatchLarger,       //           |-----.
            (-1, -1, -1, -1,  1,  0) => LargerOne,        //              .--.
            (1,  1,  1,  1,  0,  0) => SmallerOneOne,     //     .
            (-1, -1, -1, -1,  0,  0) => LargerOneOne,     //               .
            _ => return None,
        };
        Some(relation)
    }

    /// At or after the start of the other span (viewport lower bound check)
    pub fn is_ge(&self) -> bool {
        SPAN_COMPARE_GE.contains(self)
    }

    /// At or before the end of the other span (viewport upper bound check)
    pub fn is_le(&self) -> bool {
        SPAN_COMPARE_LE.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        use SpanRelation::*;

        match self {
            Smaller => "smaller",
            SmallerLeft => "smaller_left",
            OverlapEnd => "overlap_end",
            OverlapRight => "overlap_right",
            Cover => "cover",
            LeftInside => "left_inside",
            Equal => "equal",
            LeftOverlap => "left_overlap",
            Inside => "inside",
            InsideRight => "inside_right",
            OverlapStart => "overlap_start",
            RightLarger => "right_larger",
            Larger => "larger",
            OneSmaller => "one_smaller",
            OneLeft => "one_left",
            OneInside => "one_inside",
            OneRight => "one_right",
            OneLarger => "one_larger",
            SmallerOne => "smaller_one",
            SmallerMatch => "smaller_match",
            CoverOne => "cover_one",
            EqualOne => "equal_one",
            MatchLarger => "match_larger",
            LargerOne => "larger_one",
            SmallerOneOne => "smaller_one_one",
            LargerOneOne => "larger_one_one",
        }
    }
}

impl fmt::Display for SpanRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
