pub type LocusId = i64;
pub type RegionId = i64;
pub type BlockId = i64;

/// Variant calls that mark an alignment gap or an unknown base rather than a SNP.
pub const BAD_CALLS: [&str; 2] = ["N", "-"];

#[derive(Debug, Clone, PartialEq)]
pub struct Locus {
    pub id: LocusId,
    pub depth: i64,
    pub length: i64,
    pub consensus: String,
    pub pass: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub regid: RegionId,
    pub locid: LocusId,
    pub length: i64,
    pub sequence: String,
    pub variant_count: i64,
    pub bad_count: i64,
    pub gap_count: i64,
    pub start: i64,
    pub stop: i64,
    pub pass: bool,
}

/// Region row to be inserted; `length` is taken from the sequence.
#[derive(Debug, Clone, Default)]
pub struct NewRegion {
    pub locid: LocusId,
    pub start: i64,
    pub stop: i64,
    pub sequence: String,
    pub variant_count: i64,
    pub bad_count: i64,
    pub gap_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub varid: i64,
    pub locid: LocusId,
    pub column: i64,
    pub value: String,
}

/// A passing region as seen by the conflict set builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateRegion {
    pub regid: RegionId,
    pub locid: LocusId,
    pub locus_length: i64,
    pub start: i64,
    pub stop: i64,
}

/// Distinct variant columns around a region, split by call type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlankCounts {
    pub snps: i64,
    pub bad: i64,
}
