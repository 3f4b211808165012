use crate::store::{BlockId, CandidateRegion, LocusId, RegionId};
use crate::utils::{BaitError, Result};
use itertools::Itertools;
use std::collections::BTreeMap;

/// How passing regions of a locus are partitioned into conflict blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMode {
    /// Chain neighbouring regions whose buffered intervals overlap.
    /// Loci no longer than `whole_locus_max_len` form a single block.
    Adjacent {
        distance: i64,
        whole_locus_max_len: Option<i64>,
    },
    /// Every locus is one block.
    PerLocus,
}

impl BlockMode {
    pub fn adjacent(distance: i64) -> Self {
        BlockMode::Adjacent {
            distance,
            whole_locus_max_len: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let BlockMode::Adjacent { distance, .. } = self {
            if *distance < 0 {
                return Err(BaitError::Configuration(format!(
                    "Overlap buffer distance cannot be negative, got {}",
                    distance
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Undecided,
    Selected,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMember {
    pub regid: RegionId,
    pub locid: LocusId,
    pub locus_length: i64,
    pub block: BlockId,
    pub choice: Choice,
}

/// Hands out block ids above every locus id, so they never collide with
/// the locus-keyed blocks of singleton and whole-locus groups.
#[derive(Debug)]
pub struct BlockIdAllocator {
    next: BlockId,
}

impl BlockIdAllocator {
    pub fn above(max_locus_id: LocusId) -> Self {
        Self {
            next: max_locus_id + 1,
        }
    }

    pub fn allocate(&mut self) -> BlockId {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Buffered overlap test between a region and its right-hand neighbour.
///
/// `left` is widened by `distance` on both sides (clamped at zero), `right` is not.
pub fn overlaps_buffered(left: &CandidateRegion, right: &CandidateRegion, distance: i64) -> bool {
    let x1 = left.start.saturating_sub(distance).max(0);
    let y1 = left.stop.saturating_add(distance);
    let (x2, y2) = (right.start, right.stop);

    let left_edge = x2 < x1 && y2 >= x1;
    let right_edge = x2 <= y1 && y2 > y1;
    let contained = x2 >= x1 && y2 > x1 && x2 < y1 && y2 <= y1;
    left_edge || right_edge || contained
}

/// Assigns a block id to every candidate. Candidates must be grouped by
/// locus and sorted by coordinate within each group; this is not checked.
pub fn assign_blocks(
    candidates: &[CandidateRegion],
    mode: BlockMode,
    allocator: &mut BlockIdAllocator,
) -> Vec<(RegionId, BlockId)> {
    let mut assignments = Vec::with_capacity(candidates.len());
    for (locid, group) in &candidates.iter().chunk_by(|c| c.locid) {
        let group: Vec<&CandidateRegion> = group.collect();
        let scan_distance = match mode {
            BlockMode::PerLocus => None,
            BlockMode::Adjacent {
                distance,
                whole_locus_max_len,
            } => {
                let whole_locus = group.len() == 1
                    || whole_locus_max_len.is_some_and(|max| group[0].locus_length <= max);
                (!whole_locus).then_some(distance)
            }
        };
        let Some(distance) = scan_distance else {
            assignments.extend(group.iter().map(|c| (c.regid, locid)));
            continue;
        };
        let blocks = scan_adjacent(&group, distance, allocator);
        assignments.extend(group.iter().zip(blocks).map(|(c, b)| (c.regid, b)));
    }
    assignments
}

fn scan_adjacent(
    group: &[&CandidateRegion],
    distance: i64,
    allocator: &mut BlockIdAllocator,
) -> Vec<BlockId> {
    let mut blocks: Vec<Option<BlockId>> = vec![None; group.len()];
    for i in 0..group.len() - 1 {
        if overlaps_buffered(group[i], group[i + 1], distance) {
            match (blocks[i], blocks[i + 1]) {
                (None, None) => {
                    let id = allocator.allocate();
                    blocks[i] = Some(id);
                    blocks[i + 1] = Some(id);
                }
                (Some(id), None) => blocks[i + 1] = Some(id),
                (None, Some(id)) => blocks[i] = Some(id),
                (Some(_), Some(_)) => {}
            }
        } else if blocks[i].is_none() {
            blocks[i] = Some(allocator.allocate());
        }
    }
    blocks
        .into_iter()
        .map(|b| b.unwrap_or_else(|| allocator.allocate()))
        .collect()
}

/// Run-scoped working structure: the block and decision of every passing region.
#[derive(Debug, Clone, Default)]
pub struct ConflictSet {
    members: BTreeMap<RegionId, BlockMember>,
}

impl ConflictSet {
    pub fn build(
        candidates: &[CandidateRegion],
        mode: BlockMode,
        allocator: &mut BlockIdAllocator,
    ) -> Self {
        let assignments: BTreeMap<RegionId, BlockId> =
            assign_blocks(candidates, mode, allocator).into_iter().collect();
        let members = candidates
            .iter()
            .map(|c| {
                let member = BlockMember {
                    regid: c.regid,
                    locid: c.locid,
                    locus_length: c.locus_length,
                    block: assignments[&c.regid],
                    choice: Choice::Undecided,
                };
                (c.regid, member)
            })
            .collect();
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member(&self, regid: RegionId) -> Option<&BlockMember> {
        self.members.get(&regid)
    }

    pub fn members(&self) -> impl Iterator<Item = &BlockMember> {
        self.members.values()
    }

    pub fn choice(&self, regid: RegionId) -> Option<Choice> {
        self.members.get(&regid).map(|m| m.choice)
    }

    pub(crate) fn set_choice(&mut self, regid: RegionId, choice: Choice) {
        if let Some(member) = self.members.get_mut(&regid) {
            member.choice = choice;
        }
    }

    /// Region ids of every block, in ascending block order.
    pub fn blocks(&self) -> BTreeMap<BlockId, Vec<RegionId>> {
        let mut blocks: BTreeMap<BlockId, Vec<RegionId>> = BTreeMap::new();
        for member in self.members.values() {
            blocks.entry(member.block).or_default().push(member.regid);
        }
        blocks
    }

    pub fn block_count(&self) -> usize {
        self.members.values().map(|m| m.block).unique().count()
    }

    /// Undecided members of every block that still has any.
    pub fn undecided_by_block(&self) -> BTreeMap<BlockId, Vec<RegionId>> {
        let mut blocks: BTreeMap<BlockId, Vec<RegionId>> = BTreeMap::new();
        for member in self.members.values() {
            if member.choice == Choice::Undecided {
                blocks.entry(member.block).or_default().push(member.regid);
            }
        }
        blocks
    }

    pub fn unresolved_blocks(&self) -> Vec<BlockId> {
        self.undecided_by_block().into_keys().collect()
    }

    /// Marks `winner` as selected and every other member of its block as rejected.
    pub(crate) fn select(&mut self, winner: RegionId) {
        let Some(block) = self.members.get(&winner).map(|m| m.block) else {
            return;
        };
        for member in self.members.values_mut().filter(|m| m.block == block) {
            member.choice = if member.regid == winner {
                Choice::Selected
            } else {
                Choice::Rejected
            };
        }
    }
}
