use super::blocks::{BlockIdAllocator, BlockMode, Choice, ConflictSet};
use super::strategy::{decide, Outcome, Strategy};
use crate::store::{RegionId, Store};
use crate::utils::{BaitError, Result};
use rand::Rng;
use rusqlite::params;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassTally {
    pub selected: usize,
    pub tied: usize,
    pub no_signal: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CommitSummary {
    pub selected: usize,
    pub rejected: usize,
}

/// One conflict-resolution run over a store.
///
/// The run holds the store mutably for its whole lifetime, so only one can
/// be active at a time. Decisions live in memory until [`ResolutionRun::commit`]
/// writes them back in a single transaction; dropping the run discards them.
pub struct ResolutionRun<'a> {
    store: &'a mut Store,
    conflicts: ConflictSet,
}

impl<'a> ResolutionRun<'a> {
    /// Groups the passing regions of `store` into conflict blocks.
    pub fn begin(store: &'a mut Store, mode: BlockMode) -> Result<Self> {
        mode.validate()?;
        store.verify_schema().map_err(|e| {
            BaitError::SchemaInit(format!("cannot build conflict blocks: {}", e))
        })?;

        let candidates = store.passing_candidates()?;
        if candidates.is_empty() {
            return Err(BaitError::EmptyInput(
                "there are no passing regions to resolve".into(),
            ));
        }
        let max_locus_id = store.max_locus_id()?.unwrap_or(0);
        let mut allocator = BlockIdAllocator::above(max_locus_id);
        let conflicts = ConflictSet::build(&candidates, mode, &mut allocator);

        log::info!(
            "Built {} conflict blocks from {} passing regions",
            conflicts.block_count(),
            conflicts.len()
        );
        Ok(Self { store, conflicts })
    }

    pub fn conflicts(&self) -> &ConflictSet {
        &self.conflicts
    }

    /// Scores undecided members under `strategy` and settles every block with a unique best.
    pub fn apply(&mut self, strategy: Strategy, flank: i64) -> Result<PassTally> {
        self.ensure_not_empty()?;
        let scores = strategy.scores(self.store, flank)?;
        let direction = strategy.direction();

        let mut tally = PassTally::default();
        for (block, undecided) in self.conflicts.undecided_by_block() {
            let scored: Vec<(RegionId, i64)> = undecided
                .iter()
                .map(|regid| (*regid, scores.get(regid).copied().unwrap_or(0)))
                .collect();
            match decide(&scored, direction) {
                Outcome::Selected(winner) => {
                    log::debug!("Block {}: {} selected region {}", block, strategy, winner);
                    self.conflicts.select(winner);
                    tally.selected += 1;
                }
                Outcome::Tied(winners) => {
                    log::debug!("Block {}: {} tied between {:?}", block, strategy, winners);
                    for (regid, _) in scored.iter().filter(|(r, _)| !winners.contains(r)) {
                        self.conflicts.set_choice(*regid, Choice::Rejected);
                    }
                    tally.tied += 1;
                }
                Outcome::NoSignal => {
                    log::debug!("Block {}: no {} signal", block, strategy);
                    tally.no_signal += 1;
                }
            }
        }
        log::info!(
            "Strategy {}: {} blocks resolved, {} tied, {} without signal",
            strategy,
            tally.selected,
            tally.tied,
            tally.no_signal
        );
        Ok(tally)
    }

    /// Settles every block that still has undecided members by a uniform random pick among them.
    pub fn resolve_randomly<R: Rng>(&mut self, rng: &mut R) -> Result<usize> {
        self.ensure_not_empty()?;
        let mut resolved = 0;
        for (block, undecided) in self.conflicts.undecided_by_block() {
            let winner = undecided[rng.random_range(0..undecided.len())];
            log::debug!(
                "Block {}: randomly selected region {} of {}",
                block,
                winner,
                undecided.len()
            );
            self.conflicts.select(winner);
            resolved += 1;
        }
        log::info!("Random tie-break resolved {} blocks", resolved);
        Ok(resolved)
    }

    /// Writes the decisions to the region pass flags and ends the run.
    ///
    /// Only regions that still pass are touched. Nothing is written unless
    /// every block is resolved.
    pub fn commit(self) -> Result<CommitSummary> {
        let unresolved = self.conflicts.unresolved_blocks();
        if !unresolved.is_empty() {
            return Err(BaitError::UnresolvedConflict { blocks: unresolved });
        }

        let mut summary = CommitSummary::default();
        let tx = self.store.transaction()?;
        {
            let mut update =
                tx.prepare("UPDATE regions SET pass = ?1 WHERE regid = ?2 AND pass = 1")?;
            for member in self.conflicts.members() {
                let keep = member.choice == Choice::Selected;
                if update.execute(params![keep, member.regid])? > 0 {
                    if keep {
                        summary.selected += 1;
                    } else {
                        summary.rejected += 1;
                    }
                }
            }
        }
        tx.commit()?;
        log::info!(
            "Committed conflict resolution: {} regions kept, {} rejected",
            summary.selected,
            summary.rejected
        );
        Ok(summary)
    }

    fn ensure_not_empty(&self) -> Result<()> {
        if self.conflicts.is_empty() {
            return Err(BaitError::EmptyInput(
                "there are no regions in the conflict set".into(),
            ));
        }
        Ok(())
    }
}
