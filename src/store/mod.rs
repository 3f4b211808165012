mod records;
mod schema;

pub use records::{
    BlockId, CandidateRegion, FlankCounts, Locus, LocusId, NewRegion, Region, RegionId, Variant,
    BAD_CALLS,
};

use crate::utils::{BaitError, Result};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::collections::HashMap;
use std::path::Path;

/// SQLite-backed storage of loci, candidate regions and variant calls.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens an existing store and checks that its tables are present.
    pub fn open(path: &Path) -> Result<Self> {
        let store = Self::from_connection(Connection::open(path)?)?;
        store.verify_schema()?;
        Ok(store)
    }

    /// Opens `path` and replaces any existing tables with an empty schema.
    pub fn create(path: &Path) -> Result<Self> {
        let mut store = Self::from_connection(Connection::open(path)?)?;
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let mut store = Self::from_connection(Connection::open_in_memory()?)?;
        store.init_schema()?;
        Ok(store)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    pub fn init_schema(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(schema::DROP_TABLES)
            .and_then(|_| tx.execute_batch(schema::CREATE_TABLES))
            .map_err(|e| BaitError::SchemaInit(e.to_string()))?;
        tx.commit()?;
        self.verify_schema()
    }

    pub fn verify_schema(&self) -> Result<()> {
        for table in schema::TABLES {
            let found: i64 = self.conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![table],
                |row| row.get(0),
            )?;
            if found == 0 {
                return Err(BaitError::SchemaInit(format!(
                    "table '{}' is missing from the store",
                    table
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    pub fn add_locus(&mut self, depth: i64, consensus: &str, pass: bool) -> Result<LocusId> {
        self.conn.execute(
            "INSERT INTO loci (depth, length, consensus, pass) VALUES (?1, ?2, ?3, ?4)",
            params![depth, consensus.len() as i64, consensus, pass],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn add_region(&mut self, region: &NewRegion) -> Result<RegionId> {
        let locus = self.locus(region.locid)?.ok_or_else(|| {
            BaitError::InvalidRecord(format!(
                "region references unknown locus {}",
                region.locid
            ))
        })?;
        if region.start < 0 || region.start > region.stop || region.stop > locus.length {
            return Err(BaitError::InvalidRecord(format!(
                "region {}-{} is outside locus {} (length {})",
                region.start, region.stop, locus.id, locus.length
            )));
        }
        self.conn.execute(
            "INSERT INTO regions (locid, length, sequence, vars, bad, gap, start, stop, pass)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1)",
            params![
                region.locid,
                region.sequence.len() as i64,
                region.sequence,
                region.variant_count,
                region.bad_count,
                region.gap_count,
                region.start,
                region.stop
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Records a variant call; an identical call at the same column is ignored.
    pub fn add_variant(&mut self, locid: LocusId, column: i64, value: &str) -> Result<()> {
        if value.chars().count() != 1 {
            return Err(BaitError::InvalidRecord(format!(
                "variant value must be a single character, got '{}'",
                value
            )));
        }
        if self.locus(locid)?.is_none() {
            return Err(BaitError::InvalidRecord(format!(
                "variant references unknown locus {}",
                locid
            )));
        }
        self.conn.execute(
            r#"INSERT OR IGNORE INTO variants (locid, "column", value) VALUES (?1, ?2, ?3)"#,
            params![locid, column, value],
        )?;
        Ok(())
    }

    pub fn locus(&self, id: LocusId) -> Result<Option<Locus>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, depth, length, consensus, pass FROM loci WHERE id = ?1",
                params![id],
                row_to_locus,
            )
            .optional()?)
    }

    pub fn region(&self, regid: RegionId) -> Result<Option<Region>> {
        Ok(self
            .conn
            .query_row(
                "SELECT regid, locid, length, sequence, vars, bad, gap, start, stop, pass
                 FROM regions WHERE regid = ?1",
                params![regid],
                row_to_region,
            )
            .optional()?)
    }

    pub fn variants(&self, locid: LocusId) -> Result<Vec<Variant>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT varid, locid, "column", value FROM variants
               WHERE locid = ?1 ORDER BY "column", varid"#,
        )?;
        let rows = stmt.query_map(params![locid], |row| {
            Ok(Variant {
                varid: row.get(0)?,
                locid: row.get(1)?,
                column: row.get(2)?,
                value: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count_loci(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM loci")
    }

    pub fn count_passing_loci(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM loci WHERE pass = 1")
    }

    pub fn count_regions(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM regions")
    }

    pub fn count_passing_regions(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM regions WHERE pass = 1")
    }

    pub fn count_variants(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM variants")
    }

    fn count(&self, sql: &str) -> Result<usize> {
        let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(n as usize)
    }

    pub fn max_locus_id(&self) -> Result<Option<LocusId>> {
        Ok(self
            .conn
            .query_row("SELECT MAX(id) FROM loci", [], |row| row.get(0))?)
    }

    /// Passing regions whose owning locus also passes.
    pub fn passing_regions_of_passing_loci(&self) -> Result<Vec<Region>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.regid, r.locid, r.length, r.sequence, r.vars, r.bad, r.gap,
                    r.start, r.stop, r.pass
             FROM regions AS r INNER JOIN loci AS l ON r.locid = l.id
             WHERE r.pass = 1 AND l.pass = 1
             ORDER BY r.locid, r.start, r.stop, r.regid",
        )?;
        let rows = stmt.query_map([], row_to_region)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Passing regions ordered by locus, then by coordinate.
    pub fn passing_candidates(&self) -> Result<Vec<CandidateRegion>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.regid, r.locid, l.length, r.start, r.stop
             FROM regions AS r INNER JOIN loci AS l ON r.locid = l.id
             WHERE r.pass = 1
             ORDER BY r.locid, r.start, r.stop, r.regid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CandidateRegion {
                regid: row.get(0)?,
                locid: row.get(1)?,
                locus_length: row.get(2)?,
                start: row.get(3)?,
                stop: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Distinct SNP and gap/unknown columns within `[start - flank, stop + flank]` of every region.
    pub fn flanking_counts(&self, flank: i64) -> Result<HashMap<RegionId, FlankCounts>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT r.regid,
                      COUNT(DISTINCT CASE WHEN v.value NOT IN (?2, ?3) THEN v."column" END),
                      COUNT(DISTINCT CASE WHEN v.value IN (?2, ?3) THEN v."column" END)
               FROM regions AS r
               LEFT JOIN variants AS v
                 ON v.locid = r.locid
                AND v."column" BETWEEN r.start - ?1 AND r.stop + ?1
               GROUP BY r.regid"#,
        )?;
        let rows = stmt.query_map(params![flank, BAD_CALLS[0], BAD_CALLS[1]], |row| {
            Ok((
                row.get::<_, RegionId>(0)?,
                FlankCounts {
                    snps: row.get(1)?,
                    bad: row.get(2)?,
                },
            ))
        })?;
        Ok(rows.collect::<rusqlite::Result<HashMap<_, _>>>()?)
    }

    pub fn variant_burdens(&self) -> Result<HashMap<RegionId, i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT regid, vars + gap + bad FROM regions")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<rusqlite::Result<HashMap<_, _>>>()?)
    }

    pub fn passing_region_ids(&self) -> Result<Vec<RegionId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT regid FROM regions WHERE pass = 1 ORDER BY regid")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn region_pass_flags(&self) -> Result<HashMap<RegionId, bool>> {
        let mut stmt = self.conn.prepare("SELECT regid, pass FROM regions")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<rusqlite::Result<HashMap<_, _>>>()?)
    }
}

fn row_to_locus(row: &Row) -> rusqlite::Result<Locus> {
    Ok(Locus {
        id: row.get(0)?,
        depth: row.get(1)?,
        length: row.get(2)?,
        consensus: row.get(3)?,
        pass: row.get(4)?,
    })
}

fn row_to_region(row: &Row) -> rusqlite::Result<Region> {
    Ok(Region {
        regid: row.get(0)?,
        locid: row.get(1)?,
        length: row.get(2)?,
        sequence: row.get(3)?,
        variant_count: row.get(4)?,
        bad_count: row.get(5)?,
        gap_count: row.get(6)?,
        start: row.get(7)?,
        stop: row.get(8)?,
        pass: row.get(9)?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn region_at(locid: LocusId, start: i64, stop: i64) -> NewRegion {
        NewRegion {
            locid,
            start,
            stop,
            sequence: "A".repeat((stop - start).max(0) as usize),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_and_fetch_records() {
        let mut store = Store::open_in_memory().unwrap();
        let locid = store.add_locus(20, &"ACGT".repeat(125), true).unwrap();
        let regid = store.add_region(&region_at(locid, 10, 60)).unwrap();
        store.add_variant(locid, 12, "T").unwrap();
        store.add_variant(locid, 12, "T").unwrap();
        store.add_variant(locid, 40, "N").unwrap();

        let locus = store.locus(locid).unwrap().unwrap();
        assert_eq!(locus.length, 500);
        assert_eq!(locus.depth, 20);
        assert!(locus.pass);

        let region = store.region(regid).unwrap().unwrap();
        assert_eq!(region.length, 50);
        assert!(region.pass);
        assert_eq!(store.count_variants().unwrap(), 2);
        assert_eq!(store.variants(locid).unwrap().len(), 2);
    }

    #[test]
    fn test_region_outside_locus_rejected() {
        let mut store = Store::open_in_memory().unwrap();
        let locid = store.add_locus(20, &"A".repeat(100), true).unwrap();
        assert!(matches!(
            store.add_region(&region_at(locid, 50, 150)),
            Err(BaitError::InvalidRecord(_))
        ));
        // stop before start
        let inverted = region_at(locid, 60, 50);
        assert!(inverted.sequence.is_empty());
        assert!(matches!(
            store.add_region(&inverted),
            Err(BaitError::InvalidRecord(_))
        ));
        assert!(matches!(
            store.add_region(&region_at(locid + 1, 0, 10)),
            Err(BaitError::InvalidRecord(_))
        ));
        assert_eq!(store.count_regions().unwrap(), 0);
    }

    #[test]
    fn test_variant_value_must_be_single_call() {
        let mut store = Store::open_in_memory().unwrap();
        let locid = store.add_locus(20, &"A".repeat(100), true).unwrap();
        assert!(store.add_variant(locid, 5, "AT").is_err());
        assert!(store.add_variant(locid, 5, "").is_err());
        assert!(store.add_variant(locid + 7, 5, "A").is_err());
    }

    #[test]
    fn test_flanking_counts() {
        let mut store = Store::open_in_memory().unwrap();
        let locid = store.add_locus(20, &"A".repeat(500), true).unwrap();
        let regid = store.add_region(&region_at(locid, 100, 150)).unwrap();
        let lonely = store.add_region(&region_at(locid, 400, 450)).unwrap();
        // inside the window: two SNP columns (one with two alleles) and one gap column
        store.add_variant(locid, 95, "A").unwrap();
        store.add_variant(locid, 120, "C").unwrap();
        store.add_variant(locid, 120, "G").unwrap();
        store.add_variant(locid, 155, "-").unwrap();
        // outside the window
        store.add_variant(locid, 94, "T").unwrap();
        store.add_variant(locid, 156, "N").unwrap();

        let counts = store.flanking_counts(5).unwrap();
        assert_eq!(counts[&regid], FlankCounts { snps: 2, bad: 1 });
        assert_eq!(counts[&lonely], FlankCounts::default());
    }

    #[test]
    fn test_passing_candidates_ordered() {
        let mut store = Store::open_in_memory().unwrap();
        let second = store.add_locus(20, &"A".repeat(500), true).unwrap();
        let first = store.add_locus(20, &"A".repeat(300), true).unwrap();
        store.add_region(&region_at(second, 200, 250)).unwrap();
        store.add_region(&region_at(second, 10, 60)).unwrap();
        store.add_region(&region_at(first, 30, 40)).unwrap();

        let candidates = store.passing_candidates().unwrap();
        let coords: Vec<(LocusId, i64)> = candidates.iter().map(|c| (c.locid, c.start)).collect();
        assert_eq!(coords, vec![(second, 10), (second, 200), (first, 30)]);
        assert_eq!(candidates[2].locus_length, 300);
        assert_eq!(store.max_locus_id().unwrap(), Some(first));
    }

    #[test]
    fn test_reopen_on_disk_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baits.db");
        {
            let mut store = Store::create(&path).unwrap();
            let locid = store.add_locus(10, "ACGTACGT", true).unwrap();
            store.add_region(&region_at(locid, 0, 4)).unwrap();
        }
        let store = Store::open(&path).unwrap();
        assert_eq!(store.count_loci().unwrap(), 1);
        assert_eq!(store.count_regions().unwrap(), 1);
    }

    #[test]
    fn test_open_without_schema_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.db");
        assert!(matches!(
            Store::open(&path),
            Err(BaitError::SchemaInit(_))
        ));
    }
}
