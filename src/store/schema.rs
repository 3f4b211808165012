pub const TABLES: [&str; 3] = ["loci", "regions", "variants"];

pub const DROP_TABLES: &str = r#"
    DROP TABLE IF EXISTS variants;
    DROP TABLE IF EXISTS regions;
    DROP TABLE IF EXISTS loci;
"#;

pub const CREATE_TABLES: &str = r#"
    CREATE TABLE loci (
        id INTEGER PRIMARY KEY,
        depth INTEGER NOT NULL,
        length INTEGER NOT NULL,
        consensus TEXT NOT NULL,
        pass INTEGER NOT NULL
    );

    CREATE TABLE regions (
        regid INTEGER PRIMARY KEY,
        locid INTEGER NOT NULL REFERENCES loci(id),
        length INTEGER NOT NULL,
        sequence TEXT NOT NULL,
        vars INTEGER NOT NULL,
        bad INTEGER NOT NULL,
        gap INTEGER NOT NULL,
        start INTEGER NOT NULL,
        stop INTEGER NOT NULL,
        pass INTEGER NOT NULL
    );

    CREATE TABLE variants (
        varid INTEGER PRIMARY KEY,
        locid INTEGER NOT NULL REFERENCES loci(id),
        "column" INTEGER NOT NULL,
        value TEXT NOT NULL,
        UNIQUE (locid, "column", value)
    );

    CREATE INDEX regions_by_locus ON regions(locid, start, stop);
    CREATE INDEX variants_by_locus ON variants(locid, "column");
"#;
