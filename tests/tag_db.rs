use tagdex::{BoxId, Config, Database, ErrorKind, MAX_TAG_BYTES};
use tempfile::TempDir;

fn box_id(name: &str) -> BoxId {
    let mut bytes = [0u8; 32];
    for (i, b) in name.bytes().cycle().take(32).enumerate() {
        bytes[i] = b;
    }
    BoxId::new(bytes)
}

fn open_db(dir: &TempDir) -> Database {
    let config = Config {
        storage_path: dir.path().to_path_buf(),
        ..Config::default()
    };
    Database::open(config).unwrap()
}

const ALPHABET: [&str; 26] = [
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s",
    "t", "u", "v", "w", "x", "y", "z",
];

#[test]
fn tag_no_index() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    let b1 = box_id("1");

    assert!(db.tag_box(b1, "a").unwrap());

    // forward view is current
    assert_eq!(db.tag_count_for_box(b1), 1);
    assert_eq!(db.format_box_tags(b1, 0, 1).unwrap(), "a");

    // nothing is visible through the registry or reverse index yet
    assert!(!db.tag_exists("a"));
    assert_eq!(db.tag_count(), 0);
    assert_eq!(db.box_count_for_tag("a"), 0);
}

#[test]
fn tag_index_before() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    let b1 = box_id("1");

    db.index_box(b1).unwrap();
    db.tag_box(b1, "a").unwrap();

    // the index pass ran before the tag existed, so the tag stays
    // invisible until the box is indexed again
    assert!(!db.tag_exists("a"));
    assert_eq!(db.box_count_for_tag("a"), 0);

    db.index_box(b1).unwrap();

    assert!(db.tag_exists("a"));
    assert_eq!(db.format_box_tags(b1, 0, 1).unwrap(), "a");
    assert_eq!(db.box_at_for_tag("a", 0).unwrap(), b1);
}

#[test]
fn tag_index_after() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    let b1 = box_id("1");

    db.tag_box(b1, "a").unwrap();
    db.index_box(b1).unwrap();

    assert!(db.tag_exists("a"));
    assert_eq!(db.format_box_tags(b1, 0, 1).unwrap(), "a");
    assert_eq!(db.box_count_for_tag("a"), 1);
    assert_eq!(db.box_at_for_tag("a", 0).unwrap(), b1);
}

#[test]
fn lots_of_tags_then_index() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    let b1 = box_id("1");

    for tag in ALPHABET {
        assert!(db.tag_box(b1, tag).unwrap());
    }
    let receipt = db.index_box(b1).unwrap();

    assert_eq!(receipt.tags_indexed, 26);
    // one full pass over a 26-tag box must leave real budget headroom
    assert!(receipt.gas_used < db.config().call_budget / 2);

    assert_eq!(db.tag_count(), 26);
    assert_eq!(db.tag_count_for_box(b1), 26);
    for tag in ALPHABET {
        assert!(db.tag_exists(tag), "expected tag `{}` not found", tag);
        assert_eq!(db.box_count_for_tag(tag), 1);
        assert_eq!(db.box_at_for_tag(tag, 0).unwrap(), b1);
    }

    let csv = db.format_tags(0, db.tag_count()).unwrap();
    let listed: Vec<&str> = csv.split(',').collect();
    for tag in ALPHABET {
        assert!(listed.contains(&tag), "tag `{}` missing from ({})", tag, csv);
    }
}

#[test]
fn attach_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    let b1 = box_id("1");

    assert!(db.tag_box(b1, "a").unwrap());
    assert!(!db.tag_box(b1, "a").unwrap());
    assert_eq!(db.tag_count_for_box(b1), 1);
}

#[test]
fn invalid_tags_are_rejected() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    let b1 = box_id("1");

    assert_eq!(
        db.tag_box(b1, "").unwrap_err().kind,
        ErrorKind::InvalidInput
    );
    let oversized = "x".repeat(MAX_TAG_BYTES + 1);
    assert_eq!(
        db.tag_box(b1, &oversized).unwrap_err().kind,
        ErrorKind::InvalidInput
    );
    assert_eq!(db.tag_count_for_box(b1), 0);
}

#[test]
fn capacity_cap_is_enforced() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        storage_path: dir.path().to_path_buf(),
        max_tags_per_box: 3,
        ..Config::default()
    };
    let db = Database::open(config).unwrap();
    let b1 = box_id("1");

    for tag in ["a", "b", "c"] {
        db.tag_box(b1, tag).unwrap();
    }
    assert_eq!(db.tag_box(b1, "d").unwrap_err().kind, ErrorKind::Capacity);
    assert_eq!(db.tag_count_for_box(b1), 3);
    // re-attaching an existing tag at the cap is still an idempotent no-op
    assert!(!db.tag_box(b1, "a").unwrap());
}

#[test]
fn shrunken_budget_fails_indexing_without_side_effects() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        storage_path: dir.path().to_path_buf(),
        call_budget: 50_000, // enough for attaches, not for a 5-tag pass
        ..Config::default()
    };
    let db = Database::open(config).unwrap();
    let b1 = box_id("1");

    for tag in ["a", "b", "c", "d", "e"] {
        db.tag_box(b1, tag).unwrap();
    }
    assert_eq!(db.index_box(b1).unwrap_err().kind, ErrorKind::OutOfGas);
    assert_eq!(db.tag_count(), 0);
    assert!(!db.tag_exists("a"));
}

#[test]
fn windowed_reads_match_itemwise_reads() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    let b1 = box_id("1");

    for tag in ALPHABET {
        db.tag_box(b1, tag).unwrap();
    }
    db.index_box(b1).unwrap();

    let window = db.tags_for_box(b1, 0, db.tag_count_for_box(b1)).unwrap();
    let itemwise: Vec<_> = (0..db.tag_count_for_box(b1))
        .map(|i| db.tag_at_for_box(b1, i).unwrap())
        .collect();
    assert_eq!(window, itemwise);

    let registry_window = db.tags(0, db.tag_count()).unwrap();
    let registry_itemwise: Vec<_> = (0..db.tag_count()).map(|i| db.tag_at(i).unwrap()).collect();
    assert_eq!(registry_window, registry_itemwise);
}

#[test]
fn out_of_range_reads_fail() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    let b1 = box_id("1");

    db.tag_box(b1, "a").unwrap();
    db.index_box(b1).unwrap();

    assert_eq!(db.tag_at(1).unwrap_err().kind, ErrorKind::OutOfRange);
    assert_eq!(
        db.tag_at_for_box(b1, 1).unwrap_err().kind,
        ErrorKind::OutOfRange
    );
    assert_eq!(
        db.box_at_for_tag("a", 1).unwrap_err().kind,
        ErrorKind::OutOfRange
    );
    assert_eq!(db.tags(1, 1).unwrap_err().kind, ErrorKind::OutOfRange);
    assert_eq!(
        db.tags_for_box(b1, 5, 1).unwrap_err().kind,
        ErrorKind::OutOfRange
    );

    // count past the end clamps rather than failing
    assert_eq!(db.tags_for_box(b1, 0, 100).unwrap().len(), 1);
    // a window over an untagged box reads as empty
    assert!(db.tags_for_box(box_id("2"), 0, 10).unwrap().is_empty());
}

#[test]
fn csv_formatters_agree_with_windows() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    let (b1, b2) = (box_id("1"), box_id("2"));

    for tag in ["x", "y", "z"] {
        db.tag_box(b1, tag).unwrap();
    }
    db.tag_box(b2, "x").unwrap();
    db.index_box(b1).unwrap();
    db.index_box(b2).unwrap();

    assert_eq!(db.format_box_tags(b1, 0, 3).unwrap(), "x,y,z");
    assert_eq!(db.format_box_tags(b1, 1, 2).unwrap(), "y,z");

    let boxes_csv = db.format_tag_boxes("x", 0, 2).unwrap();
    assert_eq!(
        boxes_csv,
        format!("{},{}", b1.to_hex(), b2.to_hex())
    );
}
