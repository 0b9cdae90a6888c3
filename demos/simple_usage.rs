/// Tagdex API walkthrough
///
/// Demonstrates the full operation surface:
/// - Attaching tags (forward index, always current)
/// - Indexing a box (registry + reverse index, explicit and cost-bounded)
/// - Forward, registry and reverse queries
/// - CSV formatting and stats

use tagdex::{BoxId, Config, Database};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Tagdex - budget-metered box/tag index\n");

    // Step 1: Open the store
    println!("Opening store...");
    let dir = std::env::temp_dir().join("tagdex-demo");
    let config = Config {
        storage_path: dir,
        ..Config::default()
    };
    let db = Database::open(config)?;
    println!("Done!\n");

    // Step 2: ATTACH - forward index only
    println!("Step 2: ATTACH - tagging a box...");
    let shipment = BoxId::new([0x11; 32]);
    for tag in ["fragile", "express", "oversize"] {
        let newly = db.tag_box(shipment, tag)?;
        println!("  tag `{}`: newly added = {}", tag, newly);
    }
    println!("  forward view: {}", db.format_box_tags(shipment, 0, 3)?);
    println!("  tag_exists(\"fragile\") before indexing: {}\n", db.tag_exists("fragile"));

    // Step 3: INDEX - reconcile into registry + reverse index
    println!("Step 3: INDEX - one cost-bounded pass...");
    let receipt = db.index_box(shipment)?;
    println!(
        "  indexed {} tags for {} gas (budget {})",
        receipt.tags_indexed,
        receipt.gas_used,
        db.config().call_budget
    );
    println!("  tag_exists(\"fragile\") after indexing: {}\n", db.tag_exists("fragile"));

    // Step 4: QUERY - reverse lookups
    println!("Step 4: QUERY - which boxes carry `express`?");
    let count = db.box_count_for_tag("express");
    println!("  {} box(es): {}", count, db.format_tag_boxes("express", 0, count)?);
    println!("  registry: {}\n", db.format_tags(0, db.tag_count())?);

    // Step 5: Stats
    let stats = db.stats();
    println!("Step 5: STATS");
    println!("  boxes tracked:   {}", stats.boxes_tracked);
    println!("  tags registered: {}", stats.tags_registered);
    println!("  wal sequence:    {}", stats.wal_sequence);

    Ok(())
}
