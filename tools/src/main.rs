//! desk-runner: headless driver for the Tourney Desk core.
//!
//! Usage:
//!   desk-runner --db desk.db --seed-demo
//!   desk-runner --db desk.db --preview spring-open
//!   desk-runner --db desk.db --commit spring-open --hash <hash>
//!   desk-runner --db desk.db --preview-round spring-open --round 2 --seats 1-4
//!   desk-runner --db desk.db --revert <batch-id>

use anyhow::{bail, Result};
use chrono::Utc;
use tourneydesk_core::{
    allocator::CatalogItem,
    config::DeskConfig,
    desk::PrizeDesk,
    store::DeskStore,
};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let db = str_arg(&args, "--db").unwrap_or(":memory:");
    let config = match str_arg(&args, "--config") {
        Some(path) => DeskConfig::load(path)?,
        None => DeskConfig::default(),
    };

    let store = if db == ":memory:" {
        DeskStore::in_memory()?
    } else {
        DeskStore::open(db)?
    };
    store.migrate()?;
    log::info!("desk ready on {db}");
    let desk = PrizeDesk::new(store, config);

    if args.iter().any(|a| a == "--seed-demo") {
        seed_demo(&desk)?;
        println!("{}", serde_json::json!({ "seeded": "spring-open" }));
        return Ok(());
    }

    if let Some(scope) = str_arg(&args, "--preview") {
        let outcome = desk.preview(scope)?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if let Some(event) = str_arg(&args, "--preview-round") {
        let round: u32 = str_arg(&args, "--round").unwrap_or("1").parse()?;
        let seats: Vec<u32> = str_arg(&args, "--seats")
            .unwrap_or("1")
            .split('-')
            .map(|s| s.parse())
            .collect::<Result<_, _>>()?;
        let outcome = desk.preview_round(event, round, &seats)?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if let Some(scope) = str_arg(&args, "--commit") {
        let Some(hash) = str_arg(&args, "--hash") else {
            bail!("--commit requires --hash <preview hash>");
        };
        let outcome = desk.commit(scope, hash)?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if let Some(batch_id) = str_arg(&args, "--revert") {
        let reverted = desk.revert(batch_id)?;
        println!("{}", serde_json::json!({ "batch_id": batch_id, "reverted": reverted }));
        return Ok(());
    }

    bail!("nothing to do; see the usage comment at the top of main.rs");
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// One 8-player event with a three-tier catalog, enough to walk the
/// whole preview/commit loop by hand.
fn seed_demo(desk: &PrizeDesk) -> Result<()> {
    let store = desk.store();
    store.insert_event(
        "spring-open",
        "Spring Open",
        15.0,
        0.0,
        &Utc::now().to_rfc3339(),
    )?;

    let players = [
        "Mori", "Adler", "Quint", "Sable", "Ferro", "Lark", "Voss", "Pim",
    ];
    for (i, player) in players.iter().enumerate() {
        store.insert_roster_entry("spring-open", player, (i + 1) as u32)?;
    }

    let catalog = [
        ("box-premium", "Premium Box", 3, 18.0, 6.0, 4),
        ("deck-alt", "Alt-Art Deck", 2, 9.0, 4.0, 6),
        ("sleeves", "Sleeve Pack", 1, 4.0, 2.0, 12),
        ("promo-pack", "Promo Pack", 1, 2.5, 1.5, 20),
    ];
    for (code, name, level, cogs, ev, stock) in catalog {
        store.upsert_catalog_item(&CatalogItem {
            code: code.into(),
            name: name.into(),
            level,
            cogs,
            expected_value: ev,
            stock,
            eligible_round: true,
            eligible_end: true,
            min_player_threshold: 0,
        })?;
    }
    Ok(())
}
