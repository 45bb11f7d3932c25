//! Ad and purchase commands

use anyhow::Result;
use chrono::Utc;

use super::{report_pending, surface, Globals};

/// Grant the rewarded-ad payout
pub fn ad_command(globals: &Globals) -> Result<()> {
    let mut session = globals.open_session()?;
    let snapshot = session.on_ad_rewarded(Utc::now());
    println!(
        "Ad reward granted: {} gems, {} energy",
        snapshot.gems, snapshot.energy
    );
    report_pending(&session);
    Ok(())
}

/// Credit a gem package, or list packages when none is given
pub fn buy_command(globals: &Globals, package_id: Option<&str>) -> Result<()> {
    let mut session = globals.open_session()?;

    let Some(package_id) = package_id else {
        println!("Packages:\n");
        for (id, package) in &session.config().package {
            println!(
                "  {:<12} {:>6} gems  {}",
                id, package.gem_amount, package.price_label
            );
        }
        return Ok(());
    };

    let snapshot = session.purchase(package_id).map_err(surface)?;
    println!("Purchased {} ({} gems now)", package_id, snapshot.gems);
    report_pending(&session);
    Ok(())
}
