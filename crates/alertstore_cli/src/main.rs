//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `alertstore_core` linkage and a full repository round trip.
//! - Keep output deterministic for quick local sanity checks.

use alertstore_core::{CrudRepository, DbConfig, SessionFactory, State, StateInput};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    println!("alertstore_core ping={}", alertstore_core::ping());
    println!("alertstore_core version={}", alertstore_core::core_version());

    let factory = SessionFactory::new(DbConfig::in_memory())?;
    let mut uow = factory.session()?;
    let states = CrudRepository::<State>::new();

    let created = states.create(&mut uow, &StateInput::new("Kerala", 17))?;
    println!(
        "alertstore_core smoke state_id={} name={}",
        created.id, created.name
    );

    uow.close()?;
    Ok(())
}
