use migratory::errors::MigratoryResult;
use migratory::migration::{MigrationRecord, OpOptions, RawAction};
use migratory::storage::JsonStorageModule;
use migratory::Migratory;
use migratory_int_test::test_util::{cleanup, random_path};

fn main() -> MigratoryResult<()> {
    println!("Starting stress test...");
    let storage_path = random_path();

    let count = 1000;
    let records = (0..count)
        .map(|i| {
            MigrationRecord::new(&format!("{:08}-noop.js", i))
                .up(RawAction::ready(|_params| Ok(())))
                .down(RawAction::ready(|_params| Ok(())))
        })
        .collect::<Vec<_>>();

    let migratory = Migratory::builder()
        .migrations(records)
        .storage_module(JsonStorageModule::new(&storage_path))
        .build()?;

    let start = std::time::Instant::now();
    let applied = migratory.up(OpOptions::default())?;
    let elapsed = start.elapsed();
    println!("Applied {} migrations in {:?}", applied.len(), elapsed);

    let start = std::time::Instant::now();
    let reverted = migratory.down(OpOptions::default().all())?;
    let elapsed = start.elapsed();
    println!("Reverted {} migrations in {:?}", reverted.len(), elapsed);

    cleanup(&storage_path);
    Ok(())
}
