use ecs_memory_core::{FixedBitSet, IntKeyMap};

/// Tiny demonstration binary: not part of the tested contract, just a sanity
/// walkthrough of both primitives plus the capability tier they resolved to.
fn main() {
    env_logger::init();

    let tier = ecs_memory_core::bitset::capability_tier();
    log::info!("dispatch tier: {tier:?}");

    let mut transform_and_velocity = FixedBitSet::single(3);
    transform_and_velocity.add(&FixedBitSet::single(7));
    println!("components set: {}", transform_and_velocity);

    let mut entities: IntKeyMap<&'static str> = IntKeyMap::new();
    let player = entities.insert(1, "player").expect("1 is not a reserved key");
    entities.insert(2, "enemy").expect("2 is not a reserved key");
    println!("entity 1 => {}", entities.value_of(player));
    println!("entity count: {}", entities.count());
}
