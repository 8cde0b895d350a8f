use cucumber::given;

use crate::cucumber::{world::GatewaySystem, GatewayWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut GatewayWorld) {
    let system = GatewaySystem::new().await;
    world.system = Some(system);
}
