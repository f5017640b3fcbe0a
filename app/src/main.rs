//! Demo game loop exercising the full ECS pipeline: movement, AABB
//! collision detection, and a damage handler that destroys entities
//! through the event bus.

use log::{Level, LevelFilter, Metadata, Record, info};

use ember_engine::ecs::{
    Context, Entity, Error, Event, EventBus, Registry, Signature, System, component,
};

/// Console logger that prints level-prefixed lines to stdout.
struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            println!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

// ---------------- components ----------------

#[derive(Default, Debug, Clone, Copy)]
struct Transform {
    x: f32,
    y: f32,
}

#[derive(Default, Debug, Clone, Copy)]
struct Rigidbody {
    vx: f32,
    vy: f32,
}

#[derive(Default, Debug, Clone, Copy)]
struct BoxCollider {
    width: f32,
    height: f32,
}

#[derive(Debug, Clone, Copy)]
struct Health {
    points: i32,
}

impl Default for Health {
    fn default() -> Self {
        Self { points: 100 }
    }
}

// ---------------- events ----------------

/// Emitted once per overlapping pair, per frame.
struct CollisionEvent {
    a: Entity,
    b: Entity,
}

impl Event for CollisionEvent {}

// ---------------- systems ----------------

/// Integrates position by velocity each frame.
#[derive(Default)]
struct MovementSystem;

impl System for MovementSystem {
    fn requirements(types: &component::Registry) -> Result<Signature, Error> {
        Signature::new()
            .require::<Transform>(types)?
            .require::<Rigidbody>(types)
    }

    fn update(&mut self, ctx: Context<'_>) {
        for &entity in ctx.entities {
            let velocity = match ctx.registry.get_component::<Rigidbody>(entity) {
                Ok(velocity) => *velocity,
                Err(_) => continue,
            };
            if let Ok(transform) = ctx.registry.get_component_mut::<Transform>(entity) {
                transform.x += velocity.vx * ctx.delta;
                transform.y += velocity.vy * ctx.delta;
            }
        }
    }
}

/// Tests every pair of collidable entities for AABB overlap and emits a
/// [`CollisionEvent`] for each hit.
#[derive(Default)]
struct CollisionSystem;

impl CollisionSystem {
    fn aabb(registry: &Registry, entity: Entity) -> Option<(f32, f32, f32, f32)> {
        let transform = registry.get_component::<Transform>(entity).ok()?;
        let collider = registry.get_component::<BoxCollider>(entity).ok()?;
        Some((transform.x, transform.y, collider.width, collider.height))
    }

    fn overlaps(a: (f32, f32, f32, f32), b: (f32, f32, f32, f32)) -> bool {
        a.0 < b.0 + b.2 && a.0 + a.2 > b.0 && a.1 < b.1 + b.3 && a.1 + a.3 > b.1
    }
}

impl System for CollisionSystem {
    fn requirements(types: &component::Registry) -> Result<Signature, Error> {
        Signature::new()
            .require::<Transform>(types)?
            .require::<BoxCollider>(types)
    }

    fn update(&mut self, ctx: Context<'_>) {
        for (i, &a) in ctx.entities.iter().enumerate() {
            for &b in &ctx.entities[i + 1..] {
                let (Some(box_a), Some(box_b)) = (
                    Self::aabb(ctx.registry, a),
                    Self::aabb(ctx.registry, b),
                ) else {
                    continue;
                };
                if Self::overlaps(box_a, box_b) {
                    info!("collision between {} and {}", a.index(), b.index());
                    ctx.events.emit(ctx.registry, CollisionEvent { a, b });
                }
            }
        }
    }
}

fn apply_damage(registry: &mut Registry, entity: Entity, amount: i32) {
    let Ok(health) = registry.get_component_mut::<Health>(entity) else {
        return;
    };
    health.points -= amount;
    if health.points <= 0 {
        info!("entity {} destroyed by damage", entity.index());
        registry.destroy_entity(entity);
    }
}

fn main() -> Result<(), Error> {
    log::set_boxed_logger(Box::new(ConsoleLogger)).ok();
    log::set_max_level(LevelFilter::Info);

    let mut registry = Registry::new();
    let mut events = EventBus::new();

    registry.add_system(MovementSystem)?;
    registry.add_system(CollisionSystem)?;

    // Each collision costs both participants 25 health.
    events.subscribe::<CollisionEvent, _>(|registry, _, event| {
        apply_damage(registry, event.a, 25);
        apply_damage(registry, event.b, 25);
    });

    // Two projectiles on a head-on course.
    let left = registry.create_entity();
    registry.add_component(left, Transform { x: 0.0, y: 0.0 })?;
    registry.add_component(left, Rigidbody { vx: 10.0, vy: 0.0 })?;
    registry.add_component(left, BoxCollider { width: 8.0, height: 8.0 })?;
    registry.add_component(left, Health { points: 50 })?;

    let right = registry.create_entity();
    registry.add_component(right, Transform { x: 100.0, y: 0.0 })?;
    registry.add_component(right, Rigidbody { vx: -10.0, vy: 0.0 })?;
    registry.add_component(right, BoxCollider { width: 8.0, height: 8.0 })?;
    registry.add_component(right, Health { points: 50 })?;

    // A bystander that never collides with anything.
    let bystander = registry.create_entity();
    registry.add_component(bystander, Transform { x: 0.0, y: 200.0 })?;
    registry.add_component(bystander, BoxCollider { width: 8.0, height: 8.0 })?;
    registry.add_component(bystander, Health::default())?;

    let delta = 1.0 / 60.0;
    for frame in 0..600 {
        registry.update();
        registry.run_system::<MovementSystem>(&mut events, delta)?;
        registry.run_system::<CollisionSystem>(&mut events, delta)?;

        if frame % 60 == 0 {
            if let Ok(transform) = registry.get_component::<Transform>(left) {
                info!(
                    "frame {:>3}: left projectile at ({:.1}, {:.1})",
                    frame, transform.x, transform.y
                );
            }
        }
    }

    info!(
        "simulation complete, bystander health: {}",
        registry.get_component::<Health>(bystander)?.points
    );
    Ok(())
}
