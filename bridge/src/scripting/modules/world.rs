//! World API: the entity factory, per-entity metadata and the
//! `BaseObjectType` enum

use crate::core::entity::{BaseObjectType, EntityId, SharedWorld};
use crate::meta::{read_store, write_store};
use crate::scripting::trap::PropertyTrap;
use rhai::{Dynamic, Engine, EvalAltResult, ImmutableString, Module, INT};
use std::sync::Arc;
use tracing::debug;

fn entity_gone(id: EntityId) -> Box<EvalAltResult> {
    format!("{id} no longer exists").into()
}

/// Register the entity type and the world functions with an engine
pub fn register_world_api(engine: &mut Engine, world: &SharedWorld) {
    debug!("Registering world API");

    engine
        .register_type_with_name::<EntityId>("Entity")
        .register_get("id", |id: &mut EntityId| id.get() as INT)
        .register_fn("to_string", |id: &mut EntityId| id.to_string())
        .register_fn("to_debug", |id: &mut EntityId| id.to_string())
        .register_fn("==", |a: &mut EntityId, b: EntityId| *a == b)
        .register_fn("!=", |a: &mut EntityId, b: EntityId| *a != b);

    // Both stores are mounted through the property trap. The setters exist so
    // chained writes like `e.meta.health = 1` can write the getter result
    // back; the trap is a live view, so there is nothing to store.
    let w = world.clone();
    engine.register_get(
        "meta",
        move |id: &mut EntityId| -> Result<PropertyTrap, Box<EvalAltResult>> {
            let store = read_store(&w).meta(*id).ok_or_else(|| entity_gone(*id))?;
            Ok(PropertyTrap::new(store))
        },
    );
    engine.register_set("meta", |_: &mut EntityId, _: PropertyTrap| {});

    let w = world.clone();
    engine.register_get(
        "syncedMeta",
        move |id: &mut EntityId| -> Result<PropertyTrap, Box<EvalAltResult>> {
            let store = read_store(&w)
                .synced_meta(*id)
                .ok_or_else(|| entity_gone(*id))?;
            Ok(PropertyTrap::new(store))
        },
    );
    engine.register_set("syncedMeta", |_: &mut EntityId, _: PropertyTrap| {});

    let w = world.clone();
    engine.register_get(
        "kind",
        move |id: &mut EntityId| -> Result<String, Box<EvalAltResult>> {
            read_store(&w)
                .kind(*id)
                .map(|kind| kind.as_str().to_string())
                .ok_or_else(|| entity_gone(*id))
        },
    );

    let w = world.clone();
    engine.register_get("name", move |id: &mut EntityId| -> Dynamic {
        read_store(&w)
            .name(*id)
            .map(Dynamic::from)
            .unwrap_or(Dynamic::UNIT)
    });
    let w = world.clone();
    engine.register_set(
        "name",
        move |id: &mut EntityId, name: ImmutableString| -> Result<(), Box<EvalAltResult>> {
            if write_store(&w).set_name(*id, name.as_str()) {
                Ok(())
            } else {
                Err(entity_gone(*id))
            }
        },
    );

    let w = world.clone();
    engine.register_fn(
        "create_entity",
        move |kind: ImmutableString| -> Result<EntityId, Box<EvalAltResult>> {
            let kind = kind
                .parse::<BaseObjectType>()
                .map_err(|e| -> Box<EvalAltResult> { e.into() })?;
            Ok(write_store(&w).spawn(kind))
        },
    );

    let w = world.clone();
    engine.register_fn("entity", move |id: INT| -> Dynamic {
        if id < 0 {
            return Dynamic::UNIT;
        }
        let id = EntityId(id as u64);
        if read_store(&w).contains(id) {
            Dynamic::from(id)
        } else {
            Dynamic::UNIT
        }
    });

    let w = world.clone();
    engine.register_fn("destroy_entity", move |id: EntityId| write_store(&w).despawn(id));

    let w = world.clone();
    engine.register_fn("entities", move || -> rhai::Array {
        read_store(&w).entities().into_iter().map(Dynamic::from).collect()
    });

    register_enums(engine);
}

/// `BaseObjectType::VEHICLE` and `Enums::BaseObjectType::VEHICLE` both hold
/// the factory name of the kind
fn register_enums(engine: &mut Engine) {
    let mut kinds = Module::new();
    for kind in BaseObjectType::ALL {
        kinds.set_var(kind.constant_name(), kind.as_str().to_string());
    }
    let kinds = Arc::new(kinds);

    let mut enums = Module::new();
    enums.set_sub_module("BaseObjectType", kinds.clone());

    engine.register_static_module("BaseObjectType", kinds);
    engine.register_static_module("Enums", enums.into());
}
