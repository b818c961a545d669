//! End-to-end scenarios driving the runtime the way a host loop would.

use reclaim_content::ContentBundle;
use reclaim_core::{
    Actor, ActorId, BuildCostTable, CostEntry, CurrencyOverride, DenyReason, DisableReason,
    Entity, EntityId, EntityKind, Inventory, ItemCatalog, ItemDefinition, ItemStack,
    Permissions, Position, PriceEntry, ReclaimConfig, SessionMode, SessionParams, StructureId,
    SweepFilter, SweepKind, SweepRequest, Timestamp, WorldState,
};
use reclaim_runtime::{
    CommandOutcome, Event, RaidEvent, RemovalEvent, Runtime, RuntimeConfig, RuntimeError,
    SessionEvent, SweepEvent, Topic,
};

const OWNER: ActorId = ActorId(1);
const RAIDER: ActorId = ActorId(2);
const ADMIN: ActorId = ActorId(9);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn crate_box(id: u64) -> Entity {
    Entity::new(
        EntityId(id),
        "box.wooden.large",
        EntityKind::Storage,
        Position::new(0.0, 0.0, 1.0),
        Timestamp::ZERO,
    )
    .with_owner(OWNER)
    .with_item("box.wooden.large")
}

fn wall(id: u64, x: f32) -> Entity {
    Entity::new(
        EntityId(id),
        "wall",
        EntityKind::BuildingBlock,
        Position::new(x, 0.0, 1.0),
        Timestamp::ZERO,
    )
    .with_owner(OWNER)
    .with_structure(StructureId(7))
}

fn world(inventory: Inventory) -> WorldState {
    let mut world = WorldState::new();
    world.insert_actor(Actor::new(OWNER, Position::ORIGIN).with_inventory(inventory));
    world.insert_actor(Actor::new(RAIDER, Position::new(5.0, 0.0, 0.0)));
    world.insert_actor(
        Actor::new(ADMIN, Position::new(0.0, 40.0, 0.0)).with_permissions(Permissions::all()),
    );
    world
}

fn priced_runtime(inventory: Inventory) -> Runtime {
    let mut config = ReclaimConfig::default();
    config.pricing.entries.insert(
        "box.wooden.large".into(),
        PriceEntry {
            price: vec![CostEntry::new("scrap", 50.0)],
            refund: vec![CostEntry::new("box.wooden.large", 1.0)],
        },
    );
    let mut world = world(inventory);
    world.insert_entity(crate_box(10));

    Runtime::builder()
        .world(world)
        .content(ContentBundle {
            config,
            items: ItemCatalog::new()
                .with(ItemDefinition::new("scrap", "Scrap", 1000))
                .with(ItemDefinition::new("box.wooden.large", "Large Wood Box", 1)),
            costs: BuildCostTable::new(),
        })
        .build()
}

fn free(mode: SessionMode, duration: f64) -> SessionParams {
    SessionParams::new(mode, duration).with_payment(false, false)
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

#[test]
fn paid_removal_charges_refunds_and_reports() {
    init_tracing();
    let mut runtime = priced_runtime(Inventory::from_stacks([ItemStack::new("scrap", 80)]));
    let mut removals = runtime.subscribe(Topic::Removal);

    runtime
        .activate(OWNER, SessionParams::new(SessionMode::Normal, 60.0))
        .unwrap();
    let outcome = runtime.trigger_removal(OWNER, Some(EntityId(10))).unwrap();

    assert_eq!(outcome, CommandOutcome::Success);
    assert!(runtime.world().entity(EntityId(10)).is_none());
    let owner = runtime.world().actor(OWNER).unwrap();
    assert_eq!(owner.inventory.count("scrap"), 30);
    assert_eq!(owner.inventory.count("box.wooden.large"), 1);

    let events = drain(&mut removals);
    assert!(matches!(
        events.as_slice(),
        [Event::Removal(RemovalEvent::Removed { entity: EntityId(10), charged, .. })]
            if charged == &vec![CostEntry::new("scrap", 50.0)]
    ));
    assert_eq!(runtime.sessions().get(OWNER).unwrap().removed(), 1);
}

#[test]
fn refused_refund_credit_is_reported() {
    struct NoRefunds;
    impl CurrencyOverride for NoRefunds {}

    let mut config = ReclaimConfig::default();
    config.pricing.entries.insert(
        "box.wooden.large".into(),
        PriceEntry {
            price: vec![CostEntry::new("scrap", 50.0)],
            refund: vec![CostEntry::new("tokens", 5.0)],
        },
    );
    let mut world = world(Inventory::from_stacks([ItemStack::new("scrap", 80)]));
    world.insert_entity(crate_box(10));
    let mut runtime = Runtime::builder()
        .world(world)
        .content(ContentBundle {
            config,
            items: ItemCatalog::new().with(ItemDefinition::new("scrap", "Scrap", 1000)),
            costs: BuildCostTable::new(),
        })
        .currency_override(NoRefunds)
        .build();
    let mut removals = runtime.subscribe(Topic::Removal);
    runtime
        .activate(OWNER, SessionParams::new(SessionMode::Normal, 60.0))
        .unwrap();

    let outcome = runtime.trigger_removal(OWNER, Some(EntityId(10))).unwrap();

    assert_eq!(outcome, CommandOutcome::Success);
    let events = drain(&mut removals);
    assert!(matches!(
        events.as_slice(),
        [Event::Removal(RemovalEvent::Removed { credited, failed, .. })]
            if credited.is_empty() && failed == &vec![CostEntry::new("tokens", 5.0)]
    ));
}

#[test]
fn unaffordable_removal_changes_nothing() {
    let mut runtime = priced_runtime(Inventory::empty());
    runtime
        .activate(OWNER, SessionParams::new(SessionMode::Normal, 60.0))
        .unwrap();
    let before = runtime.world().clone();

    let outcome = runtime.trigger_removal(OWNER, Some(EntityId(10))).unwrap();

    assert_eq!(
        outcome,
        CommandOutcome::InsufficientFunds(vec![CostEntry::new("scrap", 50.0)])
    );
    assert_eq!(runtime.world(), &before);
    let session = runtime.sessions().get(OWNER).unwrap();
    assert!(session.is_active());
    assert_eq!(session.removed(), 0);
}

#[test]
fn second_whole_area_sweep_is_rejected_while_first_runs() {
    init_tracing();
    let mut world = world(Inventory::empty());
    for (i, x) in [0.0, 2.0, 4.0, 6.0, 8.0].into_iter().enumerate() {
        world.insert_entity(wall(20 + i as u64, x));
    }
    let mut runtime = Runtime::builder().world(world).build();
    let mut sweeps = runtime.subscribe(Topic::Sweep);

    let request = SweepRequest::WholeArea {
        origin: Position::new(0.0, 0.0, 1.0),
        filter: SweepFilter::any(),
    };
    assert_eq!(
        runtime.start_sweep(ADMIN, request.clone()).unwrap(),
        CommandOutcome::SweepStarted(SweepKind::WholeArea)
    );
    assert_eq!(
        runtime.start_sweep(ADMIN, request).unwrap(),
        CommandOutcome::AlreadyRunning(SweepKind::WholeArea)
    );

    for _ in 0..20 {
        if runtime.active_sweeps() == 0 {
            break;
        }
        runtime.tick(0.1);
    }
    assert_eq!(runtime.active_sweeps(), 0);
    assert_eq!(runtime.world().entity_count(), 0);

    let events = drain(&mut sweeps);
    assert_eq!(
        events.last(),
        Some(&Event::Sweep(SweepEvent::Completed {
            requester: ADMIN,
            kind: SweepKind::WholeArea,
            discovered: 5,
            removed: 5,
            disposed_stacks: 0,
            cancelled: false,
        }))
    );
    assert!(events.contains(&Event::Sweep(SweepEvent::Rejected {
        requester: ADMIN,
        kind: SweepKind::WholeArea,
    })));
}

#[test]
fn cancelled_sweep_reports_cancellation() {
    let mut world = world(Inventory::empty());
    world.insert_entity(wall(20, 0.0));
    let mut runtime = Runtime::builder().world(world).build();
    let mut sweeps = runtime.subscribe(Topic::Sweep);

    runtime
        .start_sweep(ADMIN, SweepRequest::ConnectedStructure { seed: EntityId(20) })
        .unwrap();
    assert!(runtime.cancel_sweep(SweepKind::ConnectedStructure));
    runtime.tick(0.1);

    assert_eq!(runtime.active_sweeps(), 0);
    assert!(runtime.world().entity(EntityId(20)).is_some());
    let cancelled = drain(&mut sweeps).into_iter().any(|event| {
        matches!(
            event,
            Event::Sweep(SweepEvent::Completed {
                cancelled: true,
                ..
            })
        )
    });
    assert!(cancelled);
}

#[test]
fn sweeps_need_the_matching_permission() {
    let mut world = world(Inventory::empty());
    world.insert_entity(wall(20, 0.0));
    let mut runtime = Runtime::builder().world(world).build();

    let err = runtime
        .start_sweep(OWNER, SweepRequest::ExternalSurface { seed: EntityId(20) })
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::SweepNotPermitted {
            actor: OWNER,
            kind: SweepKind::ExternalSurface
        }
    ));
}

#[test]
fn raid_damage_blocks_removal_until_window_passes() {
    init_tracing();
    let mut world = world(Inventory::empty());
    world.insert_entity(wall(30, 1.0));
    let mut runtime = Runtime::builder().world(world).build();
    let mut raids = runtime.subscribe(Topic::Raid);

    let record = runtime.record_damage(RAIDER, EntityId(30));
    assert_eq!(record.structure, Some(StructureId(7)));
    assert!(record.actors.contains(&OWNER));
    assert!(matches!(
        drain(&mut raids).as_slice(),
        [Event::Raid(RaidEvent::Blocked { .. })]
    ));

    runtime
        .activate(OWNER, free(SessionMode::Normal, 1000.0))
        .unwrap();
    let outcome = runtime.trigger_removal(OWNER, Some(EntityId(30))).unwrap();
    assert_eq!(
        outcome,
        CommandOutcome::NotAuthorized(DenyReason::RaidBlocked { remaining_secs: 300 })
    );

    runtime.tick(300.1);
    let outcome = runtime.trigger_removal(OWNER, Some(EntityId(30))).unwrap();
    assert_eq!(outcome, CommandOutcome::Success);
}

#[test]
fn raid_entries_are_pruned_on_the_configured_period() {
    let mut world = world(Inventory::empty());
    world.insert_entity(wall(30, 1.0));
    let mut config = RuntimeConfig::default();
    config.reclaim.raid_block.prune_interval = 10.0;
    config.reclaim.raid_block.duration = 5.0;
    let mut runtime = Runtime::builder().config(config).world(world).build();
    let mut raids = runtime.subscribe(Topic::Raid);

    runtime.record_damage(RAIDER, EntityId(30));
    runtime.tick(10.0);

    let events = drain(&mut raids);
    assert!(events.iter().any(|event| matches!(
        event,
        Event::Raid(RaidEvent::Pruned { removed }) if *removed > 0
    )));
    assert!(runtime.engine().raid().is_empty());
}

#[test]
fn last_use_ends_the_session() {
    let mut world = world(Inventory::empty());
    world.insert_entity(crate_box(10));
    world.insert_entity(crate_box(11));
    let mut runtime = Runtime::builder().world(world).build();
    let mut sessions = runtime.subscribe(Topic::Session);

    runtime
        .activate(OWNER, free(SessionMode::Normal, 60.0).with_max_count(1))
        .unwrap();
    let outcome = runtime.trigger_removal(OWNER, Some(EntityId(10))).unwrap();

    assert_eq!(outcome, CommandOutcome::LimitReached);
    assert!(runtime.sessions().get(OWNER).is_none());
    assert!(matches!(
        runtime.trigger_removal(OWNER, Some(EntityId(11))),
        Err(RuntimeError::Removal(_))
    ));

    let events = drain(&mut sessions);
    assert_eq!(
        events.last(),
        Some(&Event::Session(SessionEvent::Ended {
            actor: OWNER,
            reason: DisableReason::LimitReached,
            removed: 1,
        }))
    );
}

#[test]
fn sessions_time_out_on_tick() {
    let mut runtime = Runtime::builder().world(world(Inventory::empty())).build();
    let mut sessions = runtime.subscribe(Topic::Session);

    runtime.activate(OWNER, free(SessionMode::Normal, 5.0)).unwrap();
    runtime.tick(2.0);
    assert!(runtime.sessions().get(OWNER).is_some());
    runtime.tick(4.0);
    assert!(runtime.sessions().get(OWNER).is_none());

    let events = drain(&mut sessions);
    assert_eq!(
        events,
        vec![
            Event::Session(SessionEvent::Activated {
                actor: OWNER,
                mode: SessionMode::Normal,
                duration: 5.0,
            }),
            Event::Session(SessionEvent::Ended {
                actor: OWNER,
                reason: DisableReason::Timeout,
                removed: 0,
            }),
        ]
    );
}

#[test]
fn deactivating_without_a_session_is_an_error() {
    let mut runtime = Runtime::builder().world(world(Inventory::empty())).build();
    assert!(matches!(
        runtime.deactivate(OWNER),
        Err(RuntimeError::Session(_))
    ));

    runtime.activate(OWNER, free(SessionMode::Normal, 5.0)).unwrap();
    runtime.deactivate(OWNER).unwrap();
    assert!(runtime.sessions().is_empty());
}

#[test]
fn content_directory_configures_the_runtime() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(ContentBundle::CONFIG_FILE),
        "[session]\ncooldown = 45.0\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join(ContentBundle::ITEMS_FILE),
        "[[items]]\nkey = \"scrap\"\ndisplay_name = \"Scrap\"\nmax_stack = 1000\n",
    )
    .unwrap();

    let bundle = ContentBundle::load(dir.path()).unwrap();
    let runtime = Runtime::builder().content(bundle).build();

    assert_eq!(runtime.config().reclaim.session.cooldown, 45.0);
    assert_eq!(runtime.engine().config().session.cooldown, 45.0);
    assert_eq!(runtime.oracles().items().len(), 1);
}

#[test]
fn events_serialize_to_json() {
    let event = Event::Session(SessionEvent::Ended {
        actor: OWNER,
        reason: DisableReason::Replaced,
        removed: 3,
    });
    let json = serde_json::to_string(&event).unwrap();
    let back: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(back, event);
}
