use std::sync::{Arc, Mutex};

use approx::assert_abs_diff_eq;
use hammer2d::{
    BodyId, HammerConfig, HammerError, HammerEvent, HammerInstance, MotionType, ShapeSettings,
    Vec2,
};

const DT: f32 = 1.0 / 60.0;

fn unit_box() -> ShapeSettings {
    ShapeSettings::sprite_box(Vec2::ZERO, Vec2::ONE)
}

fn add_sprite(instance: &HammerInstance, motion: MotionType, at: Vec2) -> BodyId {
    instance
        .interface()
        .create_and_add_body(unit_box(), motion, at, false)
        .expect("valid sprite")
}

fn add_floor(instance: &HammerInstance) -> BodyId {
    instance
        .interface()
        .create_and_add_body(
            ShapeSettings::tiles(vec![(Vec2::new(-10.0, 0.0), Vec2::new(10.0, 1.0))]),
            MotionType::Static,
            Vec2::ZERO,
            false,
        )
        .expect("valid tilemap")
}

fn record_events(instance: &HammerInstance) -> Arc<Mutex<Vec<HammerEvent>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    instance.on_contact_added(move |a, b| sink.lock().unwrap().push(HammerEvent::ContactAdded { a, b }));
    let sink = Arc::clone(&log);
    instance.on_contact_persisted(move |a, b| {
        sink.lock().unwrap().push(HammerEvent::ContactPersisted { a, b })
    });
    let sink = Arc::clone(&log);
    instance.on_contact_exit(move |a, b| sink.lock().unwrap().push(HammerEvent::ContactExit { a, b }));
    log
}

#[test]
fn falling_sprite_lands_on_tilemap() {
    let instance =
        HammerInstance::with_config(HammerConfig::default().with_gravity(100.0)).expect("valid config");
    add_floor(&instance);
    let player = add_sprite(&instance, MotionType::Dynamic, Vec2::new(0.0, 10.0));

    for _ in 0..120 {
        instance.simulate(DT);
    }

    let api = instance.interface();
    let position = api.position(player).unwrap();
    assert_abs_diff_eq!(position.y, 1.0, epsilon = 1e-4);
    assert_abs_diff_eq!(position.x, 0.0, epsilon = 1e-6);
    assert!(api.grounded(player).unwrap());
    assert_eq!(api.linear_velocity(player).unwrap().y, 0.0);
}

#[test]
fn resting_sprite_stays_put() {
    let instance = HammerInstance::new();
    add_floor(&instance);
    let player = add_sprite(&instance, MotionType::Dynamic, Vec2::new(2.0, 1.0));
    let tile_events = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&tile_events);
    instance.on_tilemap_contact_persisted(move |body| {
        assert_eq!(body, player);
        *counter.lock().unwrap() += 1;
    });

    for _ in 0..30 {
        instance.simulate(DT);
        let api = instance.interface();
        assert!(api.grounded(player).unwrap());
        assert_eq!(api.position(player).unwrap(), Vec2::new(2.0, 1.0));
    }
    assert_eq!(*tile_events.lock().unwrap(), 30);
}

#[test]
fn jump_leaves_and_returns_to_ground() {
    let instance =
        HammerInstance::with_config(HammerConfig::default().with_gravity(100.0)).expect("valid config");
    add_floor(&instance);
    let player = add_sprite(&instance, MotionType::Dynamic, Vec2::new(0.0, 1.0));
    let api = instance.interface();

    instance.simulate(DT);
    assert!(api.grounded(player).unwrap());

    api.add_force(player, Vec2::new(0.0, 20.0)).unwrap();
    instance.simulate(DT);
    assert!(!api.grounded(player).unwrap());
    assert!(api.position(player).unwrap().y > 1.0);

    let mut peak = 0.0f32;
    for _ in 0..600 {
        instance.simulate(DT);
        peak = peak.max(api.position(player).unwrap().y);
    }
    assert!(peak > 1.0);
    assert!(api.grounded(player).unwrap());
    assert_eq!(api.force(player).unwrap().y, 0.0);
    assert_abs_diff_eq!(api.position(player).unwrap().y, 1.0, epsilon = 1e-4);
}

#[test]
fn contact_lifecycle_is_reported_in_order() {
    let instance = HammerInstance::new();
    let a = add_sprite(&instance, MotionType::Static, Vec2::ZERO);
    let b = add_sprite(&instance, MotionType::Static, Vec2::new(0.5, 0.0));
    let log = record_events(&instance);

    for _ in 0..3 {
        instance.simulate(DT);
    }
    assert!(instance.world().is_touching(a, b));

    instance.interface().set_position(b, Vec2::new(5.0, 0.0)).unwrap();
    instance.simulate(DT);
    instance.simulate(DT);

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            HammerEvent::ContactAdded { a, b },
            HammerEvent::ContactPersisted { a, b },
            HammerEvent::ContactPersisted { a, b },
            HammerEvent::ContactExit { a, b },
        ]
    );
    assert_eq!(instance.world().contact_count(), 0);
}

#[test]
fn touching_edges_count_as_contact() {
    let instance = HammerInstance::new();
    let a = add_sprite(&instance, MotionType::Static, Vec2::ZERO);
    let b = add_sprite(&instance, MotionType::Static, Vec2::new(1.0, 0.0));
    instance.simulate(DT);
    assert!(instance.world().is_touching(a, b));

    let far = add_sprite(&instance, MotionType::Static, Vec2::new(1.5, 3.0));
    instance.simulate(DT);
    assert!(!instance.world().is_touching(a, far));
    assert!(!instance.world().is_touching(b, far));
}

#[test]
fn removing_a_body_ends_its_contacts() {
    let instance = HammerInstance::new();
    let a = add_sprite(&instance, MotionType::Static, Vec2::ZERO);
    let b = add_sprite(&instance, MotionType::Static, Vec2::new(0.5, 0.0));
    let log = record_events(&instance);

    instance.simulate(DT);
    instance.interface().remove_body(b).unwrap();
    instance.simulate(DT);
    instance.simulate(DT);

    assert_eq!(
        *log.lock().unwrap(),
        vec![HammerEvent::ContactAdded { a, b }, HammerEvent::ContactExit { a, b }]
    );
    assert!(matches!(
        instance.interface().position(b),
        Err(HammerError::BodyNotFound(id)) if id == b
    ));
    assert!(instance.interface().position(a).is_ok());
}

#[test]
fn subscribers_see_events_in_step_order() {
    let instance = HammerInstance::new();
    add_floor(&instance);
    let player = add_sprite(&instance, MotionType::Dynamic, Vec2::new(0.0, 1.0));
    let coin = instance
        .interface()
        .create_and_add_body(unit_box(), MotionType::Static, Vec2::new(0.5, 1.0), true)
        .unwrap();
    let rx = instance.subscribe();

    instance.simulate(DT);

    let events: Vec<_> = rx.try_iter().collect();
    assert_eq!(
        events,
        vec![
            HammerEvent::ContactAdded { a: player, b: coin },
            HammerEvent::TilemapContactPersisted { body: player },
        ]
    );
    assert_eq!(instance.interface().position(player).unwrap(), Vec2::new(0.0, 1.0));
}

#[test]
fn identical_worlds_stay_identical() {
    let build = |parallel: bool| {
        let config = HammerConfig::default().with_gravity(50.0).with_parallel(parallel);
        let instance = HammerInstance::with_config(config).expect("valid config");
        add_floor(&instance);
        for i in 0..12 {
            let x = -6.0 + i as f32;
            let id = add_sprite(&instance, MotionType::Dynamic, Vec2::new(x, 3.0 + (i % 4) as f32));
            instance
                .interface()
                .set_linear_velocity(id, Vec2::new(if i % 2 == 0 { 1.5 } else { -1.5 }, 0.0))
                .unwrap();
        }
        instance
    };

    let first = build(true);
    let second = build(false);
    for _ in 0..240 {
        first.simulate(DT);
        second.simulate(DT);
    }

    assert_eq!(first.world().snapshot(), second.world().snapshot());
}

#[test]
fn config_is_read_from_json() {
    let config = HammerConfig::from_json_str(r#"{ "gravity": 0.0, "default_mass": 1.5 }"#).unwrap();
    let instance = HammerInstance::with_config(config).unwrap();
    let id = add_sprite(&instance, MotionType::Dynamic, Vec2::new(0.0, 4.0));

    instance.simulate(DT);

    let api = instance.interface();
    assert_eq!(api.mass(id).unwrap(), 1.5);
    assert_eq!(api.position(id).unwrap(), Vec2::new(0.0, 4.0));
}
