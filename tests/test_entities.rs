use signage_backdrop::entities::*;

#[test]
fn entity_clone_and_eq() {
    assert_eq!(Mode::Combat, Mode::Combat);
    assert_ne!(Mode::Normal, Mode::Broken);
    assert_eq!(Mode::Broken.as_str(), "broken");
    assert_eq!("Combat".parse::<Mode>(), Ok(Mode::Combat));
    assert!("cruise".parse::<Mode>().is_err());

    let pose = Pose { position: Vec2::new(1.0, 2.0), angle: 45.0 };
    assert_eq!(pose, pose.clone());
}

#[test]
fn ship_clone_is_independent() {
    let original = Ship {
        position: Vec2::new(10.0, 20.0),
        velocity: Vec2::new(1.0, 0.0),
        angle: 0.0,
        active: true,
        timer: 3.0,
        scale: 2,
        mode: Mode::Combat,
    };
    let mut cloned = original.clone();

    // Mutating the clone must not affect the original
    cloned.position.x = 99.0;
    cloned.scale = 4;
    cloned.active = false;

    assert_eq!(original.position.x, 10.0);
    assert_eq!(original.scale, 2);
    assert!(original.active);
    assert_eq!(original.pose().angle, 0.0);
}

#[test]
fn defaults_start_idle_and_parked() {
    let ship = Ship::default();
    assert!(!ship.active);
    assert_eq!(ship.scale, 1);

    let alien = Alien::default();
    assert!(!alien.active);
    assert_eq!(alien.position, Vec2::new(PARKED_COORD, PARKED_COORD));
    assert_eq!(alien.position, parked_position());
}

#[test]
fn viewport_centre() {
    let vp = Viewport::new(800, 480);
    assert_eq!(vp.center(), Vec2::new(400.0, 240.0));
}

#[test]
fn hex_colours() {
    assert_eq!(Rgba::from_hex("#60c494"), Some(Rgba::rgb(0x60, 0xc4, 0x94)));
    assert_eq!(Rgba::from_hex("60c494"), None);
    assert_eq!(Rgba::from_hex("#fff"), None);
    assert_eq!(Rgba::from_hex("#zzzzzz"), None);
}

#[test]
fn opacity_scales_alpha_only() {
    let c = Rgba::rgb(10, 20, 30).with_opacity(0.5);
    assert_eq!((c.r, c.g, c.b), (10, 20, 30));
    assert_eq!(c.a, 128);
    assert_eq!(Rgba::WHITE.with_opacity(2.0).a, 255);
    assert_eq!(Rgba::WHITE.with_opacity(-1.0).a, 0);
}
