use std::time::{Duration, Instant};

use signage_backdrop::backdrop::*;
use signage_backdrop::director::VignetteEvent;
use signage_backdrop::entities::*;
use signage_backdrop::projectiles::FireCadence;
use signage_backdrop::snapshot::{run_headless, write_png};

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

const SKY: Rgba = Rgba::rgb(24, 2, 6);

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn make_backdrop(rng: &mut StdRng) -> Backdrop {
    Backdrop::new(Viewport::new(320, 200), SKY, rng)
}

// ── FrameClock ────────────────────────────────────────────────────────────────

#[test]
fn first_frame_has_zero_delta() {
    let mut clock = FrameClock::new();
    assert_eq!(clock.tick(Instant::now()), 0.0);
}

#[test]
fn delta_is_measured_and_clamped() {
    let mut clock = FrameClock::new();
    let start = Instant::now();
    clock.tick(start);
    assert_relative_eq!(clock.tick(start + Duration::from_millis(40)), 0.04, epsilon = 1e-4);
    assert_eq!(clock.tick(start + Duration::from_secs(10)), MAX_FRAME_DELTA);
    // A timestamp from the past never yields a negative step.
    assert_eq!(clock.tick(start), 0.0);
}

// ── frame ─────────────────────────────────────────────────────────────────────

#[test]
fn frame_paints_the_themed_sky() {
    let mut rng = seeded_rng();
    let mut backdrop = make_backdrop(&mut rng);
    backdrop.frame(1.0 / 30.0, &mut rng);

    let out = backdrop.output();
    assert_eq!((out.width(), out.height()), (320, 200));
    let sky_pixels = (0..200)
        .flat_map(|y| (0..320).map(move |x| (x, y)))
        .filter(|&(x, y)| out.pixel(x, y) == Some(SKY))
        .count();
    assert!(sky_pixels > 320 * 200 / 2);
    assert!((0..200).all(|y| (0..320).all(|x| out.pixel(x, y).map_or(false, |p| p.a == 255))));
}

#[test]
fn forced_combat_draws_ship_alien_and_bullets() {
    let mut rng = seeded_rng();
    let mut backdrop = Backdrop::new(Viewport::new(800, 480), Rgba::rgb(0, 0, 0), &mut rng);
    let event = backdrop.force_spawn(Mode::Combat, &mut rng);
    assert!(matches!(event, VignetteEvent::Spawned { mode: Mode::Combat, .. }));
    assert_eq!(backdrop.projectiles().cadence(), &FireCadence::default());

    let mut saw_bullets = false;
    for _ in 0..60 {
        backdrop.frame(1.0 / 60.0, &mut rng);
        if !backdrop.director().is_active() {
            break;
        }
        saw_bullets |= !backdrop.projectiles().is_empty();
        assert!(backdrop.director().alien().active);
    }
    assert!(saw_bullets);
    assert!(!backdrop.particles().is_empty());
}

#[test]
fn broken_ships_leave_no_exhaust() {
    let mut rng = seeded_rng();
    let mut backdrop = make_backdrop(&mut rng);
    backdrop.force_spawn(Mode::Broken, &mut rng);
    for _ in 0..30 {
        backdrop.frame(1.0 / 30.0, &mut rng);
    }
    assert!(backdrop.particles().is_empty());
    assert!(backdrop.projectiles().is_empty());
}

#[test]
fn bullets_keep_flying_after_the_vignette_ends() {
    let mut rng = seeded_rng();
    let mut backdrop = make_backdrop(&mut rng);
    backdrop.force_spawn(Mode::Combat, &mut rng);

    // Run until the ship has fired and then left or expired.
    let mut frames = 0;
    while backdrop.director().is_active() || backdrop.projectiles().is_empty() {
        backdrop.frame(1.0 / 30.0, &mut rng);
        frames += 1;
        if frames > 30 * 60 {
            panic!("vignette never finished with bullets in flight");
        }
        if !backdrop.director().is_active() && backdrop.projectiles().is_empty() {
            backdrop.force_spawn(Mode::Combat, &mut rng);
        }
    }

    let dt = 0.1;
    let before = backdrop.projectiles().bullets().to_vec();
    backdrop.update_battle(dt, &mut StdRng::seed_from_u64(7));
    let after = backdrop.projectiles().bullets();
    assert!(!after.is_empty() || before.iter().all(|b| b.life <= dt));
    for b in after {
        let moved_on = before.iter().any(|old| {
            (old.life - dt - b.life).abs() < 1e-4
                && (old.position + old.velocity * dt - b.position).norm() < 1e-2
        });
        assert!(moved_on, "bullet {b:?} did not advance");
    }
}

#[test]
fn angle_step_is_at_least_one_degree() {
    let mut rng = seeded_rng();
    assert_eq!(make_backdrop(&mut rng).angle_step(), 3);
    assert_eq!(make_backdrop(&mut rng).with_angle_step(0).angle_step(), 1);
    assert_eq!(make_backdrop(&mut rng).with_angle_step(10).angle_step(), 10);
}

#[test]
fn straight_flight_reuses_one_rotation() {
    let mut rng = seeded_rng();
    let mut backdrop = make_backdrop(&mut rng);
    backdrop.force_spawn(Mode::Normal, &mut rng);
    for _ in 0..10 {
        backdrop.frame(1.0 / 30.0, &mut rng);
        if !backdrop.director().is_active() {
            break;
        }
    }
    // A normal ship keeps its spawn heading, so every frame hits one entry.
    assert_eq!(backdrop.ship_sprites().len(), 1);
}

#[test]
fn resize_keeps_the_vignette() {
    let mut rng = seeded_rng();
    let mut backdrop = make_backdrop(&mut rng);
    backdrop.force_spawn(Mode::Normal, &mut rng);
    backdrop.frame(1.0 / 30.0, &mut rng);
    let ship_before = backdrop.director().ship().clone();

    backdrop.resize(Viewport::new(640, 360), &mut rng);
    assert_eq!(backdrop.viewport(), Viewport::new(640, 360));
    assert_eq!(backdrop.starfield().viewport(), Viewport::new(640, 360));
    assert_eq!(backdrop.director().viewport(), Viewport::new(640, 360));
    assert_eq!(backdrop.director().ship().position, ship_before.position);
    assert!(backdrop.director().is_active());

    backdrop.frame(1.0 / 30.0, &mut rng);
    assert_eq!((backdrop.output().width(), backdrop.output().height()), (640, 360));
}

#[test]
fn seeded_runs_are_reproducible() {
    let run = || {
        let mut rng = seeded_rng();
        let mut backdrop = make_backdrop(&mut rng);
        backdrop.force_spawn(Mode::Combat, &mut rng);
        run_headless(&mut backdrop, 2.0, 30, &mut rng);
        backdrop.output().to_rgba8()
    };
    assert_eq!(run(), run());
}

// ── snapshot ──────────────────────────────────────────────────────────────────

#[test]
fn headless_run_counts_frames() {
    let mut rng = seeded_rng();
    let mut backdrop = make_backdrop(&mut rng);
    assert_eq!(run_headless(&mut backdrop, 1.0, 30, &mut rng), 30);
    assert_eq!(run_headless(&mut backdrop, 0.0, 30, &mut rng), 0);
}

#[test]
fn snapshot_writes_a_png() {
    let mut rng = seeded_rng();
    let mut backdrop = make_backdrop(&mut rng);
    run_headless(&mut backdrop, 0.5, 30, &mut rng);

    let path = std::env::temp_dir().join(format!("signage_backdrop_{}.png", std::process::id()));
    write_png(backdrop.output(), &path).expect("png written");
    let bytes = std::fs::read(&path).expect("png readable");
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    let _ = std::fs::remove_file(&path);
}
