use signage_backdrop::canvas::Canvas;
use signage_backdrop::entities::*;
use signage_backdrop::starfield::*;

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn make_field() -> Starfield {
    Starfield::new(Viewport::new(800, 480), &mut seeded_rng())
}

// ── generate_layers ───────────────────────────────────────────────────────────

#[test]
fn layers_scale_with_width() {
    let layers = generate_layers(1000);
    assert_eq!(layers.len(), 4);

    let counts: Vec<usize> = layers.iter().map(|l| l.count).collect();
    assert_eq!(counts, vec![50, 75, 100, 125]);

    assert_relative_eq!(layers[0].near, 950.0);
    assert_relative_eq!(layers[0].far, 1000.0);
    assert_relative_eq!(layers[1].near, 700.0);
    assert_relative_eq!(layers[2].near, 400.0);
    assert_relative_eq!(layers[2].far, 700.0);
    assert_relative_eq!(layers[3].near, 100.0);
    assert_relative_eq!(layers[3].far, 400.0);
}

#[test]
fn only_nearest_layer_glows() {
    let layers = generate_layers(800);
    assert!(layers[0].glow);
    assert!(layers[1..].iter().all(|l| !l.glow));
}

// ── new / resize ──────────────────────────────────────────────────────────────

#[test]
fn new_field_populates_every_layer() {
    let field = make_field();
    assert_eq!(field.len(), 350);

    for star in field.stars() {
        let layer = &field.layers()[star.layer];
        assert!(star.z >= layer.near && star.z < layer.far);
        assert!(star.x >= 0.0 && star.x < 800.0);
        assert!(star.y >= 0.0 && star.y < 480.0);
        assert!(star.o >= MIN_OPACITY && star.o <= MAX_OPACITY);
    }
}

#[test]
fn resize_back_reproduces_layer_ranges() {
    let mut rng = seeded_rng();
    let mut field = make_field();
    let original = field.layers().to_vec();

    field.resize(Viewport::new(1920, 1080), &mut rng);
    assert_ne!(field.layers(), original.as_slice());
    assert_eq!(field.viewport(), Viewport::new(1920, 1080));

    field.resize(Viewport::new(800, 480), &mut rng);
    assert_eq!(field.layers(), original.as_slice());
    assert_eq!(field.len(), 350);
}

#[test]
fn resize_repopulates_stars_within_new_bounds() {
    let mut rng = seeded_rng();
    let mut field = make_field();
    field.resize(Viewport::new(200, 100), &mut rng);

    for star in field.stars() {
        let layer = &field.layers()[star.layer];
        assert!(star.x < 200.0 && star.y < 100.0);
        assert!(star.z >= layer.near && star.z < layer.far);
    }
}

// ── tick ──────────────────────────────────────────────────────────────────────

#[test]
fn tick_moves_depth_or_wraps() {
    let mut rng = seeded_rng();
    let mut field = make_field();
    let dt = 1.0 / 60.0;

    for _ in 0..600 {
        let before: Vec<f32> = field.stars().iter().map(|s| s.z).collect();
        field.tick(dt, &mut rng);
        for (star, prev) in field.stars().iter().zip(before) {
            let expected = prev - STAR_SPEED * dt;
            if expected > 0.0 {
                assert_relative_eq!(star.z, expected, epsilon = 1e-3);
            } else {
                let layer = &field.layers()[star.layer];
                assert!(star.z >= layer.near && star.z < layer.far);
            }
        }
    }
}

#[test]
fn wrapped_star_gets_fresh_position() {
    let mut rng = seeded_rng();
    let mut field = make_field();

    // Closest layer tops out at 0.4 * width, so a few seconds always wraps.
    let index = field
        .stars()
        .iter()
        .position(|s| s.layer == 3)
        .expect("far layer has stars");
    let mut wrapped = false;
    for _ in 0..2000 {
        let before = field.stars()[index].clone();
        field.tick(1.0 / 30.0, &mut rng);
        let after = &field.stars()[index];
        if after.z > before.z {
            wrapped = true;
            assert!(after.x != before.x || after.y != before.y);
            break;
        }
    }
    assert!(wrapped);
}

#[test]
fn opacity_stays_clamped_while_twinkling() {
    let mut rng = seeded_rng();
    let mut field = make_field();
    for _ in 0..300 {
        let before: Vec<f32> = field.stars().iter().map(|s| s.o).collect();
        field.tick(1.0 / 60.0, &mut rng);
        for (star, prev) in field.stars().iter().zip(before) {
            assert!(star.o >= MIN_OPACITY && star.o <= MAX_OPACITY);
            assert!((star.o - prev).abs() <= TWINKLE_STEP + 1e-6);
        }
    }
}

#[test]
fn projected_size_grows_as_star_approaches() {
    let mut rng = seeded_rng();
    let mut field = make_field();
    field.tick(0.0, &mut rng);
    for star in field.stars() {
        assert_relative_eq!(star.size, (1.0 - star.z / 800.0) * 2.0, epsilon = 1e-5);
    }
}

#[test]
fn camera_starts_at_viewport_centre_horizontally() {
    let field = make_field();
    let center = field.camera_center();
    assert_relative_eq!(center.x, 400.0);
    // cos(0) puts the y drift at its full amplitude.
    assert_relative_eq!(center.y, 240.0 + 48.0);
}

// ── draw ──────────────────────────────────────────────────────────────────────

#[test]
fn draw_lights_up_the_sky() {
    let mut rng = seeded_rng();
    let mut field = make_field();
    for _ in 0..30 {
        field.tick(1.0 / 30.0, &mut rng);
    }

    let mut canvas = Canvas::new(800, 480);
    canvas.clear(Rgba::rgb(0, 0, 0));
    field.draw(&mut canvas);

    let lit = (0..480)
        .flat_map(|y| (0..800).map(move |x| (x, y)))
        .filter(|&(x, y)| canvas.pixel(x, y).map_or(false, |p| p.r > 0 || p.g > 0 || p.b > 0))
        .count();
    assert!(lit > 0);
}
