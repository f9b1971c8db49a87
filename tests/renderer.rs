// tests/renderer.rs
use glam::{Vec2, Vec3, Vec4};
use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;
use treeline::{
    CanvasError, DrawMode, RenderConfig, RenderError, Renderer, ScatterParams, ShapeInstance,
    fern, koch_curve,
};

fn forest(count: usize, seed: u64) -> Vec<ShapeInstance> {
    let mut rng = StdRng::seed_from_u64(seed);
    let params = ScatterParams {
        depth: 4,
        length: 0.05,
    };
    ShapeInstance::scatter(&Arc::new(fern()), count, params, &mut rng)
}

#[test_log::test]
fn test_operations_before_allocation_fail() {
    let mut renderer = Renderer::default();
    let unallocated = RenderError::Canvas(CanvasError::Unallocated);

    assert_eq!(renderer.clear_image(), Err(unallocated.clone()));
    assert_eq!(renderer.render().unwrap_err(), unallocated);
    assert_eq!(renderer.render_ordered(DrawMode::Overwrite).unwrap_err(), unallocated);
    assert_eq!(renderer.image().unwrap_err(), unallocated);
    assert!(renderer.frame_buffer().is_none());
}

#[test_log::test]
fn test_invalid_allocation_is_rejected() {
    let mut renderer = Renderer::default();

    assert_eq!(
        renderer.alloc_output_image(0, 32),
        Err(RenderError::Canvas(CanvasError::InvalidDimensions {
            width: 0,
            height: 32
        }))
    );
    assert!(renderer.image().is_err());

    renderer.alloc_output_image(32, 16).unwrap();
    let view = renderer.image().unwrap();
    assert_eq!((view.width, view.height), (32, 16));
    assert_eq!(view.data.len(), 32 * 16 * 4);
}

#[test_log::test]
fn test_full_pass() {
    let mut renderer = Renderer::default();
    renderer.setup(4);
    renderer.alloc_output_image(128, 128).unwrap();
    renderer.load_shapes(forest(40, 1));
    renderer.clear_image().unwrap();

    let report = renderer.render().unwrap();
    assert!(report.is_clean());
    assert_eq!(report.shapes_rendered, 40);
    // Depth-4 fern: 3 * 2^3 * 15 strokes each.
    assert_eq!(report.segments_drawn, 40 * 360);

    let view = renderer.image().unwrap();
    let pixels: Vec<Vec4> = view.data.chunks_exact(4).map(Vec4::from_slice).collect();
    assert!(pixels.iter().any(|&p| p == Vec4::ONE), "background survives somewhere");
    assert!(pixels.iter().any(|&p| p != Vec4::ONE), "strokes were drawn");
    // Scattered ferns are always opaque with a full red channel.
    assert!(pixels.iter().all(|p| p.x == 1.0 && p.w == 1.0));
}

#[test_log::test]
fn test_load_shapes_shares_expansions() {
    let mut renderer = Renderer::default();
    renderer.load_shapes(forest(25, 2));

    let shapes = renderer.shapes();
    assert!(shapes.iter().all(ShapeInstance::is_expanded));
    for shape in &shapes[1..] {
        assert!(Arc::ptr_eq(shape.expansion(), shapes[0].expansion()));
    }
}

#[test_log::test]
fn test_advance_animation_keeps_geometry() {
    let mut renderer = Renderer::new(RenderConfig {
        thread_count: 1,
        ..Default::default()
    });
    renderer.alloc_output_image(64, 64).unwrap();
    renderer.load_shapes(forest(10, 3));

    renderer.clear_image().unwrap();
    renderer.render().unwrap();
    let before = renderer.frame_buffer().cloned();

    renderer.advance_animation();
    renderer.clear_image().unwrap();
    renderer.render().unwrap();

    assert!(before.as_ref() == renderer.frame_buffer());
}

#[test_log::test]
fn test_clear_uses_configured_background() {
    let background = Vec4::new(0.0, 0.0, 0.1, 1.0);
    let mut renderer = Renderer::new(RenderConfig {
        background,
        ..Default::default()
    });
    renderer.alloc_output_image(8, 8).unwrap();
    renderer.clear_image().unwrap();

    let view = renderer.image().unwrap();
    assert!(view.data.chunks_exact(4).all(|p| Vec4::from_slice(p) == background));
}

#[test_log::test]
fn test_ordered_pass_blends() {
    let koch = Arc::new(koch_curve());
    let shape = ShapeInstance::new(koch, Vec2::new(0.1, 0.5), 0.0, 0.05, Vec3::X, 1);

    let mut renderer = Renderer::default();
    renderer.alloc_output_image(32, 32).unwrap();
    renderer.load_shapes(vec![shape]);
    renderer.clear_image().unwrap();

    let report = renderer.render_ordered(DrawMode::Blend { alpha: 0.5 }).unwrap();
    assert_eq!(report.segments_drawn, 5);

    let canvas = renderer.frame_buffer().unwrap();
    let (x, y) = canvas.to_pixel(Vec2::new(0.1, 0.5));
    // Red at half strength over white.
    assert_eq!(canvas.pixel(x, y), Some(Vec4::new(1.0, 0.5, 0.5, 1.0)));
}

#[test]
fn test_config_from_partial_json() {
    let config: RenderConfig =
        serde_json::from_str(r#"{ "thread_count": 2, "interpreter": { "jitter": true } }"#)
            .unwrap();

    assert_eq!(config.thread_count, 2);
    assert!(config.interpreter.jitter);
    assert_eq!(config.interpreter.max_stack_depth, 4096);
    assert_eq!(config.background, Vec4::ONE);

    let renderer = Renderer::new(config);
    assert_eq!(renderer.scheduler().thread_count(), 2);
    assert!(renderer.scheduler().interpreter().config().jitter);
    assert_eq!(renderer.expansion_cache().expander().threads(), 2);
}

#[test_log::test]
fn test_setup_resizes_expansion_workers() {
    let mut renderer = Renderer::default();
    assert_eq!(renderer.expansion_cache().expander().threads(), 8);

    renderer.setup(3);
    assert_eq!(renderer.config().thread_count, 3);
    assert_eq!(renderer.scheduler().thread_count(), 3);
    assert_eq!(renderer.expansion_cache().expander().threads(), 3);

    renderer.setup(0);
    assert_eq!(renderer.expansion_cache().expander().threads(), 1);
}

#[test_log::test]
fn test_load_shapes_drops_stale_expansions() {
    let mut renderer = Renderer::default();
    renderer.load_shapes(forest(5, 4));
    assert_eq!(renderer.expansion_cache().len(), 1);
    assert!(renderer.expansion_cache().contains(&fern(), 4));

    let koch = Arc::new(koch_curve());
    let curves = vec![
        ShapeInstance::new(Arc::clone(&koch), Vec2::new(0.1, 0.1), 0.0, 0.01, Vec3::X, 2),
        ShapeInstance::new(Arc::clone(&koch), Vec2::new(0.5, 0.5), 0.0, 0.01, Vec3::Y, 3),
    ];
    renderer.load_shapes(curves);

    let cache = renderer.expansion_cache();
    assert_eq!(cache.len(), 2);
    assert!(!cache.contains(&fern(), 4));
    assert!(cache.contains(&koch, 2) && cache.contains(&koch, 3));
    assert!(renderer.shapes().iter().all(ShapeInstance::is_expanded));
}

#[test]
fn test_scatter_is_seeded() {
    let a = forest(5, 9);
    let b = forest(5, 9);

    for (left, right) in a.iter().zip(&b) {
        assert_eq!(left.origin, right.origin);
        assert_eq!(left.color, right.color);
        assert_eq!(left.heading, FRAC_PI_2);
        assert_eq!(left.step, 0.05 / 16.0);
        assert!((0.0..1.0).contains(&left.origin.x));
        assert!((0.0..0.5).contains(&left.color.z));
    }
}
