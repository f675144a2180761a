//! End-to-end scenarios on the software device.

use std::sync::Arc;

use approx::assert_abs_diff_eq;
use glam::{Quat, Vec3};
use scs_common::{Light, Mesh, Transform};
use scs_render::{
    Capabilities, ClearValues, DeviceError, DrawItem, FrameParams, GraphicsDevice, MeshMaterial,
    PipelineState, QuadMaterial, SoftwareDevice, Surface, SurfaceImage, TargetDesc, TargetId,
};
use scs_scene::{Camera, CsgScene, MeshInstance, PrimitiveDesc, ProductDesc, SceneDesc, Shape, primitives};

use crate::{
    CsgError, PassEngine, PassOutput, ProductFrame, ProductStage, RenderOptions, ScsRenderer,
    Strategy, product_frames,
};

const SIZE: u32 = 64;
const LENS_RADIUS: f32 = 0.968_245_8; // sqrt(1 - 0.25^2)

fn ambient() -> Vec<Light> {
    vec![Light::Ambient {
        color: Vec3::ONE,
        intensity: 1.0,
    }]
}

fn place(name: &str, mesh: Mesh, at: Vec3, scale: Vec3, color: [f32; 4]) -> MeshInstance {
    MeshInstance::new(
        name,
        Arc::new(mesh),
        Transform::from_position(at).with_scale(scale),
    )
    .with_color(color)
}

fn sphere(at: Vec3, radius: f32) -> MeshInstance {
    place(
        "sphere",
        primitives::uv_sphere(32, 16),
        at,
        Vec3::splat(radius),
        [0.9, 0.6, 0.3, 1.0],
    )
}

fn cube(at: Vec3, scale: Vec3, color: [f32; 4]) -> MeshInstance {
    place("cube", primitives::cuboid(), at, scale, color)
}

fn scene(products: Vec<(Vec<MeshInstance>, Vec<MeshInstance>)>) -> CsgScene {
    CsgScene::from_parts(products, vec![]).unwrap()
}

/// Orthographic camera on +Z looking at the origin; depth = (10 - z) / 20.
fn ortho(half_height: f32) -> Camera {
    Camera::orthographic(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, half_height, 1.0, 0.0, 20.0)
}

fn ortho_depth(z: f32) -> f32 {
    (10.0 - z) / 20.0
}

/// World x/y of a pixel center under [`ortho`].
fn pixel_center(px: u32, py: u32, half_height: f32) -> (f32, f32) {
    let x = ((px as f32 + 0.5) / SIZE as f32 * 2.0 - 1.0) * half_height;
    let y = (1.0 - (py as f32 + 0.5) / SIZE as f32 * 2.0) * half_height;
    (x, y)
}

fn pixel_of(camera: &Camera, world: Vec3) -> (u32, u32) {
    let ndc = camera.view_projection().project_point3(world);
    let x = ((ndc.x * 0.5 + 0.5) * SIZE as f32) as u32;
    let y = ((0.5 - ndc.y * 0.5) * SIZE as f32) as u32;
    (x, y)
}

fn pixels() -> impl Iterator<Item = (u32, u32)> {
    (0..SIZE).flat_map(|y| (0..SIZE).map(move |x| (x, y)))
}

/// Run `passes` for the first product of `scene` into a fresh target and read it back.
fn surface_of(
    scene: &CsgScene,
    camera: &Camera,
    passes: impl FnOnce(
        &mut PassEngine<'_, '_, SoftwareDevice>,
        &mut ProductFrame<'_>,
    ) -> Result<(), CsgError>,
) -> SurfaceImage {
    let mut device = SoftwareDevice::new(SIZE, SIZE).unwrap();
    let target = device
        .create_target(TargetDesc {
            width: SIZE,
            height: SIZE,
            depth_stencil: true,
        })
        .unwrap();
    let lights = ambient();
    let frame = FrameParams {
        view_projection: camera.view_projection(),
        lights: &lights,
    };
    let mut products = product_frames(scene);
    {
        let mut engine =
            PassEngine::new(&mut device, &frame, Surface::Target(target), PassOutput::Depth);
        passes(&mut engine, &mut products[0]).unwrap();
    }
    device.read_surface(Surface::Target(target)).unwrap()
}

fn renderer(scene: CsgScene) -> ScsRenderer<SoftwareDevice> {
    let mut r = ScsRenderer::new(SoftwareDevice::new(SIZE, SIZE).unwrap()).unwrap();
    r.set_size(SIZE, SIZE).unwrap();
    r.add_lights(ambient());
    r.set_scene(Arc::new(scene)).unwrap();
    r
}

fn framebuffer(r: &mut ScsRenderer<SoftwareDevice>) -> SurfaceImage {
    r.device_mut().read_surface(Surface::Framebuffer).unwrap()
}

fn lens() -> CsgScene {
    scene(vec![(
        vec![sphere(Vec3::ZERO, 1.0), sphere(Vec3::new(0.0, 0.0, 0.5), 1.0)],
        vec![],
    )])
}

#[test]
fn intersection_keeps_furthest_front_face_inside_all_members() {
    let half = 1.25;
    let camera = ortho(half);
    let a = surface_of(&scene(vec![(vec![sphere(Vec3::ZERO, 1.0)], vec![])]), &camera, |e, p| {
        e.single_depth(&p.intersections[0])
    });
    let b = surface_of(
        &scene(vec![(vec![sphere(Vec3::new(0.0, 0.0, 0.5), 1.0)], vec![])]),
        &camera,
        |e, p| e.single_depth(&p.intersections[0]),
    );
    let both = surface_of(&lens(), &camera, |e, p| {
        e.convex_intersections(0, &p.intersections)
    });

    let margin = 0.06;
    let mut inside = 0;
    for (px, py) in pixels() {
        let (x, y) = pixel_center(px, py, half);
        let r = (x * x + y * y).sqrt();
        let alpha = both.texel(px, py)[3];
        assert_eq!(both.depth_at(px, py), Some(alpha), "native and synthetic depth differ");
        if r < LENS_RADIUS - margin {
            let expected = a.texel(px, py)[3].max(b.texel(px, py)[3]);
            assert_eq!(alpha, expected, "pixel ({px}, {py})");
            inside += 1;
        } else if r > LENS_RADIUS + margin {
            assert_eq!(alpha, 1.0, "pixel ({px}, {py}) outside the lens");
        }
    }
    assert!(inside > 1000);
}

#[test]
fn lens_silhouette_matches_analytic_width() {
    let half = 1.25;
    let camera = ortho(half);
    let mut r = renderer(lens());
    r.set_debug(true);
    let report = r.render(&camera, &RenderOptions::default()).unwrap();
    assert!(report.all_reconciled());

    let merged = r.debug_capture().unwrap().accumulator.clone().unwrap();
    let pixel = 2.0 * half / SIZE as f32;
    let row = SIZE / 2;
    let covered = (0..SIZE)
        .filter(|&x| merged.texel(x, row)[3] < 1.0)
        .count() as f32;
    let radius = covered * pixel / 2.0;
    assert!(
        (radius - LENS_RADIUS).abs() < 2.0 * pixel + 0.02,
        "measured lens radius {radius}"
    );

    let fb = framebuffer(&mut r);
    for (px, py) in pixels() {
        let (x, y) = pixel_center(px, py, half);
        if (x * x + y * y).sqrt() > LENS_RADIUS + 1.5 * pixel {
            assert_eq!(merged.texel(px, py)[3], 1.0);
            assert_eq!(fb.depth_at(px, py), Some(1.0));
        }
    }
}

#[test]
fn single_member_fast_path_matches_counting_path() {
    // Silhouette edges fall on pixel boundaries, never on pixel centers.
    let camera = ortho(1.0);
    let solid = scene(vec![(
        vec![cube(Vec3::ZERO, Vec3::ONE, [0.2, 0.7, 0.4, 1.0])],
        vec![],
    )]);
    let fast = surface_of(&solid, &camera, |e, p| {
        e.single_depth(&p.intersections[0])?;
        e.lighting(p)
    });
    let counted = surface_of(&solid, &camera, |e, p| {
        e.intersection_by_counting(0, &p.intersections)?;
        e.lighting(p)
    });
    assert_eq!(fast.color, counted.color);
    assert_eq!(fast.depth, counted.depth);
    assert_abs_diff_eq!(fast.texel(32, 32)[3], ortho_depth(0.5), epsilon = 1e-6);
}

fn drilled_block(order: [usize; 3]) -> CsgScene {
    let diffs = [
        // A square hole straight through along the view axis.
        cube(
            Vec3::new(-0.4, 0.0, 0.0),
            Vec3::new(0.8, 0.8, 3.0),
            [0.9, 0.2, 0.2, 1.0],
        ),
        // A notch in the front face.
        cube(Vec3::new(0.5, 0.5, 1.0), Vec3::ONE, [0.2, 0.9, 0.2, 1.0]),
        // A pocket overlapping the notch.
        sphere(Vec3::new(0.3, -0.3, 0.6), 0.6),
    ];
    scene(vec![(
        vec![cube(Vec3::ZERO, Vec3::splat(2.0), [0.5, 0.5, 0.9, 1.0])],
        order.iter().map(|&i| diffs[i].clone()).collect(),
    )])
}

#[test]
fn subtraction_is_independent_of_difference_order() {
    let half = 1.5;
    let camera = ortho(half);
    let render = |order| {
        surface_of(&drilled_block(order), &camera, |e, p| e.render_product(p))
    };
    let reference = render([0, 1, 2]);
    for order in [[2, 0, 1], [1, 2, 0], [2, 1, 0]] {
        let other = render(order);
        let alphas = |img: &SurfaceImage| img.color.iter().map(|t| t[3]).collect::<Vec<_>>();
        assert_eq!(alphas(&reference), alphas(&other), "order {order:?}");
        assert_eq!(reference.depth, other.depth, "order {order:?}");
    }

    // Through the hole: nothing left to see.
    let (hx, hy) = pixel_of(&camera, Vec3::new(-0.4, 0.0, 0.0));
    assert_eq!(reference.texel(hx, hy)[3], 1.0);
    // Floor of the notch.
    let (nx, ny) = pixel_of(&camera, Vec3::new(0.8, 0.8, 0.0));
    assert_abs_diff_eq!(reference.texel(nx, ny)[3], ortho_depth(0.5), epsilon = 1e-5);
    // Notch floor carved again by the pocket: needs a second round.
    let (cx, cy) = pixel_of(&camera, Vec3::new(0.4, 0.2, 0.0));
    let (x, y) = pixel_center(cx, cy, half);
    let pocket_back = 0.6 - (0.36 - (x - 0.3).powi(2) - (y + 0.3).powi(2)).sqrt();
    assert_abs_diff_eq!(reference.texel(cx, cy)[3], ortho_depth(pocket_back), epsilon = 2e-3);
    // Untouched front face.
    let (fx, fy) = pixel_of(&camera, Vec3::new(-1.0 + 0.1, 0.9, 0.0));
    assert_abs_diff_eq!(reference.texel(fx, fy)[3], ortho_depth(1.0), epsilon = 1e-5);
}

#[test]
fn subtraction_uses_n_squared_stencil_codes() {
    let mut r = renderer(drilled_block([0, 1, 2]));
    let report = r.render(&ortho(1.5), &RenderOptions::default()).unwrap();
    assert_eq!(report.products[0].stencil_codes, 9);
    assert_eq!(report.products[0].stage, ProductStage::Reconciled);
}

fn two_slabs(a_first: bool) -> CsgScene {
    let a = cube(Vec3::new(-0.5, 0.0, 6.5), Vec3::new(2.0, 2.0, 1.0), [1.0, 0.0, 0.0, 1.0]);
    let b = cube(Vec3::new(0.5, 0.0, 2.5), Vec3::new(2.0, 2.0, 1.0), [0.0, 0.0, 1.0, 1.0]);
    let (first, second) = if a_first { (a, b) } else { (b, a) };
    scene(vec![(vec![first], vec![]), (vec![second], vec![])])
}

#[test]
fn nearest_product_wins_in_any_order() {
    // Depth = (10 - z) / 10: slab A's front is at 0.3, slab B's at 0.7.
    let camera = Camera::orthographic(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, 2.0, 1.0, 0.0, 10.0);
    let p = pixel_of(&camera, Vec3::ZERO);
    for strategy in Strategy::ALL {
        let mut colors = Vec::new();
        for a_first in [true, false] {
            let mut r = renderer(two_slabs(a_first));
            r.set_debug(true);
            r.render(&camera, &RenderOptions::with_strategy(strategy))
                .unwrap();
            let fb = framebuffer(&mut r);
            assert_abs_diff_eq!(fb.depth_at(p.0, p.1).unwrap(), 0.3, epsilon = 1e-5);
            if let Some(merged) = &r.debug_capture().unwrap().accumulator {
                assert_abs_diff_eq!(merged.texel(p.0, p.1)[3], 0.3, epsilon = 1e-5);
            }
            colors.push(fb.texel(p.0, p.1));
        }
        for c in &colors {
            assert_abs_diff_eq!(c[0], 1.0, epsilon = 1e-6);
            assert_abs_diff_eq!(c[2], 0.0, epsilon = 1e-6);
        }
    }
}

fn demo_with_backdrop() -> CsgScene {
    let mut desc = SceneDesc::demo();
    desc.passthrough.clear();
    desc.products.push(ProductDesc {
        intersections: vec![
            PrimitiveDesc::new(Shape::Sphere {
                segments: 24,
                rings: 12,
            })
            .at(Vec3::new(0.0, 0.0, -3.0))
            .scaled(Vec3::splat(1.5)),
        ],
        differences: vec![],
    });
    desc.build().unwrap().scene
}

fn demo_camera() -> Camera {
    Camera::perspective(
        Vec3::new(0.5, 1.5, 6.0),
        Vec3::ZERO,
        50f32.to_radians(),
        1.0,
        1.0,
        20.0,
    )
}

#[test]
fn reconciled_native_depth_equals_synthetic_depth() {
    let mut r = renderer(demo_with_backdrop());
    r.set_debug(true);
    let options = RenderOptions {
        draw_passthrough: false,
        ..RenderOptions::default()
    };
    r.render(&demo_camera(), &options).unwrap();
    let merged = r.debug_capture().unwrap().accumulator.clone().unwrap();
    let fb = framebuffer(&mut r);

    let mut surfaces = 0;
    for (x, y) in pixels() {
        let synthetic = merged.texel(x, y)[3];
        let native = fb.depth_at(x, y).unwrap();
        if synthetic < 1.0 {
            surfaces += 1;
            assert_abs_diff_eq!(native, synthetic, epsilon = 1e-5);
        } else {
            assert_eq!(native, 1.0);
        }
    }
    assert!(surfaces > 200);
}

#[test]
fn all_strategies_produce_the_same_surfaces() {
    let camera = demo_camera();
    let options = |strategy| RenderOptions {
        draw_passthrough: false,
        ..RenderOptions::with_strategy(strategy)
    };
    let mut frames = Vec::new();
    for strategy in Strategy::ALL {
        let mut r = renderer(demo_with_backdrop());
        let report = r.render(&camera, &options(strategy)).unwrap();
        assert_eq!(report.strategy, strategy);
        assert!(report.all_reconciled(), "{strategy}: {report:?}");
        frames.push(framebuffer(&mut r));
    }
    let first = &frames[0];
    for other in &frames[1..] {
        let depth = first.depth.as_ref().unwrap();
        for (a, b) in depth.iter().zip(other.depth.as_ref().unwrap()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-5);
        }
        for (a, b) in first.color.iter().zip(&other.color) {
            for channel in 0..3 {
                assert_abs_diff_eq!(a[channel], b[channel], epsilon = 1e-5);
            }
        }
    }
}

#[test]
fn id_strategy_shades_with_member_colors() {
    let camera = Camera::orthographic(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, 2.0, 1.0, 0.0, 10.0);
    let mut r = renderer(two_slabs(false));
    r.render(&camera, &RenderOptions::from_flags(true, false))
        .unwrap();
    let fb = framebuffer(&mut r);
    // Only slab B covers x = 1.2.
    let (bx, by) = pixel_of(&camera, Vec3::new(1.2, 0.0, 0.0));
    assert_eq!(fb.texel(bx, by), [0.0, 0.0, 1.0, 1.0]);
}

#[test]
fn passthrough_objects_respect_reconciled_depth() {
    let half = 1.25;
    let camera = ortho(half);
    let mut csg = lens();
    // Opaque wall behind the lens, translucent pane in front of it.
    csg.add_passthrough(cube(
        Vec3::new(0.0, 0.0, -3.0),
        Vec3::new(4.0, 4.0, 0.5),
        [0.0, 1.0, 0.0, 1.0],
    ));
    csg.add_passthrough(cube(
        Vec3::new(0.0, 0.0, 3.0),
        Vec3::new(4.0, 4.0, 0.1),
        [1.0, 1.0, 1.0, 0.5],
    ));
    let mut r = renderer(csg);
    let report = r.render(&camera, &RenderOptions::default()).unwrap();
    assert_eq!(report.passthrough_drawn, 2);

    let fb = framebuffer(&mut r);
    let (cx, cy) = pixel_of(&camera, Vec3::ZERO);
    let (ex, ey) = pixel_of(&camera, Vec3::new(1.15, 1.15, 0.0));
    // The lens occludes the wall; the pane blends over both but writes no depth.
    assert_abs_diff_eq!(fb.depth_at(cx, cy).unwrap(), ortho_depth(1.0), epsilon = 2e-3);
    assert_abs_diff_eq!(fb.depth_at(ex, ey).unwrap(), ortho_depth(-2.75), epsilon = 1e-5);
    assert_abs_diff_eq!(fb.texel(ex, ey)[0], 0.5, epsilon = 1e-5);
    assert_abs_diff_eq!(fb.texel(ex, ey)[1], 1.0, epsilon = 1e-5);
}

#[test]
fn render_before_set_size_fails() {
    let mut r = ScsRenderer::new(SoftwareDevice::new(8, 8).unwrap()).unwrap();
    let err = r
        .render(&Camera::default(), &RenderOptions::default())
        .unwrap_err();
    assert!(matches!(err, CsgError::Unsized));
    assert!(matches!(
        r.set_size(0, 8),
        Err(CsgError::Device(DeviceError::ZeroSize { .. }))
    ));
}

#[test]
fn resizing_recreates_targets() {
    let mut r = renderer(lens());
    assert_eq!(r.device().target_count(), 3);
    r.set_size(32, 16).unwrap();
    assert_eq!(r.device().target_count(), 3);
    assert_eq!(r.size(), Some((32, 16)));
    assert_eq!(r.device().size(), (32, 16));
    r.render(&ortho(1.25).with_aspect(2.0), &RenderOptions::default())
        .unwrap();
}

#[test]
fn stencil_budget_is_checked_at_install() {
    let mut r = renderer(lens());
    let diffs: Vec<_> = (0..16)
        .map(|i| cube(Vec3::new(i as f32 * 0.1, 0.0, 0.0), Vec3::splat(0.05), [1.0; 4]))
        .collect();
    let err = r
        .set_scene(Arc::new(scene(vec![(vec![sphere(Vec3::ZERO, 1.0)], diffs)])))
        .unwrap_err();
    assert!(matches!(
        err,
        CsgError::StencilBudget {
            product: 0,
            required: 256,
            available: 255
        }
    ));
    // The previous scene stays installed.
    assert_eq!(r.scene().products().len(), 1);
}

#[test]
fn background_install_is_picked_up_by_the_next_frame() {
    let mut r = renderer(lens());
    let installer = r.scene_installer();
    let loader = std::thread::spawn(move || installer.install(Arc::new(two_slabs(true))));
    loader.join().unwrap().unwrap();
    let report = r
        .render(&ortho(2.0), &RenderOptions::default())
        .unwrap();
    assert_eq!(report.products.len(), 2);
    assert_eq!(report.frame, 0);
}

#[test]
fn set_scene_supersedes_a_pending_install() {
    let mut r = renderer(lens());
    r.scene_installer()
        .install(Arc::new(two_slabs(true)))
        .unwrap();
    r.set_scene(Arc::new(drilled_block([0, 1, 2]))).unwrap();
    let report = r
        .render(&ortho(2.0), &RenderOptions::default())
        .unwrap();
    assert_eq!(report.products.len(), 1);
    assert_eq!(report.products[0].differences, 3);
    assert_eq!(r.scene().products().len(), 1);
}

#[test]
fn lights_are_replaced_not_accumulated() {
    let mut r = ScsRenderer::new(SoftwareDevice::new(SIZE, SIZE).unwrap()).unwrap();
    r.load(&SceneDesc::demo()).unwrap();
    r.load(&SceneDesc::demo()).unwrap();
    assert_eq!(r.lights().len(), 3);
    r.add_lights(ambient());
    assert_eq!(r.lights(), ambient().as_slice());
}

#[test]
fn loading_a_description_installs_scene_and_lights() {
    let mut r = ScsRenderer::new(SoftwareDevice::new(SIZE, SIZE).unwrap()).unwrap();
    r.set_size(SIZE, SIZE).unwrap();
    r.load(&SceneDesc::demo()).unwrap();
    assert_eq!(r.scene().products().len(), 2);
    assert_eq!(r.lights().len(), 3);
    let report = r
        .render(&demo_camera(), &RenderOptions::from_flags(false, true))
        .unwrap();
    assert_eq!(report.passthrough_drawn, 1);
    assert!(report.all_reconciled());
}

#[test]
fn debug_capture_visualizes_depth() {
    let mut r = renderer(lens());
    r.set_debug(true);
    r.render(&ortho(1.25), &RenderOptions::default()).unwrap();
    let capture = r.debug_capture().unwrap();
    let (cx, cy) = (SIZE / 2, SIZE / 2);
    let depth = capture.accumulator.as_ref().unwrap().texel(cx, cy)[3];
    assert_abs_diff_eq!(capture.depth_view.texel(cx, cy)[0], 1.0 - depth, epsilon = 1e-6);
    assert_eq!(capture.depth_view.texel(0, 0)[3], 0.0);
    r.set_debug(false);
    assert!(r.debug_capture().is_none());
}

/// Software device that reports no stencil buffer.
struct NoStencil(SoftwareDevice);

impl GraphicsDevice for NoStencil {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            stencil_bits: 0,
            ..self.0.capabilities()
        }
    }
    fn size(&self) -> (u32, u32) {
        self.0.size()
    }
    fn resize_framebuffer(&mut self, width: u32, height: u32) -> Result<(), DeviceError> {
        self.0.resize_framebuffer(width, height)
    }
    fn create_target(&mut self, desc: TargetDesc) -> Result<TargetId, DeviceError> {
        self.0.create_target(desc)
    }
    fn release_target(&mut self, id: TargetId) {
        self.0.release_target(id)
    }
    fn clear(&mut self, surface: Surface, values: ClearValues) -> Result<(), DeviceError> {
        self.0.clear(surface, values)
    }
    fn draw_meshes(
        &mut self,
        surface: Surface,
        frame: &FrameParams<'_>,
        state: &PipelineState,
        material: MeshMaterial,
        items: &[DrawItem<'_>],
    ) -> Result<(), DeviceError> {
        self.0.draw_meshes(surface, frame, state, material, items)
    }
    fn draw_quad(
        &mut self,
        surface: Surface,
        state: &PipelineState,
        material: QuadMaterial,
    ) -> Result<(), DeviceError> {
        self.0.draw_quad(surface, state, material)
    }
    fn read_surface(&mut self, surface: Surface) -> Result<SurfaceImage, DeviceError> {
        self.0.read_surface(surface)
    }
}

#[test]
fn missing_stencil_fails_fast() {
    let device = NoStencil(SoftwareDevice::new(8, 8).unwrap());
    assert!(matches!(
        ScsRenderer::new(device),
        Err(CsgError::Capability(_))
    ));
}

#[test]
fn rotated_members_keep_stage_order() {
    let tilted = cube(Vec3::ZERO, Vec3::splat(1.5), [0.7; 4]);
    let tilted = MeshInstance {
        transform: tilted
            .transform
            .with_rotation(Quat::from_rotation_y(0.6) * Quat::from_rotation_x(0.3)),
        ..tilted
    };
    let mut r = renderer(scene(vec![(
        vec![tilted, sphere(Vec3::ZERO, 1.0)],
        vec![sphere(Vec3::new(0.0, 0.0, 1.0), 0.5)],
    )]));
    for strategy in Strategy::ALL {
        let report = r
            .render(&demo_camera(), &RenderOptions::with_strategy(strategy))
            .unwrap();
        assert_eq!(report.products[0].stage, ProductStage::Reconciled);
        assert_eq!(report.products[0].stencil_codes, 1);
    }
}
