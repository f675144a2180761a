use std::sync::{Arc, Mutex, PoisonError};

use scs_common::{IdColor, Light};
use scs_render::{
    BlendMode, ClearValues, CompareFunction, DeviceError, FrameParams, GraphicsDevice,
    MeshMaterial, PipelineState, Surface,
};
use scs_scene::{Camera, CsgScene, MeshInstance, SceneDesc};
use serde::Serialize;

use crate::compositor;
use crate::debug::DebugCapture;
use crate::error::CsgError;
use crate::frame::{FrameContext, draw_item, product_frames};
use crate::options::{RenderOptions, Strategy};
use crate::stage::ProductStage;
use crate::targets::FrameTargets;

/// Scene-size limits imposed by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneLimits {
    pub stencil_max: u32,
}

impl SceneLimits {
    /// Reject scenes whose stencil counts or ID colors would overflow.
    pub fn validate(&self, scene: &CsgScene) -> Result<(), CsgError> {
        let available = self.stencil_max;
        for (product, p) in scene.products().iter().enumerate() {
            let intersections = p.intersections().len() as u64;
            if intersections > available as u64 {
                return Err(CsgError::StencilBudget {
                    product,
                    required: intersections,
                    available,
                });
            }
            let codes = (p.differences().len() as u64).pow(2);
            if codes > available as u64 {
                return Err(CsgError::StencilBudget {
                    product,
                    required: codes,
                    available,
                });
            }
        }
        let members = scene.member_count();
        if members > IdColor::MAX as usize {
            return Err(CsgError::IdCapacity {
                members,
                capacity: IdColor::MAX,
            });
        }
        Ok(())
    }
}

type PendingScene = Arc<Mutex<Option<Arc<CsgScene>>>>;

/// Handle a background loader uses to hand a new scene to the renderer.
///
/// The scene is validated on install and swapped in at the start of the next
/// frame, so no frame ever sees a mix of two scenes.
#[derive(Debug, Clone)]
pub struct SceneInstaller {
    pending: PendingScene,
    limits: SceneLimits,
}

impl SceneInstaller {
    pub fn install(&self, scene: Arc<CsgScene>) -> Result<(), CsgError> {
        self.limits.validate(&scene)?;
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(scene);
        Ok(())
    }
}

/// Outcome of one product in a frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductReport {
    pub index: usize,
    pub intersections: usize,
    pub differences: usize,
    pub stage: ProductStage,
    pub stencil_codes: u32,
}

/// Summary of one rendered frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    pub strategy: Strategy,
    pub products: Vec<ProductReport>,
    pub passthrough_drawn: usize,
}

impl FrameReport {
    pub fn all_reconciled(&self) -> bool {
        self.products
            .iter()
            .all(|p| p.stage == ProductStage::Reconciled)
    }
}

/// Frame orchestrator: owns the device, the render targets and the current
/// scene, and drives the passes of every product each frame.
pub struct ScsRenderer<D: GraphicsDevice> {
    device: D,
    limits: SceneLimits,
    scene: Arc<CsgScene>,
    pending: PendingScene,
    lights: Vec<Light>,
    targets: Option<FrameTargets>,
    debug: bool,
    capture: Option<DebugCapture>,
    frame_index: u64,
}

impl<D: GraphicsDevice> ScsRenderer<D> {
    /// Fails when the device cannot run the stencil and float-target passes.
    pub fn new(device: D) -> Result<Self, CsgError> {
        let caps = device.capabilities();
        if caps.stencil_bits == 0 {
            return Err(CsgError::Capability("no stencil buffer".into()));
        }
        if !caps.float_color_targets {
            return Err(CsgError::Capability(
                "float color render targets are not supported".into(),
            ));
        }
        tracing::info!(
            stencil_bits = caps.stencil_bits,
            max_target_size = caps.max_target_size,
            "csg renderer ready"
        );
        Ok(Self {
            device,
            limits: SceneLimits {
                stencil_max: caps.stencil_max(),
            },
            scene: Arc::new(CsgScene::new()),
            pending: Arc::new(Mutex::new(None)),
            lights: Vec::new(),
            targets: None,
            debug: false,
            capture: None,
            frame_index: 0,
        })
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn scene(&self) -> &Arc<CsgScene> {
        &self.scene
    }

    pub fn limits(&self) -> SceneLimits {
        self.limits
    }

    /// Replace the product list. Takes effect for the next frame and
    /// supersedes any scene still pending from a [`SceneInstaller`].
    pub fn set_scene(&mut self, scene: Arc<CsgScene>) -> Result<(), CsgError> {
        self.limits.validate(&scene)?;
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.take().is_some() {
            tracing::debug!("pending scene discarded");
        }
        tracing::debug!(
            products = scene.products().len(),
            passthrough = scene.passthrough().len(),
            "scene set"
        );
        self.scene = scene;
        Ok(())
    }

    /// Build a scene description, install it and use its lights.
    pub fn load(&mut self, desc: &SceneDesc) -> Result<(), CsgError> {
        let loaded = desc.build()?;
        self.set_scene(Arc::new(loaded.scene))?;
        self.add_lights(loaded.lights);
        Ok(())
    }

    pub fn scene_installer(&self) -> SceneInstaller {
        SceneInstaller {
            pending: Arc::clone(&self.pending),
            limits: self.limits,
        }
    }

    /// Lights used by every lit pass and by passthrough objects. Replaces the
    /// current set.
    pub fn add_lights(&mut self, lights: impl IntoIterator<Item = Light>) {
        self.lights = lights.into_iter().collect();
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Resize the framebuffer and recreate every render target.
    pub fn set_size(&mut self, width: u32, height: u32) -> Result<(), CsgError> {
        if width == 0 || height == 0 {
            return Err(DeviceError::ZeroSize { width, height }.into());
        }
        if let Some(old) = self.targets.take() {
            old.release(&mut self.device);
        }
        self.capture = None;
        self.device.resize_framebuffer(width, height)?;
        self.targets = Some(FrameTargets::create(&mut self.device, width, height)?);
        tracing::info!(width, height, "render targets created");
        Ok(())
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        self.targets.map(|t| (t.width, t.height))
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
        if !debug {
            self.capture = None;
        }
    }

    /// Buffers captured by the last frame rendered with debugging on.
    pub fn debug_capture(&self) -> Option<&DebugCapture> {
        self.capture.as_ref()
    }

    fn install_pending(&mut self) {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(scene) = pending {
            tracing::debug!(products = scene.products().len(), "installing loaded scene");
            self.scene = scene;
        }
    }

    /// Render one frame: every product through the selected compositor, then
    /// the passthrough objects against the reconciled depth.
    pub fn render(
        &mut self,
        camera: &Camera,
        options: &RenderOptions,
    ) -> Result<FrameReport, CsgError> {
        let targets = self.targets.ok_or(CsgError::Unsized)?;
        self.install_pending();
        let scene = Arc::clone(&self.scene);
        let span = tracing::info_span!(
            "csg_frame",
            frame = self.frame_index,
            strategy = %options.strategy,
            products = scene.products().len()
        );
        let _enter = span.enter();

        if options.clear_framebuffer {
            self.device.clear(
                Surface::Framebuffer,
                ClearValues::color(options.clear_color)
                    .with_depth(1.0)
                    .with_stencil(0),
            )?;
        }
        targets.reset_accumulators(&mut self.device)?;

        let frame = FrameParams {
            view_projection: camera.view_projection(),
            lights: &self.lights,
        };
        let mut products = product_frames(&scene);
        let mut ctx = FrameContext {
            device: &mut self.device,
            frame,
            targets: &targets,
            products: &mut products,
        };
        compositor::compose(options.strategy, &mut ctx)?;

        let passthrough_drawn = if options.draw_passthrough {
            draw_passthrough(&mut self.device, &frame, scene.passthrough())?
        } else {
            0
        };

        self.capture = if self.debug {
            Some(DebugCapture::capture(
                &mut self.device,
                &targets,
                options.strategy,
                products.len(),
            )?)
        } else {
            None
        };

        let report = FrameReport {
            frame: self.frame_index,
            strategy: options.strategy,
            products: products
                .iter()
                .map(|p| ProductReport {
                    index: p.index,
                    intersections: p.intersections.len(),
                    differences: p.differences.len(),
                    stage: p.stage.stage(),
                    stencil_codes: p.stencil_codes,
                })
                .collect(),
            passthrough_drawn,
        };
        self.frame_index += 1;
        tracing::debug!(passthrough = passthrough_drawn, "frame done");
        Ok(report)
    }
}

/// Draw passthrough objects lit against native depth: opaque ones first with
/// depth writes, then translucent ones blended without.
fn draw_passthrough<D: GraphicsDevice>(
    device: &mut D,
    frame: &FrameParams<'_>,
    objects: &[MeshInstance],
) -> Result<usize, CsgError> {
    let (opaque, translucent): (Vec<_>, Vec<_>) = objects
        .iter()
        .map(|m| draw_item(m, IdColor::NONE))
        .partition(|item| item.color[3] >= 1.0);
    if !opaque.is_empty() {
        device.draw_meshes(
            Surface::Framebuffer,
            frame,
            &PipelineState::default(),
            MeshMaterial::Lit,
            &opaque,
        )?;
    }
    if !translucent.is_empty() {
        let blended = PipelineState::default()
            .with_depth(CompareFunction::LessEqual, false)
            .with_blend(BlendMode::Alpha);
        device.draw_meshes(
            Surface::Framebuffer,
            frame,
            &blended,
            MeshMaterial::Lit,
            &translucent,
        )?;
    }
    Ok(objects.len())
}
