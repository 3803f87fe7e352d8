use crate::drawing::{Scene, draw_splash};
use eyre::Result;
use smithay_client_toolkit::{
    compositor::CompositorState,
    output::OutputState,
    registry::RegistryState,
    shell::{WaylandSurface, wlr_layer::{LayerShell, LayerSurface}},
    shm::{Shm, slot::SlotPool},
};
use wayland_client::{QueueHandle, globals::GlobalList, protocol::wl_output};

pub struct App {
    pub registry_state: RegistryState,
    pub output_state: OutputState,
    pub compositor_state: CompositorState,
    /// Missing on compositors without wlr-layer-shell; resolution detection
    /// still works there, the splash does not.
    pub layer_shell: Option<LayerShell>,
    pub shm: Shm,
    pub pool: Option<SlotPool>,
    pub layer: Option<LayerSurface>,
    pub width: i32,
    pub height: i32,
    pub scene: Option<Scene>,

    pub bound_output: Option<wl_output::WlOutput>,
    pub target_display_name: Option<String>,
    /// Set when the compositor closed the surface or removed its output
    pub closed: bool,
    /// Scene changed since the last draw
    pub dirty: bool,
}

impl App {
    pub fn bind(
        globals: &GlobalList,
        qh: &QueueHandle<Self>,
        target_display_name: Option<String>,
    ) -> Result<Self> {
        let layer_shell = match LayerShell::bind(globals, qh) {
            Ok(shell) => Some(shell),
            Err(e) => {
                log::debug!("wlr-layer-shell unavailable: {}", e);
                None
            }
        };

        Ok(Self {
            registry_state: RegistryState::new(globals),
            output_state: OutputState::new(globals, qh),
            compositor_state: CompositorState::bind(globals, qh)?,
            layer_shell,
            shm: Shm::bind(globals, qh)?,
            pool: None,
            layer: None,
            width: 0,
            height: 0,
            scene: None,
            bound_output: None,
            target_display_name,
            closed: false,
            dirty: false,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn draw(&mut self) {
        let Some(scene) = self.scene.as_ref() else {
            return;
        };
        let Some(pool) = self.pool.as_mut() else {
            log::debug!("draw() called but pool is None");
            return;
        };
        let Some(layer) = &self.layer else {
            log::debug!("draw() called but layer is None");
            return;
        };
        if self.width == 0 || self.height == 0 {
            log::debug!("draw() called but dimensions are zero: {}x{}", self.width, self.height);
            return;
        }

        let stride = self.width * 4;
        let (buffer, canvas) = match pool.create_buffer(
            self.width,
            self.height,
            stride,
            wayland_client::protocol::wl_shm::Format::Argb8888,
        ) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("Failed to create buffer: {:?}", e);
                return;
            }
        };

        if let Err(e) = draw_splash(canvas, self.width, self.height, scene) {
            log::warn!("Failed to draw splash: {}", e);
            return;
        }

        let surface = layer.wl_surface();
        surface.attach(Some(buffer.wl_buffer()), 0, 0);
        surface.damage_buffer(0, 0, self.width, self.height);
        surface.commit();

        self.dirty = false;
    }

    /// Drop the surface and its buffers; the compositor unmaps it on flush.
    pub fn release_surface(&mut self) {
        self.layer = None;
        self.pool = None;
        self.width = 0;
        self.height = 0;
    }
}
