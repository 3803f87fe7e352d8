use crate::app::App;
use eyre::{Result, WrapErr, eyre};
use smithay_client_toolkit::{
    output::OutputInfo,
    shell::{
        WaylandSurface,
        wlr_layer::{Anchor, KeyboardInteractivity, Layer, LayerSurface},
    },
    shm::slot::SlotPool,
};
use wayland_client::{
    Connection, EventQueue, backend::WaylandError, globals::registry_queue_init,
    protocol::wl_output,
};
use std::io;
use std::thread;
use std::time::Duration;

const NAMESPACE: &str = "loadscreen";

/// Create a Wayland connection with retry logic
pub fn create_wayland_connection() -> Result<Connection, wayland_client::ConnectError> {
    let mut retries = 0;
    loop {
        match Connection::connect_to_env() {
            Ok(c) => return Ok(c),
            Err(_e) if retries < 10 => {
                retries += 1;
                thread::sleep(Duration::from_millis(500));
                continue;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Find the output named `target_display`, or the first output with a
/// usable size when no name is given.
pub fn find_target_output(
    app: &App,
    target_display: Option<&str>,
) -> Option<(wl_output::WlOutput, OutputInfo)> {
    for output in app.output_state.outputs() {
        let Some(info) = app.output_state.info(&output) else {
            continue;
        };
        let matches = match target_display {
            Some(target) => info.name.as_deref() == Some(target),
            None => output_dimensions(&info).is_some(),
        };
        if matches {
            log::debug!("Found target output: {}", info.name.as_deref().unwrap_or("<unnamed>"));
            return Some((output, info));
        }
    }
    None
}

/// Size of an output in the compositor's logical pixels, falling back to
/// the current mode when no logical size is advertised.
pub fn output_dimensions(info: &OutputInfo) -> Option<(i32, i32)> {
    let current_mode = info.modes.iter().find(|m| m.current).map(|m| m.dimensions);
    pick_dimensions(info.logical_size, current_mode)
}

pub fn pick_dimensions(
    logical: Option<(i32, i32)>,
    current_mode: Option<(i32, i32)>,
) -> Option<(i32, i32)> {
    let usable = |(w, h): &(i32, i32)| *w > 0 && *h > 0;
    logical.filter(usable).or(current_mode.filter(usable))
}

pub fn format_resolution((width, height): (i32, i32)) -> String {
    format!("{}x{}", width, height)
}

/// Create the full-screen overlay surface bound to `target_output`.
pub fn setup_layer_surface(
    app: &mut App,
    target_output: Option<&wl_output::WlOutput>,
    qh: &wayland_client::QueueHandle<App>,
) -> Result<(SlotPool, LayerSurface)> {
    let Some(layer_shell) = app.layer_shell.as_ref() else {
        return Err(eyre!("compositor does not support wlr-layer-shell"));
    };
    let pool = SlotPool::new(2 * 1024 * 1024, &app.shm)?;
    let surface = app.compositor_state.create_surface(qh);

    let layer = layer_shell.create_layer_surface(
        qh,
        surface,
        Layer::Overlay,
        Some(NAMESPACE),
        target_output,
    );

    layer.set_anchor(Anchor::TOP | Anchor::BOTTOM | Anchor::LEFT | Anchor::RIGHT);
    layer.set_exclusive_zone(-1);
    layer.set_keyboard_interactivity(KeyboardInteractivity::None);
    layer.commit();

    Ok((pool, layer))
}

/// A compositor connection with its output list populated.
pub struct WaylandSession {
    pub conn: Connection,
    pub event_queue: EventQueue<App>,
    pub app: App,
}

impl WaylandSession {
    pub fn connect(target_display: Option<&str>) -> Result<Self> {
        let conn = create_wayland_connection()
            .wrap_err("failed to connect to the Wayland compositor")?;
        let (globals, mut event_queue) =
            registry_queue_init(&conn).wrap_err("failed to read Wayland globals")?;
        let qh = event_queue.handle();
        let mut app = App::bind(&globals, &qh, target_display.map(str::to_string))?;

        // First roundtrip binds the outputs, the second delivers their info
        event_queue.roundtrip(&mut app)?;
        event_queue.roundtrip(&mut app)?;

        Ok(Self { conn, event_queue, app })
    }

    pub fn target_output(&self) -> Option<(wl_output::WlOutput, OutputInfo)> {
        find_target_output(&self.app, self.app.target_display_name.as_deref())
    }

    /// `WIDTHxHEIGHT` of the target output.
    pub fn resolution(&self) -> Result<String> {
        let (_, info) = self.target_output().ok_or_else(|| match &self.app.target_display_name {
            Some(name) => eyre!("output '{}' not found", name),
            None => eyre!("no output with a known size"),
        })?;
        let dimensions = output_dimensions(&info)
            .ok_or_else(|| {
                eyre!("output {} reports no size", info.name.as_deref().unwrap_or("<unnamed>"))
            })?;

        let resolution = format_resolution(dimensions);
        log::info!(
            "Window detected on output {} at resolution {}",
            info.name.as_deref().unwrap_or("<unnamed>"),
            resolution
        );
        Ok(resolution)
    }

    /// Read and dispatch whatever the compositor has sent, without blocking.
    pub fn dispatch_nonblocking(&mut self) -> Result<()> {
        self.conn.flush()?;
        if let Some(guard) = self.event_queue.prepare_read() {
            match guard.read() {
                Ok(_) => {}
                Err(WaylandError::Io(e)) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.event_queue.dispatch_pending(&mut self.app)?;
        Ok(())
    }

    /// Block until the layer surface is configured or closed.
    pub fn wait_for_configure(&mut self, retries: usize) -> Result<()> {
        for _ in 0..retries {
            if self.app.is_configured() || self.app.closed {
                break;
            }
            self.event_queue.blocking_dispatch(&mut self.app)?;
        }
        Ok(())
    }
}
