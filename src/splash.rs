use crate::animation::{Animation, LOOP_FRAME_INTERVAL, looping_frame};
use crate::config::ProfileOptions;
use crate::diagnostic::Diagnostic;
use crate::drawing::Scene;
use crate::sequencer::Shell;
use crate::wayland::{WaylandSession, setup_layer_surface};
use eyre::{Result, bail};
use std::time::Instant;

/// Configure events to wait for before giving up on the surface.
const CONFIGURE_RETRIES: usize = 30;

/// Full-screen progress overlay on a Wayland output.
pub struct WaylandSplash {
    session: WaylandSession,
    shown_at: Option<Instant>,
}

impl WaylandSplash {
    /// Prepare the splash. Animation frames are decoded here, before the
    /// first launch; one that fails to load is left out.
    pub fn create(mut session: WaylandSession, options: &ProfileOptions) -> Result<Self> {
        let animation = options.animation.as_ref().and_then(|reference| {
            match Animation::load(reference) {
                Ok(animation) => Some(animation),
                Err(e) => {
                    let diagnostic = Diagnostic::AnimationLoad {
                        path: reference.path.clone(),
                        reason: e.to_string(),
                    };
                    log::warn!("{}", diagnostic);
                    None
                }
            }
        });

        session.app.scene = Some(Scene::new(options.clone(), animation));
        Ok(Self {
            session,
            shown_at: None,
        })
    }

    fn animation(&self) -> Option<&Animation> {
        self.session.app.scene.as_ref()?.animation.as_ref()
    }

    fn advance_loop(&mut self) {
        let Some(shown_at) = self.shown_at else {
            return;
        };
        let Some(scene) = self.session.app.scene.as_mut() else {
            return;
        };
        let Some(animation) = scene.animation.as_ref().filter(|a| a.is_looping()) else {
            return;
        };

        let frame = looping_frame(shown_at.elapsed(), LOOP_FRAME_INTERVAL, animation.len());
        if frame != scene.frame {
            scene.frame = frame;
            self.session.app.dirty = true;
        }
    }
}

impl Shell for WaylandSplash {
    fn show(&mut self) -> Result<()> {
        let qh = self.session.event_queue.handle();
        let output = self.session.target_output().map(|(output, _)| output);

        let (pool, layer) = setup_layer_surface(&mut self.session.app, output.as_ref(), &qh)?;
        self.session.app.pool = Some(pool);
        self.session.app.layer = Some(layer);
        self.session.app.bound_output = output;
        self.session.conn.flush()?;

        self.session.wait_for_configure(CONFIGURE_RETRIES)?;
        if !self.session.app.is_configured() {
            self.session.app.release_surface();
            bail!("compositor never configured the splash surface");
        }

        self.session.app.draw();
        self.session.conn.flush()?;
        self.shown_at = Some(Instant::now());
        Ok(())
    }

    fn frame_count(&self) -> Option<usize> {
        self.animation()
            .filter(|a| !a.is_looping() && !a.is_empty())
            .map(Animation::len)
    }

    fn update(&mut self, percent: f64, frame: Option<usize>) {
        let Some(scene) = self.session.app.scene.as_mut() else {
            return;
        };
        scene.percent = percent;
        if let Some(frame) = frame {
            scene.frame = frame;
        }
        self.session.app.dirty = true;
    }

    fn pump(&mut self) {
        self.advance_loop();

        if let Err(e) = self.session.dispatch_nonblocking() {
            log::warn!("Lost the compositor connection: {}", e);
            self.session.app.release_surface();
            self.session.app.closed = true;
            return;
        }

        let app = &mut self.session.app;
        if app.dirty && app.is_configured() && !app.closed {
            app.draw();
            if let Err(e) = self.session.conn.flush() {
                log::debug!("Flush failed: {}", e);
            }
        }
    }

    fn is_alive(&self) -> bool {
        !self.session.app.closed
    }

    fn close(&mut self) {
        self.session.app.release_surface();
        if let Err(e) = self.session.conn.flush() {
            log::debug!("Flush failed: {}", e);
        }
        log::info!("Splash screen closed");
    }
}
