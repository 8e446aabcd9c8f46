//! The refresh engine: one value owned by the service loop, ticked by
//! posted refresh requests and the safety timer.
//!
//! Everything here runs on the UI thread. Hook callbacks and control
//! senders only enqueue work; the engine drains it at the start of
//! each tick, so configuration reads within a tick are consistent by
//! construction.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use cornice_core::{
    Config, ControlMessage, Rect, SettingsUpdate, TrackedCache, WindowHandle, occlusion, protocol,
    redraw,
};

use crate::compositor::{self, Compositor};
use crate::enumerate;
use crate::event_hook::RefreshPoster;
use crate::monitor;
use crate::overlay::OverlayWindow;
use crate::window::Window;
use crate::{dwm_border, frame};

/// Messages the overlay wndproc forwards onto the engine inbox.
pub enum EngineMsg {
    /// A decoded control-plane message.
    Control(ControlMessage),
    /// `WM_DISPLAYCHANGE` / `WM_DPICHANGED`: the virtual screen moved
    /// under us.
    DisplayChanged,
}

/// Resolved render mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Per-window DWM border attributes.
    Dwm,
    /// The DirectComposition overlay.
    Composited,
}

/// Device-recovery backoff cap.
const MAX_DEVICE_RETRY: Duration = Duration::from_secs(2);
const INITIAL_DEVICE_RETRY: Duration = Duration::from_millis(250);

/// The border engine.
pub struct Engine {
    mode: RenderMode,
    config: Config,
    virtual_screen: Rect,
    cache: TrackedCache,
    overlay: OverlayWindow,
    compositor: Option<Compositor>,
    /// Set while the composition device is lost: next retry time and
    /// the current backoff step.
    device_retry: Option<(Instant, Duration)>,
    inbox: Receiver<EngineMsg>,
    poster: Arc<RefreshPoster>,
    /// Explicit target set installed by `HWNDS`, superseding
    /// enumeration until cleared by an empty list.
    target_override: Option<Vec<WindowHandle>>,
    /// A settings change arrived since the last draw; forces a full
    /// redraw and a region rebuild.
    style_changed: bool,
}

impl Engine {
    pub fn new(
        mode: RenderMode,
        config: Config,
        overlay: OverlayWindow,
        compositor: Option<Compositor>,
        inbox: Receiver<EngineMsg>,
        poster: Arc<RefreshPoster>,
    ) -> Self {
        Self {
            mode,
            config,
            virtual_screen: monitor::virtual_screen_bounds(),
            cache: TrackedCache::new(),
            overlay,
            compositor,
            device_retry: None,
            inbox,
            poster,
            target_override: None,
            style_changed: false,
        }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Runs one refresh tick: drain inputs, snapshot, reconcile,
    /// clip, draw. Called for every posted refresh request and every
    /// safety-timer tick; cheap when nothing changed.
    pub fn tick(&mut self) {
        // Events arriving from here on get their own refresh.
        self.poster.begin_tick();

        self.drain_inbox();
        self.recover_device_if_due();

        let snapshot = self.take_snapshot();
        let diff = self.cache.reconcile(&snapshot);

        match self.mode {
            RenderMode::Dwm => {
                dwm_border::apply_borders(&snapshot, &mut self.cache, &self.config);
                self.style_changed = false;
            }
            RenderMode::Composited => self.render(&snapshot, &diff),
        }
    }

    fn take_snapshot(&self) -> enumerate::Snapshot {
        if let Some(targets) = &self.target_override {
            return enumerate::snapshot_of_targets(
                targets,
                &self.virtual_screen,
                self.config.foreground_only,
            );
        }
        match enumerate::snapshot(&self.virtual_screen, self.config.foreground_only) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                cornice_core::log_warn!("window enumeration failed: {e}");
                Vec::new()
            }
        }
    }

    fn render(&mut self, snapshot: &enumerate::Snapshot, diff: &cornice_core::DiffReport) {
        let Some(comp) = self.compositor.as_mut() else {
            return; // device lost, waiting for recovery
        };

        let (mut surface_w, mut surface_h) = comp.surface_size();
        if surface_w == 0 || surface_h == 0 {
            surface_w = self.virtual_screen.width();
            surface_h = self.virtual_screen.height();
        }

        let t = occlusion::band_thickness(self.config.thickness);
        let plan = redraw::plan(
            diff.dirty_rect(t).map(|d| {
                d.translate(-self.virtual_screen.left, -self.virtual_screen.top)
            }),
            self.style_changed
                || (surface_w, surface_h)
                    != (self.virtual_screen.width(), self.virtual_screen.height()),
            surface_w,
            surface_h,
            self.config.partial_redraw_ratio,
        );
        if plan == cornice_core::RedrawPlan::Skip {
            return;
        }

        // Overlay-local coordinates: the host window sits at the
        // virtual screen origin.
        let local: Vec<Rect> = snapshot
            .iter()
            .map(|(_, rect)| {
                rect.translate(-self.virtual_screen.left, -self.virtual_screen.top)
            })
            .collect();

        let region = occlusion::build_clip_region(&local, self.config.thickness);
        self.overlay.set_region(&region);

        let result = comp.draw(
            &local,
            &self.config,
            plan,
            self.virtual_screen.width(),
            self.virtual_screen.height(),
        );

        match result {
            Ok(()) => {
                self.style_changed = false;
            }
            Err(e) if compositor::is_device_lost(&e) => {
                cornice_core::log_error!("composition device lost: {e}");
                self.compositor = None;
                self.device_retry = Some((Instant::now(), INITIAL_DEVICE_RETRY));
            }
            Err(e) => {
                // One-shot device call failed: treat the frame as lost
                // and wait for the next tick.
                cornice_core::log_warn!("frame dropped: {e}");
            }
        }
    }

    /// Applies queued control messages and display changes. Settings
    /// are applied as one whole-value replacement per message, so a
    /// tick never observes half an update.
    fn drain_inbox(&mut self) {
        while let Ok(msg) = self.inbox.try_recv() {
            match msg {
                EngineMsg::Control(ControlMessage::Settings(update)) => {
                    self.apply_settings(&update);
                }
                EngineMsg::Control(ControlMessage::Targets(handles)) => {
                    self.apply_targets(handles);
                }
                EngineMsg::DisplayChanged => self.display_changed(),
            }
        }
    }

    fn apply_settings(&mut self, update: &SettingsUpdate) {
        if update.is_empty() {
            return;
        }
        let mut config = self.config;
        if config.apply(update) {
            cornice_core::log_info!(
                "settings: color={} thickness={} corner={} foregroundonly={}",
                config.color.to_hex(),
                config.thickness,
                config.corner.as_str(),
                config.foreground_only,
            );
            self.config = config;
            self.style_changed = true;
        }
    }

    fn apply_targets(&mut self, handles: Vec<WindowHandle>) {
        if handles.is_empty() {
            if self.target_override.take().is_some() {
                cornice_core::log_info!("target override cleared");
            }
            return;
        }
        let valid = protocol::filter_targets(handles, |h| Window::from_raw(h).is_alive());
        cornice_core::log_info!("target override: {} window(s)", valid.len());
        self.target_override = Some(valid);
    }

    /// Display topology or DPI changed: follow the new virtual screen
    /// and start over with a fresh surface.
    fn display_changed(&mut self) {
        self.virtual_screen = monitor::virtual_screen_bounds();
        self.overlay.move_to(&self.virtual_screen);
        if let Some(comp) = self.compositor.as_mut() {
            comp.invalidate_surface();
        }
        self.style_changed = true;
        cornice_core::log_info!(
            "virtual screen now {}x{} at ({}, {})",
            self.virtual_screen.width(),
            self.virtual_screen.height(),
            self.virtual_screen.left,
            self.virtual_screen.top,
        );
    }

    /// Rebuilds the composition stack after device loss, with
    /// exponential backoff capped at two seconds.
    fn recover_device_if_due(&mut self) {
        if self.mode != RenderMode::Composited || self.compositor.is_some() {
            return;
        }
        let Some((due, backoff)) = self.device_retry else {
            return;
        };
        if Instant::now() < due {
            return;
        }
        match Compositor::new(self.overlay.hwnd()) {
            Ok(comp) => {
                cornice_core::log_info!("composition device recovered");
                self.compositor = Some(comp);
                self.device_retry = None;
                self.style_changed = true;
            }
            Err(e) => {
                let next = (backoff * 2).min(MAX_DEVICE_RETRY);
                cornice_core::log_warn!("device reinit failed ({e}), retrying in {next:?}");
                self.device_retry = Some((Instant::now() + next, next));
            }
        }
    }

    /// Pre-shutdown teardown: forget the tracked windows and release
    /// the composition tree. The caller has already disarmed the
    /// refresh poster and removed the event hooks.
    pub fn shutdown(&mut self) {
        self.cache.clear();
        if self.mode == RenderMode::Composited {
            self.overlay.clear_region();
        }
        // Composition objects release in reverse construction order
        // when the compositor drops; the overlay window follows.
        self.compositor = None;
    }
}

/// Resolves `auto` against the OS: native border attributes on
/// Windows 11+, the composited overlay elsewhere.
pub fn resolve_mode(preference: cornice_core::ModePreference) -> RenderMode {
    match preference {
        cornice_core::ModePreference::Dwm => RenderMode::Dwm,
        cornice_core::ModePreference::DComp => RenderMode::Composited,
        cornice_core::ModePreference::Auto => {
            if frame::supports_native_borders() {
                RenderMode::Dwm
            } else {
                RenderMode::Composited
            }
        }
    }
}
