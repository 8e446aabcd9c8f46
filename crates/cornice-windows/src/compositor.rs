//! The DirectComposition renderer.
//!
//! Owns the D3D11/D2D/DirectComposition device stack, a persistent
//! virtual-screen-sized surface, and the visual tree bound to the
//! overlay host window. One instance lives on the UI thread for the
//! whole session; the surface is recreated when the virtual screen
//! resizes or after repeated begin-draw failures.

use cornice_core::{Config, Rect, RedrawPlan, redraw};
use windows::Win32::Foundation::{HMODULE, HWND, POINT, RECT};
use windows::Win32::Graphics::Direct2D::Common::{D2D1_COLOR_F, D2D1_PIXEL_FORMAT, D2D_RECT_F};
use windows::Win32::Graphics::Direct2D::{
    D2D1_ANTIALIAS_MODE_ALIASED, D2D1_ANTIALIAS_MODE_PER_PRIMITIVE,
    D2D1_BITMAP_OPTIONS_CANNOT_DRAW, D2D1_BITMAP_OPTIONS_TARGET, D2D1_BITMAP_PROPERTIES1,
    D2D1_DEVICE_CONTEXT_OPTIONS_NONE, D2D1_FACTORY_TYPE_SINGLE_THREADED, D2D1_ROUNDED_RECT,
    D2D1CreateFactory, ID2D1Bitmap1, ID2D1Device, ID2D1DeviceContext, ID2D1Factory1, ID2D1Image,
};
use windows::Win32::Graphics::Direct3D::{
    D3D_DRIVER_TYPE_HARDWARE, D3D_DRIVER_TYPE_WARP, D3D_FEATURE_LEVEL, D3D_FEATURE_LEVEL_10_0,
    D3D_FEATURE_LEVEL_10_1, D3D_FEATURE_LEVEL_11_0, D3D_FEATURE_LEVEL_11_1,
};
use windows::Win32::Graphics::Direct3D11::{
    D3D11_CREATE_DEVICE_BGRA_SUPPORT, D3D11_SDK_VERSION, D3D11CreateDevice, ID3D11Device,
};
use windows::Win32::Graphics::DirectComposition::{
    DCompositionCreateDevice, IDCompositionDevice, IDCompositionSurface, IDCompositionTarget,
    IDCompositionVisual,
};
use windows::Win32::Graphics::Dxgi::Common::{DXGI_ALPHA_MODE_PREMULTIPLIED, DXGI_FORMAT_B8G8R8A8_UNORM};
use windows::Win32::Graphics::Dxgi::{
    DXGI_ERROR_DEVICE_REMOVED, DXGI_ERROR_DEVICE_RESET, IDXGIDevice, IDXGISurface,
};
use windows::core::Interface;
use windows_numerics::Matrix3x2;

/// `D2DERR_RECREATE_TARGET`: the D2D device is unusable and must be
/// rebuilt.
const D2DERR_RECREATE_TARGET: windows::core::HRESULT = windows::core::HRESULT(0x8899000Cu32 as i32);

/// Which device creation stage failed. The service maps these to the
/// process exit codes.
#[derive(Debug)]
pub enum CreateError {
    D3D(windows::core::Error),
    D2D(windows::core::Error),
    Composition(windows::core::Error),
}

impl std::fmt::Display for CreateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::D3D(e) => write!(f, "D3D11 device creation failed: {e}"),
            Self::D2D(e) => write!(f, "D2D device creation failed: {e}"),
            Self::Composition(e) => write!(f, "composition device creation failed: {e}"),
        }
    }
}

impl std::error::Error for CreateError {}

/// Consecutive begin-draw failures tolerated before the surface is
/// rebuilt.
const MAX_BEGIN_DRAW_FAILURES: u32 = 3;

/// The composition device stack and visual tree.
///
/// Field order is teardown order: the surface releases before the
/// visuals, the visuals before the target, the target before the
/// devices. That is the reverse of construction.
pub struct Compositor {
    surface: Option<IDCompositionSurface>,
    surface_visual: IDCompositionVisual,
    _root_visual: IDCompositionVisual,
    _target: IDCompositionTarget,
    comp: IDCompositionDevice,
    dc: ID2D1DeviceContext,
    _d2d_device: ID2D1Device,
    _d2d_factory: ID2D1Factory1,
    _dxgi: IDXGIDevice,
    _d3d: ID3D11Device,
    surface_w: i32,
    surface_h: i32,
    begin_draw_failures: u32,
}

impl Compositor {
    /// Builds the full device stack against the overlay window.
    pub fn new(hwnd: HWND) -> Result<Self, CreateError> {
        let d3d = create_d3d_device().map_err(CreateError::D3D)?;
        let dxgi: IDXGIDevice = d3d.cast().map_err(CreateError::D3D)?;

        // SAFETY: device creation calls with valid inputs; each result
        // is checked.
        let (d2d_factory, d2d_device, dc) = unsafe {
            let factory: ID2D1Factory1 =
                D2D1CreateFactory(D2D1_FACTORY_TYPE_SINGLE_THREADED, None)
                    .map_err(CreateError::D2D)?;
            let device = factory.CreateDevice(&dxgi).map_err(CreateError::D2D)?;
            let dc = device
                .CreateDeviceContext(D2D1_DEVICE_CONTEXT_OPTIONS_NONE)
                .map_err(CreateError::D2D)?;
            (factory, device, dc)
        };

        // SAFETY: composition tree construction; the target keeps the
        // root alive, parents keep children.
        let (comp, target, root_visual, surface_visual) = unsafe {
            let comp: IDCompositionDevice =
                DCompositionCreateDevice(&dxgi).map_err(CreateError::Composition)?;
            let target = comp
                .CreateTargetForHwnd(hwnd, true)
                .map_err(CreateError::Composition)?;
            let root = comp.CreateVisual().map_err(CreateError::Composition)?;
            let surface_visual = comp.CreateVisual().map_err(CreateError::Composition)?;
            target.SetRoot(&root).map_err(CreateError::Composition)?;
            root.AddVisual(&surface_visual, false, None)
                .map_err(CreateError::Composition)?;
            comp.Commit().map_err(CreateError::Composition)?;
            (comp, target, root, surface_visual)
        };

        Ok(Self {
            surface: None,
            surface_visual,
            _root_visual: root_visual,
            _target: target,
            comp,
            dc,
            _d2d_device: d2d_device,
            _d2d_factory: d2d_factory,
            _dxgi: dxgi,
            _d3d: d3d,
            surface_w: 0,
            surface_h: 0,
            begin_draw_failures: 0,
        })
    }

    /// Current surface size, for redraw planning. Zero before the
    /// first draw.
    pub fn surface_size(&self) -> (i32, i32) {
        (self.surface_w, self.surface_h)
    }

    /// Drops the surface so the next draw recreates it at the current
    /// virtual-screen size. Called on display/DPI changes.
    pub fn invalidate_surface(&mut self) {
        self.surface = None;
        self.surface_w = 0;
        self.surface_h = 0;
    }

    fn ensure_surface(&mut self, width: i32, height: i32) -> windows::core::Result<()> {
        if width <= 0 || height <= 0 {
            return Err(windows::core::Error::from_hresult(
                windows::Win32::Foundation::E_INVALIDARG,
            ));
        }
        if self.surface.is_some() && (self.surface_w != width || self.surface_h != height) {
            self.surface = None;
        }
        if self.surface.is_none() {
            // SAFETY: surface creation and attachment to the visual.
            unsafe {
                let surface = self.comp.CreateSurface(
                    width as u32,
                    height as u32,
                    DXGI_FORMAT_B8G8R8A8_UNORM,
                    DXGI_ALPHA_MODE_PREMULTIPLIED,
                )?;
                self.surface_visual.SetContent(&surface)?;
                self.surface = Some(surface);
            }
            self.surface_w = width;
            self.surface_h = height;
        }
        Ok(())
    }

    /// Runs one draw cycle over the snapshot rectangles (already in
    /// overlay-local coordinates).
    ///
    /// A failed begin-draw drops the frame; the third consecutive
    /// failure rebuilds the surface. Any other device error bubbles
    /// up so the engine can decide whether the device is lost.
    pub fn draw(
        &mut self,
        rects: &[Rect],
        config: &Config,
        plan: RedrawPlan,
        surface_w: i32,
        surface_h: i32,
    ) -> windows::core::Result<()> {
        if matches!(plan, RedrawPlan::Skip) {
            return Ok(());
        }
        self.ensure_surface(surface_w, surface_h)?;
        let Some(surface) = self.surface.clone() else {
            return Ok(());
        };

        let update = match plan {
            RedrawPlan::Partial(dirty) => dirty,
            _ => Rect::new(0, 0, self.surface_w, self.surface_h),
        };
        let update_rect = RECT {
            left: update.left,
            top: update.top,
            right: update.right,
            bottom: update.bottom,
        };

        let mut offset = POINT::default();
        // SAFETY: BeginDraw hands back the DXGI surface backing the
        // update rect; EndDraw below releases the draw lock.
        let dxgi_surface: IDXGISurface = match unsafe {
            surface.BeginDraw(Some(&update_rect as *const RECT), &mut offset)
        } {
            Ok(s) => s,
            Err(e) => {
                self.begin_draw_failures += 1;
                cornice_core::log_warn!(
                    "begin draw failed ({}/{MAX_BEGIN_DRAW_FAILURES}): {e}",
                    self.begin_draw_failures
                );
                if self.begin_draw_failures >= MAX_BEGIN_DRAW_FAILURES {
                    self.invalidate_surface();
                    self.begin_draw_failures = 0;
                }
                return Ok(());
            }
        };
        self.begin_draw_failures = 0;

        let partial = matches!(plan, RedrawPlan::Partial(_));
        let result = self.draw_into(&dxgi_surface, &update, offset, partial, rects, config);

        // SAFETY: the surface draw lock must be released even when the
        // D2D pass failed; Commit publishes the frame.
        unsafe {
            self.dc.SetTarget(None::<&ID2D1Image>);
            surface.EndDraw()?;
            self.comp.Commit()?;
        }

        result
    }

    fn draw_into(
        &self,
        dxgi_surface: &IDXGISurface,
        update: &Rect,
        offset: POINT,
        partial: bool,
        rects: &[Rect],
        config: &Config,
    ) -> windows::core::Result<()> {
        let props = D2D1_BITMAP_PROPERTIES1 {
            pixelFormat: D2D1_PIXEL_FORMAT {
                format: DXGI_FORMAT_B8G8R8A8_UNORM,
                alphaMode: windows::Win32::Graphics::Direct2D::Common::D2D1_ALPHA_MODE_PREMULTIPLIED,
            },
            dpiX: 96.0,
            dpiY: 96.0,
            bitmapOptions: D2D1_BITMAP_OPTIONS_TARGET | D2D1_BITMAP_OPTIONS_CANNOT_DRAW,
            ..Default::default()
        };

        // SAFETY: D2D drawing into the bitmap wrapping the surface
        // atlas region handed out by BeginDraw. Every fallible call
        // happens outside the BeginDraw/EndDraw bracket so the context
        // can never be left mid-draw.
        unsafe {
            let bitmap: ID2D1Bitmap1 = self
                .dc
                .CreateBitmapFromDxgiSurface(dxgi_surface, Some(&props))?;
            let (r, g, b, a) = config.color.to_f32();
            let brush_color = D2D1_COLOR_F { r, g, b, a };
            let brush = self.dc.CreateSolidColorBrush(&brush_color, None)?;

            self.dc.SetTarget(&bitmap);
            self.dc.BeginDraw();
            self.dc.SetAntialiasMode(D2D1_ANTIALIAS_MODE_PER_PRIMITIVE);

            // BeginDraw points at an atlas location, not at the
            // surface origin: translate so overlay-local coordinates
            // land in the update region.
            let dx = (offset.x - update.left) as f32;
            let dy = (offset.y - update.top) as f32;
            self.dc.SetTransform(&Matrix3x2::translation(dx, dy));

            // Erase the update region. Clear honors an active
            // axis-aligned clip, which doubles as the guarantee that a
            // partial pass cannot touch pixels outside the dirty rect.
            let update_rf = D2D_RECT_F {
                left: update.left as f32,
                top: update.top as f32,
                right: update.right as f32,
                bottom: update.bottom as f32,
            };
            if partial {
                self.dc
                    .PushAxisAlignedClip(&update_rf, D2D1_ANTIALIAS_MODE_ALIASED);
            }
            self.dc.Clear(Some(&transparent()));

            let merged;
            let to_draw: &[Rect] = if config.merge_overlapping {
                merged = redraw::merge_overlapping(rects);
                &merged
            } else {
                rects
            };

            let radius = config.corner.radius();
            for rect in to_draw {
                let rf = D2D_RECT_F {
                    left: rect.left as f32,
                    top: rect.top as f32,
                    right: rect.right as f32,
                    bottom: rect.bottom as f32,
                };
                if config.corner.is_rounded() {
                    let rounded = D2D1_ROUNDED_RECT {
                        rect: rf,
                        radiusX: radius,
                        radiusY: radius,
                    };
                    self.dc
                        .DrawRoundedRectangle(&rounded, &brush, config.thickness, None);
                } else {
                    self.dc.DrawRectangle(&rf, &brush, config.thickness, None);
                }
            }

            if partial {
                self.dc.PopAxisAlignedClip();
            }

            self.dc.EndDraw(None, None)?;
        }
        Ok(())
    }
}

/// Whether an error means the device stack must be rebuilt rather
/// than the frame retried.
pub fn is_device_lost(error: &windows::core::Error) -> bool {
    let code = error.code();
    code == DXGI_ERROR_DEVICE_REMOVED || code == DXGI_ERROR_DEVICE_RESET || code == D2DERR_RECREATE_TARGET
}

fn transparent() -> D2D1_COLOR_F {
    D2D1_COLOR_F {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    }
}

/// Hardware D3D11 device with BGRA support, WARP as fallback so the
/// overlay still works without a GPU.
fn create_d3d_device() -> windows::core::Result<ID3D11Device> {
    const LEVELS: [D3D_FEATURE_LEVEL; 4] = [
        D3D_FEATURE_LEVEL_11_1,
        D3D_FEATURE_LEVEL_11_0,
        D3D_FEATURE_LEVEL_10_1,
        D3D_FEATURE_LEVEL_10_0,
    ];

    let mut device = None;
    // SAFETY: standard device creation; out parameters are checked via
    // the Result and the Option below.
    let hardware = unsafe {
        D3D11CreateDevice(
            None,
            D3D_DRIVER_TYPE_HARDWARE,
            HMODULE::default(),
            D3D11_CREATE_DEVICE_BGRA_SUPPORT,
            Some(&LEVELS),
            D3D11_SDK_VERSION,
            Some(&mut device),
            None,
            None,
        )
    };

    if hardware.is_err() {
        device = None;
        unsafe {
            D3D11CreateDevice(
                None,
                D3D_DRIVER_TYPE_WARP,
                HMODULE::default(),
                D3D11_CREATE_DEVICE_BGRA_SUPPORT,
                Some(&LEVELS),
                D3D11_SDK_VERSION,
                Some(&mut device),
                None,
                None,
            )?;
        }
    }

    device.ok_or_else(|| {
        windows::core::Error::from_hresult(windows::Win32::Foundation::E_FAIL)
    })
}

