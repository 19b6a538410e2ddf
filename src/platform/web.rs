//! Browser embedding
//!
//! Mounts a field into a container element: creates the canvas and hover hint,
//! wires pointer listeners and a ResizeObserver, and drives frames from
//! `requestAnimationFrame`. Everything it installs is removed again in `destroy`.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use web_sys::{
    CanvasRenderingContext2d, Element, EventTarget, HtmlCanvasElement, HtmlElement, ImageData,
    MediaQueryList, MouseEvent, ResizeObserver,
};

use crate::consts::DEFAULT_WIDTH;
use crate::field::{BlockField, Tooltip};
use crate::renderer::{DrawList, Raster, RenderState};
use crate::settings::Settings;

const DARK_QUERY: &str = "(prefers-color-scheme: dark)";
const TOOLTIP_STYLE: &str = "position:absolute;pointer-events:none;user-select:none;\
    background:rgba(0,0,0,0.75);color:#fff;padding:4px 12px;border-radius:4px;\
    font-size:14px;opacity:0.9;backdrop-filter:blur(4px);white-space:nowrap;";

/// Set up panic reporting and console logging (safe to call repeatedly)
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// How frames reach the canvas
enum Presenter {
    /// GPU still initialising; frames are simulated but not shown
    Pending,
    Gpu(RenderState),
    Canvas2d {
        ctx: CanvasRenderingContext2d,
        raster: Raster,
    },
    /// Torn down
    Closed,
}

impl Presenter {
    fn present(&mut self, list: &DrawList) {
        match self {
            Presenter::Gpu(render_state) => match render_state.render(list) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost) => {
                    render_state.resize(render_state.size.0, render_state.size.1);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of memory!");
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            },
            Presenter::Canvas2d { ctx, raster } => {
                raster.paint(list);
                let image = ImageData::new_with_u8_clamped_array_and_sh(
                    Clamped(raster.as_rgba()),
                    raster.width(),
                    raster.height(),
                );
                match image {
                    Ok(image) => {
                        if let Err(e) = ctx.put_image_data(&image, 0.0, 0.0) {
                            log::warn!("putImageData failed: {:?}", e);
                        }
                    }
                    Err(e) => log::warn!("ImageData failed: {:?}", e),
                }
            }
            Presenter::Pending | Presenter::Closed => {}
        }
    }
}

/// A DOM listener we own and must remove on teardown
struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

impl Listener {
    fn install(
        target: &EventTarget,
        kind: &'static str,
        handler: impl FnMut(web_sys::Event) + 'static,
    ) -> Result<Self, JsValue> {
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
        target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            kind,
            closure,
        })
    }

    fn remove(&self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}

/// Shared state behind a mounted handle
struct Host {
    field: RefCell<BlockField>,
    container: HtmlElement,
    canvas: RefCell<HtmlCanvasElement>,
    tooltip: Element,
    loading: Option<Element>,
    presenter: RefCell<Presenter>,
    dark_query: Option<MediaQueryList>,
    listeners: RefCell<Vec<Listener>>,
    resize_observer: RefCell<Option<(ResizeObserver, Closure<dyn FnMut(js_sys::Array)>)>>,
    /// Latest observed width, applied at the next frame (coalesces resize bursts)
    pending_width: Cell<Option<f32>>,
    raf_closure: RefCell<Option<Closure<dyn FnMut(f64)>>>,
    raf_id: Cell<Option<i32>>,
}

impl Host {
    fn container_width(&self) -> Option<f32> {
        let width = self.container.client_width();
        (width > 0).then_some(width as f32)
    }

    fn prefers_dark(&self) -> Option<bool> {
        self.dark_query.as_ref().map(MediaQueryList::matches)
    }

    /// Size the canvas backing store; the GPU path renders at device resolution
    fn size_canvas(&self, gpu: bool) -> (u32, u32) {
        let Some(size) = self.field.borrow().size() else {
            return (0, 0);
        };
        let dpr = if gpu {
            web_sys::window().map(|w| w.device_pixel_ratio()).unwrap_or(1.0)
        } else {
            1.0
        };
        let width = (size.x as f64 * dpr).round() as u32;
        let height = (size.y as f64 * dpr).round() as u32;
        let canvas = self.canvas.borrow();
        canvas.set_width(width.max(1));
        canvas.set_height(height.max(1));
        let style = canvas.style();
        let _ = style.set_property("width", "100%");
        let _ = style.set_property("height", &format!("{}px", size.y));
        let _ = style.set_property("display", "block");
        (width, height)
    }

    fn on_frame(&self, now_ms: f64) {
        if let Some(width) = self.pending_width.take() {
            let rebuilt = self.field.borrow_mut().resize(Some(width));
            if rebuilt {
                let gpu = matches!(*self.presenter.borrow(), Presenter::Gpu(_));
                let (w, h) = self.size_canvas(gpu);
                if let Presenter::Gpu(render_state) = &mut *self.presenter.borrow_mut() {
                    render_state.resize(w, h);
                }
            }
        }

        let frame = {
            let mut field = self.field.borrow_mut();
            let theme = field.theme(self.prefers_dark());
            field.frame(now_ms, theme)
        };
        if let Some(frame) = frame {
            self.presenter.borrow_mut().present(&frame.draw_list);
        }
    }

    fn show_tooltip(&self, tooltip: Option<Tooltip>) {
        match tooltip {
            Some(tip) => {
                self.tooltip.set_inner_html(&tip.markup());
                let style = format!(
                    "{}left:{}px;top:{}px;display:block;",
                    TOOLTIP_STYLE, tip.position.x, tip.position.y
                );
                let _ = self.tooltip.set_attribute("style", &style);
            }
            None => {
                let _ = self
                    .tooltip
                    .set_attribute("style", &format!("{}display:none;", TOOLTIP_STYLE));
            }
        }
    }

    fn mark_ready(&self) {
        if let Some(loading) = &self.loading {
            let _ = loading.set_attribute("hidden", "");
        }
    }

    fn request_frame(&self) {
        if !self.field.borrow().is_mounted() {
            return;
        }
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Some(closure) = self.raf_closure.borrow().as_ref() {
            match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
                Ok(id) => self.raf_id.set(Some(id)),
                Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
            }
        }
    }

    fn destroy(&self) {
        if !self.field.borrow().is_mounted() {
            return;
        }
        self.field.borrow_mut().destroy();

        if let (Some(window), Some(id)) = (web_sys::window(), self.raf_id.take()) {
            let _ = window.cancel_animation_frame(id);
        }
        self.raf_closure.borrow_mut().take();

        for listener in self.listeners.borrow_mut().drain(..) {
            listener.remove();
        }
        if let Some((observer, _closure)) = self.resize_observer.borrow_mut().take() {
            observer.disconnect();
        }

        *self.presenter.borrow_mut() = Presenter::Closed;
        self.canvas.borrow().remove();
        self.tooltip.remove();
        log::info!("Block field unmounted");
    }
}

/// Handle returned to JavaScript; dropping or destroying it unmounts the field
#[wasm_bindgen]
pub struct BlockFieldHandle {
    host: Rc<Host>,
}

#[wasm_bindgen]
impl BlockFieldHandle {
    /// Mount into the element with id `container_id`
    ///
    /// An element with id `{container_id}-loading`, if present, is hidden once
    /// the first renderer is ready.
    pub fn mount(container_id: &str) -> Result<BlockFieldHandle, JsValue> {
        init_logging();
        let settings = Settings::load();
        mount_with(container_id, settings).map(|host| BlockFieldHandle { host })
    }

    /// Stop the loop, remove listeners and the canvas
    pub fn destroy(&self) {
        self.host.destroy();
    }

    #[wasm_bindgen(getter)]
    pub fn mounted(&self) -> bool {
        self.host.field.borrow().is_mounted()
    }

    /// Simulated frames per second
    #[wasm_bindgen(getter)]
    pub fn fps(&self) -> u32 {
        self.host.field.borrow().stats().map(|s| s.fps).unwrap_or(0)
    }
}

impl Drop for BlockFieldHandle {
    fn drop(&mut self) {
        self.host.destroy();
    }
}

fn js_err(msg: &str) -> JsValue {
    JsValue::from_str(msg)
}

fn create_canvas(document: &web_sys::Document) -> Result<HtmlCanvasElement, JsValue> {
    document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| js_err("created element is not a canvas"))
}

fn mount_with(container_id: &str, settings: Settings) -> Result<Rc<Host>, JsValue> {
    let window = web_sys::window().ok_or_else(|| js_err("no window"))?;
    let document = window.document().ok_or_else(|| js_err("no document"))?;
    let container: HtmlElement = document
        .get_element_by_id(container_id)
        .ok_or_else(|| js_err("block field container not found"))?
        .dyn_into()
        .map_err(|_| js_err("block field container is not an HTML element"))?;

    let width = container.client_width();
    let width = (width > 0).then_some(width as f32);
    if width.is_none() {
        log::warn!("Container has no width yet, using {} px", DEFAULT_WIDTH);
    }

    let seed = js_sys::Date::now() as u64;
    let field = BlockField::mount(width, settings, seed);

    let _ = container.style().set_property("position", "relative");
    let _ = container.style().set_property("cursor", "pointer");
    let canvas = create_canvas(&document)?;
    container.append_child(&canvas)?;
    let tooltip = document.create_element("div")?;
    container.append_child(&tooltip)?;

    let dark_query = window.match_media(DARK_QUERY).ok().flatten();
    let loading = document.get_element_by_id(&format!("{}-loading", container_id));

    let host = Rc::new(Host {
        field: RefCell::new(field),
        container,
        canvas: RefCell::new(canvas),
        tooltip,
        loading,
        presenter: RefCell::new(Presenter::Pending),
        dark_query,
        listeners: RefCell::new(Vec::new()),
        resize_observer: RefCell::new(None),
        pending_width: Cell::new(None),
        raf_closure: RefCell::new(None),
        raf_id: Cell::new(None),
    });
    host.show_tooltip(None);
    host.size_canvas(true);

    install_pointer_listeners(&host)?;
    install_resize_observer(&host)?;
    start_loop(&host);

    let weak = Rc::downgrade(&host);
    wasm_bindgen_futures::spawn_local(async move {
        init_presenter(weak).await;
    });

    Ok(host)
}

fn install_pointer_listeners(host: &Rc<Host>) -> Result<(), JsValue> {
    let target: EventTarget = host.canvas.borrow().clone().into();
    let mut listeners = Vec::new();

    // Click starts a wave
    {
        let weak = Rc::downgrade(host);
        listeners.push(Listener::install(&target, "click", move |event| {
            let (Some(host), Some(event)) = (weak.upgrade(), event.dyn_ref::<MouseEvent>()) else {
                return;
            };
            let accepted = host
                .field
                .borrow_mut()
                .click(event.offset_x() as f32, event.offset_y() as f32);
            if accepted {
                event.prevent_default();
            }
        })?);
    }

    // Hover hint follows the pointer
    {
        let weak = Rc::downgrade(host);
        listeners.push(Listener::install(&target, "mousemove", move |event| {
            let (Some(host), Some(event)) = (weak.upgrade(), event.dyn_ref::<MouseEvent>()) else {
                return;
            };
            let tooltip = {
                let mut field = host.field.borrow_mut();
                field.pointer_move(event.offset_x() as f32, event.offset_y() as f32);
                field.tooltip()
            };
            host.show_tooltip(tooltip);
        })?);
    }

    {
        let weak = Rc::downgrade(host);
        listeners.push(Listener::install(&target, "mouseleave", move |_event| {
            if let Some(host) = weak.upgrade() {
                host.field.borrow_mut().pointer_leave();
                host.show_tooltip(None);
            }
        })?);
    }

    host.listeners.borrow_mut().extend(listeners);
    Ok(())
}

fn install_resize_observer(host: &Rc<Host>) -> Result<(), JsValue> {
    let weak = Rc::downgrade(host);
    let closure = Closure::<dyn FnMut(js_sys::Array)>::new(move |_entries: js_sys::Array| {
        if let Some(host) = weak.upgrade() {
            // Applied on the next animation frame
            let width = host.container_width().unwrap_or(0.0);
            host.pending_width.set(Some(width));
        }
    });
    let observer = ResizeObserver::new(closure.as_ref().unchecked_ref())?;
    observer.observe(&host.container);
    *host.resize_observer.borrow_mut() = Some((observer, closure));
    Ok(())
}

fn start_loop(host: &Rc<Host>) {
    let weak: Weak<Host> = Rc::downgrade(host);
    let closure = Closure::<dyn FnMut(f64)>::new(move |now_ms: f64| {
        let Some(host) = weak.upgrade() else {
            return;
        };
        host.raf_id.set(None);
        host.on_frame(now_ms);
        host.request_frame();
    });
    *host.raf_closure.borrow_mut() = Some(closure);
    host.request_frame();
}

/// Bring up WebGPU, or fall back to a 2D canvas fed by the software raster
async fn init_presenter(weak: Weak<Host>) {
    let Some(host) = weak.upgrade() else {
        return;
    };
    let canvas = host.canvas.borrow().clone();
    let (width, height) = (canvas.width(), canvas.height());
    drop(host);

    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::BROWSER_WEBGPU,
        ..Default::default()
    });

    let gpu = match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas)) {
        Ok(surface) => {
            match instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::LowPower,
                    compatible_surface: Some(&surface),
                    force_fallback_adapter: false,
                })
                .await
            {
                Ok(adapter) => {
                    log::info!("Using adapter: {:?}", adapter.get_info().name);
                    RenderState::new(surface, &adapter, width, height)
                        .await
                        .map_err(|e| log::warn!("WebGPU device unavailable: {}", e))
                        .ok()
                }
                Err(e) => {
                    log::warn!("No WebGPU adapter: {}", e);
                    None
                }
            }
        }
        Err(e) => {
            log::warn!("WebGPU surface unavailable: {}", e);
            None
        }
    };

    // The field may have been unmounted while we were waiting
    let Some(host) = weak.upgrade() else {
        return;
    };
    if !host.field.borrow().is_mounted() {
        return;
    }

    let presenter = match gpu {
        Some(render_state) => Presenter::Gpu(render_state),
        None => match canvas_fallback(&host) {
            Ok(presenter) => presenter,
            Err(e) => {
                log::error!("Canvas fallback failed: {:?}", e);
                return;
            }
        },
    };
    *host.presenter.borrow_mut() = presenter;
    host.mark_ready();
}

fn canvas_fallback(host: &Host) -> Result<Presenter, JsValue> {
    log::info!("Falling back to 2D canvas rendering");
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| js_err("no document"))?;

    // A canvas that handed out a WebGPU context cannot give a 2D one
    let fresh = create_canvas(&document)?;
    {
        let old = host.canvas.borrow();
        old.replace_with_with_node_1(&fresh)?;
    }
    let old = host.canvas.replace(fresh);

    // Listeners were bound to the old canvas
    let mut listeners = host.listeners.borrow_mut();
    let target: EventTarget = host.canvas.borrow().clone().into();
    let old_target: EventTarget = old.into();
    for listener in listeners.iter_mut() {
        if listener.target == old_target {
            listener.remove();
            listener.target.clone_from(&target);
            target.add_event_listener_with_callback(
                listener.kind,
                listener.closure.as_ref().unchecked_ref(),
            )?;
        }
    }
    drop(listeners);

    let (width, height) = host.size_canvas(false);
    let ctx = host
        .canvas
        .borrow()
        .get_context("2d")?
        .ok_or_else(|| js_err("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| js_err("not a 2d context"))?;
    Ok(Presenter::Canvas2d {
        ctx,
        raster: Raster::new(width, height),
    })
}
