//! Browser host for the demos.
//!
//! `launch("fan", "canvas")` fetches the demo's assets, attaches a wgpu
//! surface to the canvas and drives the demo from `requestAnimationFrame`.
//! Buttons carrying a `data-trigger` attribute and a `<select id="mode">`
//! are forwarded to the demo.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, Document, HtmlCanvasElement, HtmlSelectElement, MouseEvent, WheelEvent};

use crate::app::{App, Runner};
use crate::core::{now_seconds, Context, Error, RenderConfig};
use crate::demos;

type Shared = Rc<RefCell<Box<dyn Runner>>>;
type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// `requestAnimationFrame` loop that can be paused and resumed.
#[derive(Clone)]
struct FrameLoop {
    callback: FrameCallback,
    running: Rc<Cell<bool>>,
    // A frame request is outstanding.
    pending: Rc<Cell<bool>>,
}

impl FrameLoop {
    fn new(runner: Shared) -> Self {
        let frame_loop = Self {
            callback: Rc::new(RefCell::new(None)),
            running: Rc::new(Cell::new(true)),
            pending: Rc::new(Cell::new(false)),
        };
        let next = frame_loop.clone();
        *frame_loop.callback.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp_ms: f64| {
            next.pending.set(false);
            if !next.running.get() {
                return;
            }
            if let Ok(mut runner) = runner.try_borrow_mut() {
                runner.frame(timestamp_ms / 1000.0);
            }
            if let Err(err) = next.request() {
                log::error!("requestAnimationFrame: {:?}", err);
            }
        }) as Box<dyn FnMut(f64)>));
        frame_loop
    }

    fn request(&self) -> Result<(), JsValue> {
        if self.pending.get() {
            return Ok(());
        }
        let window = window().ok_or_else(|| JsValue::from_str("no window object"))?;
        if let Some(callback) = self.callback.borrow().as_ref() {
            window.request_animation_frame(callback.as_ref().unchecked_ref())?;
            self.pending.set(true);
        }
        Ok(())
    }

    fn start(&self) -> Result<(), JsValue> {
        self.running.set(true);
        self.request()
    }

    fn stop(&self) {
        self.running.set(false);
    }
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn unavailable(reason: &str) -> JsValue {
    js_error(Error::ContextUnavailable(reason.to_owned()))
}

/// A running demo, returned to JavaScript by [`launch`].
#[wasm_bindgen]
pub struct DemoHandle {
    runner: Shared,
    frame_loop: FrameLoop,
}

#[wasm_bindgen]
impl DemoHandle {
    /// Demo name.
    #[wasm_bindgen(getter)]
    pub fn name(&self) -> String {
        self.runner.borrow().name().to_string()
    }

    /// Resume the frame loop.
    pub fn start(&self) -> Result<(), JsValue> {
        self.frame_loop.start()
    }

    /// Stop the frame loop after the current frame.
    pub fn stop(&self) {
        self.frame_loop.stop();
    }

    /// Whether the frame loop is running.
    #[wasm_bindgen(getter)]
    pub fn running(&self) -> bool {
        self.frame_loop.running.get()
    }

    /// Forward a named action, as the `data-trigger` buttons do.
    pub fn trigger(&self, name: &str) -> bool {
        self.runner.borrow_mut().trigger(name)
    }

    /// Forward a select value.
    pub fn select(&self, value: &str) -> Result<(), JsValue> {
        self.runner.borrow_mut().select(value).map_err(js_error)
    }
}

/// Start demo `demo` on the canvas with id `canvas_id`.
///
/// `config` is an optional JSON object overriding the demo's defaults.
#[wasm_bindgen]
pub async fn launch(demo: &str, canvas_id: &str, config: Option<String>) -> Result<DemoHandle, JsValue> {
    let window = window().ok_or_else(|| unavailable("no window object"))?;
    let document = window.document().ok_or_else(|| unavailable("no document"))?;

    let canvas: HtmlCanvasElement = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| unavailable(&format!("canvas '{}' not found", canvas_id)))?
        .dyn_into()
        .map_err(|_| unavailable(&format!("'{}' is not a canvas", canvas_id)))?;

    let (width, height) = fit_canvas(&canvas);
    let demo = demos::load(demo, config.as_deref()).await.map_err(js_error)?;

    let ctx = Context::new(
        wgpu::SurfaceTarget::Canvas(canvas.clone()),
        width,
        height,
        &RenderConfig::default(),
    )
    .await
    .map_err(|err| js_error(Error::from(err)))?;

    let app = App::new(ctx, demo).await.map_err(js_error)?;
    let runner: Box<dyn Runner> = Box::new(app);
    let runner: Shared = Rc::new(RefCell::new(runner));

    listen_canvas(&canvas, &runner)?;
    listen_controls(&document, &runner)?;
    listen_resize(&canvas, &runner)?;

    let frame_loop = FrameLoop::new(runner.clone());
    frame_loop.start()?;

    Ok(DemoHandle { runner, frame_loop })
}

/// Size the backing store to the CSS size times the pixel ratio.
fn fit_canvas(canvas: &HtmlCanvasElement) -> (u32, u32) {
    let dpr = window().map(|w| w.device_pixel_ratio()).unwrap_or(1.0);
    let width = ((canvas.client_width() as f64 * dpr) as u32).max(1);
    let height = ((canvas.client_height() as f64 * dpr) as u32).max(1);
    canvas.set_width(width);
    canvas.set_height(height);
    (width, height)
}

fn pixel_ratio() -> f32 {
    window().map(|w| w.device_pixel_ratio() as f32).unwrap_or(1.0)
}

fn on<E: JsCast + 'static>(
    target: &web_sys::EventTarget,
    event: &str,
    runner: &Shared,
    handler: impl Fn(&mut dyn Runner, E) + 'static,
) -> Result<(), JsValue> {
    let runner = runner.clone();
    let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
        let Ok(event) = event.dyn_into::<E>() else {
            return;
        };
        let Ok(mut runner) = runner.try_borrow_mut() else {
            return;
        };
        handler(&mut **runner, event);
    }) as Box<dyn FnMut(_)>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn listen_canvas(canvas: &HtmlCanvasElement, runner: &Shared) -> Result<(), JsValue> {
    let position = |event: &MouseEvent| {
        let dpr = pixel_ratio();
        (event.offset_x() as f32 * dpr, event.offset_y() as f32 * dpr)
    };

    on(canvas, "pointerdown", runner, move |runner, event: MouseEvent| {
        if event.button() == 0 {
            let (x, y) = position(&event);
            runner.pointer_down(x, y);
        }
    })?;
    on(canvas, "pointermove", runner, move |runner, event: MouseEvent| {
        let (x, y) = position(&event);
        runner.pointer_move(x, y);
    })?;
    on(canvas, "pointerup", runner, |runner, _: MouseEvent| runner.pointer_up())?;
    on(canvas, "pointerleave", runner, |runner, _: MouseEvent| runner.pointer_up())?;
    on(canvas, "click", runner, |runner, _: MouseEvent| runner.click())?;
    on(canvas, "wheel", runner, |runner, event: WheelEvent| {
        event.prevent_default();
        runner.wheel(event.delta_y() as f32);
    })?;
    Ok(())
}

fn listen_controls(document: &Document, runner: &Shared) -> Result<(), JsValue> {
    let buttons = document.query_selector_all("[data-trigger]")?;
    for i in 0..buttons.length() {
        let Some(button) = buttons.item(i) else {
            continue;
        };
        let Ok(element) = button.dyn_into::<web_sys::Element>() else {
            continue;
        };
        let Some(name) = element.get_attribute("data-trigger") else {
            continue;
        };
        on(&element, "click", runner, move |runner, _: web_sys::Event| {
            runner.trigger(&name);
        })?;
    }

    if let Some(select) = document.get_element_by_id("mode") {
        let select: HtmlSelectElement = select
            .dyn_into()
            .map_err(|_| JsValue::from_str("#mode is not a select"))?;
        let source = select.clone();
        on(&select, "change", runner, move |runner, _: web_sys::Event| {
            if let Err(err) = runner.select(&source.value()) {
                log::warn!("{}", err);
            }
        })?;
    }
    Ok(())
}

fn listen_resize(canvas: &HtmlCanvasElement, runner: &Shared) -> Result<(), JsValue> {
    let window = window().ok_or_else(|| JsValue::from_str("no window object"))?;
    let canvas = canvas.clone();
    on(&window, "resize", runner, move |runner, _: web_sys::Event| {
        let (width, height) = fit_canvas(&canvas);
        runner.resize(width, height);
    })
}

/// Seconds on the page clock, for hosts driving frames by hand.
#[wasm_bindgen(js_name = nowSeconds)]
pub fn page_seconds() -> f64 {
    now_seconds()
}
