//! Finish Dash entry point
//!
//! In the browser this drives the frame loop: measure, tick, hand the renderer
//! a snapshot. Natively it runs a headless demo across a set of device shapes.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use web_sys::{Element, HtmlElement, KeyboardEvent, PointerEvent, Window};

    use finish_dash::assets::StaticMetrics;
    use finish_dash::layout::{LayoutConfig, LayoutPublisher};
    use finish_dash::platform::FrameClock;
    use finish_dash::platform::web::{apply_layout, read_surface};
    use finish_dash::sim::{
        GameState, RenderSnapshot, SpawnSequence, TickContext, TickInput, tick,
    };
    use finish_dash::tuning::Tuning;

    // Host page contract: optional JSON overrides on `globalThis`, an optional
    // `__playableAssetsReady` promise, and a `__playableRender(snapshot)`
    // callback invoked once per frame.
    fn host_global(name: &str) -> Option<JsValue> {
        js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str(name))
            .ok()
            .filter(|v| !v.is_undefined() && !v.is_null())
    }

    fn read_host_json(name: &str) -> String {
        let Some(value) = host_global(name) else {
            return String::new();
        };
        if let Some(s) = value.as_string() {
            return s;
        }
        js_sys::JSON::stringify(&value)
            .ok()
            .and_then(|s| s.as_string())
            .unwrap_or_default()
    }

    fn publish_frame(json: &str) {
        let Some(render) = host_global("__playableRender")
            .and_then(|v| v.dyn_into::<js_sys::Function>().ok())
        else {
            return;
        };
        let payload = match js_sys::JSON::parse(json) {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("Snapshot JSON rejected: {:?}", e);
                return;
            }
        };
        if let Err(e) = render.call1(&JsValue::NULL, &payload) {
            log::warn!("Render callback threw: {:?}", e);
        }
    }

    /// Everything the frame loop owns
    struct Game {
        state: GameState,
        publisher: LayoutPublisher,
        tuning: Tuning,
        metrics: StaticMetrics,
        clock: FrameClock,
        input: TickInput,
        root: Option<HtmlElement>,
    }

    impl Game {
        fn frame(&mut self, window: &Window, time: f64) {
            let dt = self.clock.advance(time);

            let root_el: Option<&Element> = self.root.as_ref().map(|r| r.as_ref());
            let published = self.publisher.on_frame(|| read_surface(window, root_el));
            if let (Some(layout), Some(root)) = (published, &self.root) {
                apply_layout(root, &layout);
            }

            let layout = self.publisher.current();
            let ctx = TickContext {
                layout: &layout,
                tuning: &self.tuning,
                metrics: &self.metrics,
            };
            let input = self.input.clone();
            tick(&mut self.state, &input, &ctx, dt);

            // One-shot inputs are consumed by the tick
            self.input.primary = false;
            self.input.restart = false;

            let snapshot =
                RenderSnapshot::capture(&self.state, &layout, self.tuning.max_health, &self.metrics);
            match snapshot.to_json() {
                Ok(json) => publish_frame(&json),
                Err(e) => log::error!("Failed to serialize snapshot: {}", e),
            }
        }
    }

    /// Parse an optional host override, falling back to defaults on error
    fn load_override<T>(name: &str, parse: impl FnOnce(&str) -> finish_dash::ConfigResult<T>) -> Option<T> {
        let json = read_host_json(name);
        if json.is_empty() {
            return None;
        }
        match parse(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Ignoring {}: {}", name, e);
                None
            }
        }
    }

    fn load_metrics() -> StaticMetrics {
        let json = read_host_json("__playableAssetSizes");
        if json.is_empty() {
            return StaticMetrics::new();
        }
        match serde_json::from_str::<HashMap<String, [f32; 2]>>(&json) {
            Ok(sizes) => StaticMetrics::from_manifest(sizes.iter().map(|(k, v)| (k.as_str(), *v))),
            Err(e) => {
                log::warn!("Ignoring asset sizes: {}", e);
                StaticMetrics::new()
            }
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Finish Dash starting...");

        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            log::error!("No document; nothing to attach to");
            return;
        };

        let root: Option<HtmlElement> = document
            .get_element_by_id("playable-root")
            .or_else(|| document.document_element())
            .and_then(|el| el.dyn_into::<HtmlElement>().ok());

        let tuning = load_override("__playableTuning", Tuning::from_json).unwrap_or_default();
        let config =
            load_override("__playableLayoutConfig", LayoutConfig::from_json).unwrap_or_default();
        let sequence =
            load_override("__playableSpawnSequence", SpawnSequence::from_json).unwrap_or_default();
        let metrics = load_metrics();

        let initial = read_surface(&window, root.as_ref().map(|r| r.as_ref()));
        let publisher = LayoutPublisher::new(config, &initial);
        if let Some(root) = &root {
            apply_layout(root, &publisher.current());
        }

        let state = GameState::new(&tuning, sequence);
        let game = Rc::new(RefCell::new(Game {
            state,
            publisher,
            tuning,
            metrics,
            clock: FrameClock::default(),
            input: TickInput::default(),
            root,
        }));

        setup_input_handlers(&window, game.clone());
        setup_resize_handlers(&window, game.clone());
        setup_visibility_handler(&window, game.clone());

        request_animation_frame(window, game.clone());

        // Frames publish the loading phase until the host's assets are decoded
        if let Some(promise) =
            host_global("__playableAssetsReady").and_then(|v| v.dyn_into::<js_sys::Promise>().ok())
        {
            if let Err(e) = wasm_bindgen_futures::JsFuture::from(promise).await {
                log::warn!("Asset loading reported an error: {:?}", e);
            }
        }
        let mut g = game.borrow_mut();
        g.metrics = load_metrics();
        g.state.finish_loading();
        log::info!("Finish Dash running!");
    }

    fn setup_input_handlers(window: &Window, game: Rc<RefCell<Game>>) {
        // Tap / click anywhere
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                if event.is_primary() {
                    game.borrow_mut().input.primary = true;
                }
            });
            let _ = window
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.repeat() {
                    return;
                }
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    " " | "Enter" | "ArrowUp" => g.input.primary = true,
                    "r" | "R" => g.input.restart = true,
                    "a" | "A" => {
                        g.input.autopilot = !g.input.autopilot;
                        log::info!("Autopilot: {}", g.input.autopilot);
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // End-screen CTA owned by the overlay
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().input.restart = true;
            });
            let _ = window.add_event_listener_with_callback(
                "playable:restart",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }
    }

    fn setup_resize_handlers(window: &Window, game: Rc<RefCell<Game>>) {
        let notify = {
            let game = game.clone();
            Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().publisher.request_measure();
            })
        };
        for event in ["resize", "orientationchange"] {
            let _ = window.add_event_listener_with_callback(event, notify.as_ref().unchecked_ref());
        }
        if let Some(viewport) = window.visual_viewport() {
            for event in ["resize", "scroll"] {
                let _ =
                    viewport.add_event_listener_with_callback(event, notify.as_ref().unchecked_ref());
            }
        }
        notify.forget();
    }

    fn setup_visibility_handler(window: &Window, game: Rc<RefCell<Game>>) {
        let Some(document) = window.document() else {
            return;
        };
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if document_clone.visibility_state() == web_sys::VisibilityState::Visible {
                // Don't count the time spent hidden as one giant frame
                let mut g = game.borrow_mut();
                g.clock.reset();
                g.publisher.request_measure();
            }
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(window: Window, game: Rc<RefCell<Game>>) {
        let next = window.clone();
        let closure = Closure::once(move |time: f64| {
            game.borrow_mut().frame(&next, time);
            request_animation_frame(next, game);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Finish Dash (native) starting...");

    // Optional: finish-dash [tuning.json]
    let tuning = match std::env::args().nth(1) {
        Some(path) => finish_dash::Tuning::from_json(&std::fs::read_to_string(&path)?)?,
        None => finish_dash::Tuning::default(),
    };

    demo::run(&tuning);
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use finish_dash::assets::FallbackMetrics;
    use finish_dash::consts::REFERENCE_FPS;
    use finish_dash::layout::{LayoutConfig, SurfaceMeasurement, measure};
    use finish_dash::sim::{GameState, RunPhase, SpawnSequence, TickContext, TickInput, tick};
    use finish_dash::tuning::Tuning;

    /// (name, CSS width, CSS height)
    const DEVICES: [(&str, f32, f32); 6] = [
        ("phone portrait", 390.0, 844.0),
        ("phone landscape", 844.0, 390.0),
        ("tablet portrait", 820.0, 1180.0),
        ("laptop", 1440.0, 900.0),
        ("desktop wide", 1920.0, 1080.0),
        ("ultrawide", 2560.0, 1080.0),
    ];

    /// Ten simulated minutes is far beyond any scripted run
    const MAX_TICKS: u32 = 60 * 60 * 10;

    pub fn run(tuning: &Tuning) {
        let config = LayoutConfig::default();

        println!(
            "\n{:<16} {:>18} {:>7} {:>12} {:>8} {:>8} {:>9}",
            "device", "bucket", "scale", "camera", "lead", "ticks", "outcome"
        );
        for (name, w, h) in DEVICES {
            let layout = measure(&SurfaceMeasurement::from_size(w, h), &config);
            let ctx = TickContext {
                layout: &layout,
                tuning,
                metrics: &FallbackMetrics,
            };

            let mut state = GameState::new(tuning, SpawnSequence::default());
            state.finish_loading();
            let input = TickInput {
                autopilot: true,
                ..Default::default()
            };

            let dt = 1.0 / REFERENCE_FPS;
            let mut ticks = 0;
            while ticks < MAX_TICKS && !matches!(state.phase, RunPhase::Ended(_)) {
                tick(&mut state, &input, &ctx, dt);
                ticks += 1;
            }

            println!(
                "{:<16} {:>18} {:>7.3} {:>12} {:>8.0} {:>8} {:>9}",
                name,
                layout.bucket.as_str(),
                layout.camera_transform.scale,
                format!("{:.0}x{:.0}", layout.camera_view.width, layout.camera_view.height),
                layout.gameplay_tokens.spawn_lead_px,
                ticks,
                state.phase.as_str(),
            );
            log::info!(
                "{}: traveled {:.0}, earnings {:.0}, health {}",
                name,
                state.traveled,
                state.earnings,
                state.player.health
            );
        }
    }
}
