//! Application event loop.
//!
//! [`run`] opens a window (or binds the `<canvas id="canvas">` on the web),
//! sets up the GPU and starts loading the calculator model in the background.
//! Everything else happens on the event loop thread:
//!
//! 1. Window events drive the orbit controls; a left button release is a click
//! 2. A click goes to the registered click listeners, which resolve it to a
//!    button and dispatch the name
//! 3. Each redraw moves the camera, keeps the backdrop and the click
//!    subscription in sync, and renders a frame
//!
//! The loaded model arrives as a user event. A model that fails to load ends
//! the event loop and [`run`] returns the error.

use std::{fmt::Debug, rc::Rc, sync::Arc};

use winit::{
    application::ApplicationHandler,
    event::{MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    background::BackgroundBinder,
    calculator::CalculatorModel,
    context::Context,
    data_structures::{model::Model, scene_graph::SceneNode},
    dispatch::{ButtonCallback, log_button_press},
    listener::{ClickEvent, ClickListeners},
    render::Renderer,
    resources::{self, LoadError},
    scene::SceneComposition,
};

/// GPU context, renderer and the uploaded model.
pub(crate) struct AppState {
    pub(crate) ctx: Context,
    renderer: Renderer,
    model: Option<Model>,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, composition: &SceneComposition) -> anyhow::Result<Self> {
        let ctx = Context::new(window, composition).await?;
        let renderer = Renderer::new(&ctx, composition);
        Ok(Self {
            ctx,
            renderer,
            model: None,
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.ctx.resize(width, height) {
            self.renderer.resize(&self.ctx);
            self.is_surface_configured = true;
        }
    }

    fn upload(&mut self, scene: &SceneNode) {
        let model = Model::from_scene(&self.ctx.device, scene, self.renderer.material_layout());
        log::info!("Uploaded {} meshes", model.meshes.len());
        self.model = Some(model);
    }
}

pub(crate) enum FlowEvent {
    #[cfg(target_arch = "wasm32")]
    Initialized(Box<AppState>),
    ModelLoaded(Result<SceneNode, LoadError>),
    #[cfg(target_arch = "wasm32")]
    Failed(anyhow::Error),
}

impl Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(target_arch = "wasm32")]
            Self::Initialized(_) => f.write_str("Initialized"),
            Self::ModelLoaded(Ok(scene)) => f.debug_tuple("ModelLoaded").field(&scene.name).finish(),
            Self::ModelLoaded(Err(e)) => f.debug_tuple("ModelLoaded").field(e).finish(),
            #[cfg(target_arch = "wasm32")]
            Self::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
        }
    }
}

pub(crate) struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: winit::event_loop::EventLoopProxy<FlowEvent>,
    composition: SceneComposition,
    state: Option<AppState>,
    calculator: CalculatorModel,
    listeners: ClickListeners,
    background: BackgroundBinder,
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(
        event_loop: &EventLoop<FlowEvent>,
        composition: SceneComposition,
        on_button_click: ButtonCallback,
    ) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        let background = BackgroundBinder::new(&composition.background)?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            composition,
            state: None,
            calculator: CalculatorModel::new(on_button_click),
            listeners: ClickListeners::new(),
            background,
            failure: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.failure = Some(error);
        event_loop.exit();
    }

    fn start(&mut self, mut state: AppState) {
        let size = state.ctx.window.inner_size();
        state.resize(size.width, size.height);
        state.ctx.window.request_redraw();
        self.state = Some(state);
        self.load_model();
    }

    fn load_model(&self) {
        let proxy = self.proxy.clone();
        let mount = self.composition.model.clone();
        let load = async move {
            let result = resources::load_model_gltf(&mount.asset)
                .await
                .map(|scene| resources::mount(scene, &mount));
            if proxy.send_event(FlowEvent::ModelLoaded(result)).is_err() {
                log::warn!("The event loop closed before {} finished loading", mount.asset);
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        self.async_runtime.spawn(load);

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(load);
    }

    fn click(&self) {
        let Some(state) = &self.state else {
            return;
        };
        let ctx = &state.ctx;
        let click = ClickEvent {
            x: ctx.mouse.coords.x,
            y: ctx.mouse.coords.y,
            width: ctx.config.width,
            height: ctx.config.height,
        };
        self.listeners
            .emit(&click, &ctx.camera.camera, &ctx.projection);
    }

    fn redraw(&mut self) {
        let Some(state) = &mut self.state else {
            return;
        };
        // invoke main render loop
        state.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !state.is_surface_configured {
            return;
        }

        state.ctx.update_camera();
        self.background.apply(&mut state.ctx.scene);
        self.calculator
            .sync(&self.listeners, state.ctx.camera.camera.key());

        match state.renderer.render(&state.ctx, state.model.as_ref()) {
            Ok(()) => {}
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = state.ctx.window.inner_size();
                state.resize(size.width, size.height);
            }
            Err(e) => {
                log::error!("Unable to render {}", e);
            }
        }
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("Calculator");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let canvas = web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id(CANVAS_ID));
            let Some(canvas) = canvas else {
                self.fail(event_loop, anyhow::anyhow!("no element with id `{}`", CANVAS_ID));
                return;
            };
            window_attributes = window_attributes.with_canvas(Some(canvas.unchecked_into()));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail(event_loop, e.into());
                return;
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self
                .async_runtime
                .block_on(AppState::new(window, &self.composition))
            {
                Ok(state) => self.start(state),
                Err(e) => self.fail(event_loop, e),
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            let composition = self.composition.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match AppState::new(window, &composition).await {
                    Ok(state) => FlowEvent::Initialized(Box::new(state)),
                    Err(e) => FlowEvent::Failed(e),
                };
                if proxy.send_event(event).is_err() {
                    log::warn!("The event loop closed during initialization");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            #[cfg(target_arch = "wasm32")]
            FlowEvent::Initialized(state) => self.start(*state),
            FlowEvent::ModelLoaded(Ok(scene)) => {
                if let Some(state) = &mut self.state {
                    state.upload(&scene);
                }
                self.calculator.mount(scene);
            }
            FlowEvent::ModelLoaded(Err(e)) => self.fail(
                event_loop,
                anyhow::Error::new(e).context("the calculator model could not be loaded"),
            ),
            #[cfg(target_arch = "wasm32")]
            FlowEvent::Failed(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => self.redraw(),
            WindowEvent::CursorMoved { position, .. } => {
                let ctx = &mut state.ctx;
                ctx.mouse.coords = position;
                ctx.camera.controller.handle_cursor(
                    position.x,
                    position.y,
                    &ctx.camera.camera,
                    &ctx.projection,
                    ctx.config.height,
                );
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32,
                };
                // scrolling up moves closer
                state.ctx.camera.controller.handle_scroll(-scroll);
            }
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                let ctx = &mut state.ctx;
                match (button, button_state.is_pressed()) {
                    (MouseButton::Left, true) => {
                        ctx.camera.controller.start_rotate();
                    }
                    (MouseButton::Left, false) => {
                        ctx.camera.controller.end_drag();
                        self.click();
                    }
                    (MouseButton::Right, true) => {
                        ctx.camera.controller.start_pan();
                    }
                    (MouseButton::Right, false) => {
                        ctx.camera.controller.end_drag();
                    }
                    _ => (),
                }
            }
            _ => {}
        }
    }
}

/// Show the calculator with the default scene; button presses are logged.
pub fn run() -> anyhow::Result<()> {
    run_with(SceneComposition::default(), Rc::new(log_button_press))
}

/// Show the calculator described by `composition`, calling `on_button_click`
/// with the node name of every pressed button.
pub fn run_with(composition: SceneComposition, on_button_click: ButtonCallback) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Could not initialize logger: {}", e).into());
        }
    }

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, composition, on_button_click)?;

    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
