//! Browser bindings.
//!
//! [`WebSession`] wraps a [`Session`] for JavaScript hosts. The drawing is
//! mounted into a container element and clicks on it go through the same
//! selection controller as the native build, driving a [`BrowserSurface`]
//! over the live DOM.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::{Function, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event};

use crate::config::AppConfig;
use crate::delivery::{BrowserDelivery, DeliveryAction, DeliveryPlan, deliver_in_browser};
use crate::format::FormatRegistry;
use crate::model::FieldUpdate;
use crate::state::Session;
use crate::storage::{LocalStorage, MemoryStorage, StorageBackend};
use crate::svg::SvgSurface;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    let level = AppConfig::load_from_local_storage()
        .unwrap_or_default()
        .preferences
        .log_level;
    let level = level.to_level_filter().to_level().unwrap_or(log::Level::Info);
    if let Err(e) = console_log::init_with_level(level) {
        web_sys::console::log_1(&format!("Logger already initialised: {}", e).into());
    }
    log::info!("SVAT WASM started");
}

/// The mounted `<svg>` element as an [`SvgSurface`].
pub struct BrowserSurface {
    root: Element,
}

impl BrowserSurface {
    /// Wrap a mounted root element.
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// The root element.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Element a click landed on; text nodes resolve to their parent.
    pub fn target_element(event: &Event) -> Option<Element> {
        let target = event.target()?;
        match target.dyn_into::<Element>() {
            Ok(element) => Some(element),
            Err(other) => other
                .dyn_into::<web_sys::Node>()
                .ok()
                .and_then(|node| node.parent_element()),
        }
    }
}

impl SvgSurface for BrowserSurface {
    type Node = Element;

    fn parent_element(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn is_root(&self, node: &Element) -> bool {
        *node == self.root
    }

    fn local_name(&self, node: &Element) -> Option<String> {
        Some(node.local_name())
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&mut self, node: &Element, name: &str, value: &str) {
        if let Err(e) = node.set_attribute(name, value) {
            log::warn!("Failed to set {} on <{}>: {:?}", name, node.local_name(), e);
        }
    }

    fn remove_attribute(&mut self, node: &Element, name: &str) {
        if let Err(e) = node.remove_attribute(name) {
            log::warn!("Failed to remove {} from <{}>: {:?}", name, node.local_name(), e);
        }
    }

    fn query_selector(&self, selector: &str) -> Option<Element> {
        match self.root.query_selector(selector) {
            Ok(found) => found,
            Err(e) => {
                log::debug!("Selector '{}' rejected: {:?}", selector, e);
                None
            }
        }
    }
}

struct WebState {
    session: Session<Box<dyn StorageBackend>>,
    config: AppConfig,
    registry: FormatRegistry,
    container_id: String,
    surface: Option<BrowserSurface>,
    click_handler: Option<Closure<dyn FnMut(Event)>>,
    on_select: Option<Function>,
}

impl WebState {
    /// Render the loaded markup into the container and bind clicks.
    fn mount(&mut self, this: &Weak<RefCell<WebState>>) -> Result<(), JsValue> {
        self.unmount();
        let Some(markup) = self.session.document().map(|d| d.markup.clone()) else {
            return Ok(());
        };

        let container = self.container()?;
        self.apply_container_style(&container)?;
        container.set_inner_html(&markup);
        let root = container
            .query_selector("svg")?
            .ok_or_else(|| JsValue::from_str("Mounted markup has no <svg> root"))?;

        let weak = this.clone();
        let handler = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let Some(target) = BrowserSurface::target_element(&event) else {
                return;
            };
            let notify = {
                let mut state = state.borrow_mut();
                let WebState {
                    session,
                    surface,
                    on_select,
                    ..
                } = &mut *state;
                let Some(surface) = surface.as_mut() else {
                    return;
                };
                session
                    .click_on(surface, &target)
                    .map(|key| (key, on_select.clone()))
            };
            if let Some((key, Some(callback))) = notify {
                if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(&key)) {
                    log::warn!("Selection callback failed: {:?}", e);
                }
            }
        });
        root.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())?;

        self.surface = Some(BrowserSurface::new(root));
        self.click_handler = Some(handler);
        Ok(())
    }

    fn container(&self) -> Result<Element, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("No document available"))?;
        document
            .get_element_by_id(&self.container_id)
            .ok_or_else(|| JsValue::from_str(&format!("No element #{}", self.container_id)))
    }

    fn apply_container_style(&self, container: &Element) -> Result<(), JsValue> {
        container.set_attribute(
            "style",
            &format!("max-width: {};", self.config.preferences.max_width),
        )
    }

    fn unmount(&mut self) {
        if let (Some(surface), Some(handler)) = (self.surface.take(), self.click_handler.take()) {
            if let Err(e) = surface
                .root()
                .remove_event_listener_with_callback("click", handler.as_ref().unchecked_ref())
            {
                log::debug!("Failed to unbind click handler: {:?}", e);
            }
        }
    }
}

/// Annotation session bound to a container element.
#[wasm_bindgen]
pub struct WebSession {
    state: Rc<RefCell<WebState>>,
}

#[wasm_bindgen]
impl WebSession {
    /// Restore the saved session and mount it into `#container_id`.
    #[wasm_bindgen(constructor)]
    pub fn new(container_id: &str) -> Result<WebSession, JsValue> {
        let storage: Box<dyn StorageBackend> = match LocalStorage::open() {
            Ok(storage) => Box::new(storage),
            Err(e) => {
                log::warn!("Session will not be saved: {}", e);
                Box::new(MemoryStorage::new())
            }
        };

        let state = Rc::new(RefCell::new(WebState {
            session: Session::restore(storage),
            config: AppConfig::load_from_local_storage().unwrap_or_default(),
            registry: FormatRegistry::new(),
            container_id: container_id.to_string(),
            surface: None,
            click_handler: None,
            on_select: None,
        }));
        state.borrow_mut().mount(&Rc::downgrade(&state))?;
        Ok(WebSession { state })
    }

    /// Replace the document with uploaded text.
    #[wasm_bindgen(js_name = loadSvg)]
    pub fn load_svg(&self, name: &str, text: &str) -> Result<(), JsValue> {
        let mut state = self.state.borrow_mut();
        state.unmount();
        let loaded = state
            .session
            .load_svg(Some(name), text)
            .map(|_| ())
            .map_err(|e| JsValue::from_str(&e.to_string()));
        // On error the previous document is still loaded and is shown again
        state.mount(&Rc::downgrade(&self.state))?;
        loaded
    }

    /// Called with the key whenever a click selects an element.
    #[wasm_bindgen(js_name = onSelect)]
    pub fn on_select(&self, callback: Function) {
        self.state.borrow_mut().on_select = Some(callback);
    }

    /// Keys of interactive elements.
    pub fn keys(&self) -> Vec<String> {
        self.state
            .borrow()
            .session
            .document()
            .map(|d| d.keys.clone())
            .unwrap_or_default()
    }

    /// Currently selected key.
    #[wasm_bindgen(js_name = selectedKey)]
    pub fn selected_key(&self) -> Option<String> {
        self.state.borrow().session.selected_key().map(str::to_string)
    }

    /// Select by key.
    pub fn select(&self, key: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let WebState {
            session, surface, ..
        } = &mut *state;
        surface
            .as_mut()
            .is_some_and(|surface| session.select_on(surface, key))
    }

    /// Clear the selection.
    pub fn deselect(&self) {
        let mut state = self.state.borrow_mut();
        let WebState {
            session, surface, ..
        } = &mut *state;
        match surface.as_mut() {
            Some(surface) => session.deselect_on(surface),
            None => session.deselect(),
        }
    }

    /// Annotation of `key` as JSON.
    pub fn annotation(&self, key: &str) -> Result<String, JsValue> {
        let annotation = self.state.borrow().session.annotation(key);
        serde_json::to_string(&annotation).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// All annotations as JSON.
    pub fn annotations(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.state.borrow().session.annotations())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Set the label of `key`.
    #[wasm_bindgen(js_name = setTitle)]
    pub fn set_title(&self, key: &str, title: &str) -> bool {
        self.state
            .borrow_mut()
            .session
            .set_fields(key, FieldUpdate::new().title(title))
    }

    /// Set the notes of `key`.
    #[wasm_bindgen(js_name = setDescription)]
    pub fn set_description(&self, key: &str, description: &str) -> bool {
        self.state
            .borrow_mut()
            .session
            .set_fields(key, FieldUpdate::new().description(description))
    }

    /// Append a comment; returns its id, or nothing for blank text.
    #[wasm_bindgen(js_name = addComment)]
    pub fn add_comment(&self, key: &str, text: &str) -> Option<String> {
        self.state
            .borrow_mut()
            .session
            .append_comment(key, text)
            .map(|c| c.id)
    }

    /// Delete a comment.
    #[wasm_bindgen(js_name = deleteComment)]
    pub fn delete_comment(&self, key: &str, comment_id: &str) -> bool {
        self.state
            .borrow_mut()
            .session
            .delete_comment(key, comment_id)
    }

    /// Remove every annotation.
    #[wasm_bindgen(js_name = clearAll)]
    pub fn clear_all(&self) {
        self.state.borrow_mut().session.clear_all();
    }

    /// Current value of a preference.
    pub fn preference(&self, key: &str) -> Option<String> {
        self.state.borrow().config.preferences.get(key)
    }

    /// Change a preference, save the configuration and apply it to the page.
    #[wasm_bindgen(js_name = setPreference)]
    pub fn set_preference(&self, key: &str, value: &str) -> Result<(), JsValue> {
        let mut state = self.state.borrow_mut();
        state
            .config
            .preferences
            .set(key, value)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        state
            .config
            .save_to_local_storage()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        match key {
            "log_level" => log::set_max_level(state.config.preferences.log_level.to_level_filter()),
            "max_width" => state.apply_container_style(&state.container()?)?,
            _ => {}
        }
        Ok(())
    }

    /// Export with `format_id` and deliver it.
    ///
    /// `action` is `save`, `copy` or `preview`. Resolves to the status line.
    /// `manual_copy_target` names a `<textarea>` used when the clipboard is
    /// unavailable.
    pub fn export(
        &self,
        format_id: &str,
        action: &str,
        manual_copy_target: Option<String>,
    ) -> Result<Promise, JsValue> {
        let action = match action {
            "save" => DeliveryAction::Save,
            "copy" => DeliveryAction::Copy,
            "preview" => DeliveryAction::Preview,
            other => return Err(JsValue::from_str(&format!("Unknown action '{}'", other))),
        };

        // Taken in one borrow so the markup and annotations match
        let output = {
            let state = self.state.borrow();
            state
                .session
                .export_as(&state.registry, format_id)
                .map_err(|e| JsValue::from_str(&e.to_string()))?
        };

        let settings = BrowserDelivery { manual_copy_target };
        Ok(wasm_bindgen_futures::future_to_promise(async move {
            let plan = DeliveryPlan::for_action(action, output.content_type);
            let report = deliver_in_browser(&settings, &plan, &output).await;
            Ok(JsValue::from_str(&report.status))
        }))
    }
}
