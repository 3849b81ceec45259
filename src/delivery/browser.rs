//! Delivery in the browser.
//!
//! The save picker and the clipboard are asynchronous and may be missing
//! or denied; both are looked up at runtime so older browsers fall back
//! cleanly to an anchor download or a manual text selection.

use js_sys::{Array, Function, Object, Promise, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, HtmlTextAreaElement, Url};

use super::{DeliveryError, DeliveryPlan, DeliveryReport, DeliveryStrategy};
use crate::format::ExportOutput;

/// Browser delivery settings.
#[derive(Debug, Clone, Default)]
pub struct BrowserDelivery {
    /// Id of a `<textarea>` used for manual copying.
    pub manual_copy_target: Option<String>,
}

/// Run `plan` in the browser, stopping at the first success.
pub async fn deliver_in_browser(
    settings: &BrowserDelivery,
    plan: &DeliveryPlan,
    output: &ExportOutput,
) -> DeliveryReport {
    let mut report = DeliveryReport::new(plan);
    for &strategy in &plan.strategies {
        let result = match strategy {
            DeliveryStrategy::SavePicker => save_with_picker(output).await,
            DeliveryStrategy::Download => download(output),
            DeliveryStrategy::Clipboard => write_clipboard(&output.content).await,
            DeliveryStrategy::ManualCopy => manual_copy(settings, output),
            DeliveryStrategy::Preview => open_preview(output),
        };
        match result {
            Ok(location) => {
                report.succeeded(strategy, location);
                break;
            }
            Err(DeliveryError::Cancelled) => {
                report.failed(strategy, &DeliveryError::Cancelled);
                break;
            }
            Err(e) => report.failed(strategy, &e),
        }
    }
    log::info!("{}", report.status);
    report
}

fn window() -> Result<web_sys::Window, DeliveryError> {
    web_sys::window().ok_or_else(|| DeliveryError::Unsupported("no window".to_string()))
}

fn js_error(value: JsValue) -> DeliveryError {
    let name = Reflect::get(&value, &JsValue::from_str("name"))
        .ok()
        .and_then(|n| n.as_string())
        .unwrap_or_default();
    match name.as_str() {
        "AbortError" => DeliveryError::Cancelled,
        "NotAllowedError" | "SecurityError" => DeliveryError::Blocked(name),
        _ => DeliveryError::Blocked(format!("{:?}", value)),
    }
}

/// Look up `object[name]` as a function.
fn method(object: &JsValue, name: &str) -> Result<Function, DeliveryError> {
    Reflect::get(object, &JsValue::from_str(name))
        .ok()
        .and_then(|f| f.dyn_into::<Function>().ok())
        .ok_or_else(|| DeliveryError::Unsupported(format!("{} is not available", name)))
}

async fn call_async(
    this: &JsValue,
    name: &str,
    args: &[JsValue],
) -> Result<JsValue, DeliveryError> {
    let function = method(this, name)?;
    let array: Array = args.iter().collect();
    let promise = function.apply(this, &array).map_err(js_error)?;
    let promise: Promise = promise
        .dyn_into()
        .map_err(|_| DeliveryError::Unsupported(format!("{} did not return a promise", name)))?;
    JsFuture::from(promise).await.map_err(js_error)
}

async fn save_with_picker(output: &ExportOutput) -> Result<String, DeliveryError> {
    let window: JsValue = window()?.into();

    let options = Object::new();
    Reflect::set(
        &options,
        &JsValue::from_str("suggestedName"),
        &JsValue::from_str(&output.filename),
    )
    .map_err(js_error)?;

    let handle = call_async(&window, "showSaveFilePicker", &[options.into()]).await?;
    let writable = call_async(&handle, "createWritable", &[]).await?;
    call_async(&writable, "write", &[JsValue::from_str(&output.content)]).await?;
    call_async(&writable, "close", &[]).await?;
    Ok(output.filename.clone())
}

async fn write_clipboard(text: &str) -> Result<String, DeliveryError> {
    let navigator: JsValue = window()?.navigator().into();
    let clipboard = Reflect::get(&navigator, &JsValue::from_str("clipboard"))
        .ok()
        .filter(|c| !c.is_undefined() && !c.is_null())
        .ok_or_else(|| DeliveryError::Unsupported("clipboard is not available".to_string()))?;
    call_async(&clipboard, "writeText", &[JsValue::from_str(text)]).await?;
    Ok(String::new())
}

fn object_url(output: &ExportOutput) -> Result<String, DeliveryError> {
    let parts: Array = std::iter::once(JsValue::from_str(&output.content)).collect();
    let options = BlobPropertyBag::new();
    options.set_type(&format!("{};charset=utf-8", output.content_type));
    let blob = Blob::new_with_str_sequence_and_options(&parts, &options).map_err(js_error)?;
    Url::create_object_url_with_blob(&blob).map_err(js_error)
}

fn download(output: &ExportOutput) -> Result<String, DeliveryError> {
    let document = window()?
        .document()
        .ok_or_else(|| DeliveryError::Unsupported("no document".to_string()))?;
    let url = object_url(output)?;

    let anchor: HtmlAnchorElement = document
        .create_element("a")
        .map_err(js_error)?
        .dyn_into()
        .map_err(|_| DeliveryError::Unsupported("cannot create a link".to_string()))?;
    anchor.set_href(&url);
    anchor.set_download(&output.filename);
    anchor.click();

    revoke_later(url);
    Ok(output.filename.clone())
}

/// Delay before a download's object URL is released.
const REVOKE_DELAY_MS: i32 = 30_000;

/// Release `url` once the browser has had time to start the download.
///
/// Revoking right after `click()` can abort the download in Firefox and Safari.
fn revoke_later(url: String) {
    let revoke = Closure::once_into_js(move || {
        if let Err(e) = Url::revoke_object_url(&url) {
            log::debug!("Failed to revoke object URL: {:?}", e);
        }
    });
    let scheduled = web_sys::window().map(|w| {
        w.set_timeout_with_callback_and_timeout_and_arguments_0(
            revoke.unchecked_ref(),
            REVOKE_DELAY_MS,
        )
    });
    if !matches!(scheduled, Some(Ok(_))) {
        log::debug!("Could not schedule object URL release");
    }
}

fn manual_copy(settings: &BrowserDelivery, output: &ExportOutput) -> Result<String, DeliveryError> {
    let id = settings
        .manual_copy_target
        .as_deref()
        .ok_or_else(|| DeliveryError::Unsupported("no text area for manual copy".to_string()))?;
    let area: HtmlTextAreaElement = window()?
        .document()
        .and_then(|d| d.get_element_by_id(id))
        .and_then(|e| e.dyn_into().ok())
        .ok_or_else(|| DeliveryError::Unsupported(format!("#{} is not a text area", id)))?;
    area.set_value(&output.content);
    area.select();
    Ok(output.filename.clone())
}

fn open_preview(output: &ExportOutput) -> Result<String, DeliveryError> {
    let url = object_url(output)?;
    match window()?.open_with_url_and_target(&url, "_blank") {
        Ok(Some(_)) => Ok(output.filename.clone()),
        Ok(None) => Err(DeliveryError::Blocked("the preview window was blocked".to_string())),
        Err(e) => Err(js_error(e)),
    }
}
