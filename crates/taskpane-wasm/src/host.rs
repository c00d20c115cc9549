//! The Office.js presentation, reached through a JavaScript object.
//!
//! The taskpane passes an object whose methods wrap `PowerPoint.run`:
//!
//! ```js
//! {
//!   getSlideIds: () => Promise<string[]>,
//!   insertSlidesFromBase64: (base64, { formatting, targetSlideId, sourceSlideIds }) => Promise<void>,
//!   goToSlide: (id) => Promise<void>,
//! }
//! ```

use js_sys::{Array, Function, Object, Promise, Reflect};
use reuse_core::{host_slide_ref, Error, InsertRequest, Result, SlideHost};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

/// [`SlideHost`] backed by a JavaScript host object.
pub struct JsSlideHost {
    target: JsValue,
}

impl JsSlideHost {
    /// Wrap a host object.
    pub fn new(target: JsValue) -> Self {
        Self { target }
    }

    /// Call `name(args...)` on the host object and await the returned promise.
    async fn call(&self, name: &str, args: &Array) -> Result<JsValue> {
        let method = Reflect::get(&self.target, &JsValue::from_str(name))
            .map_err(|e| host_error(name, &e))?
            .dyn_into::<Function>()
            .map_err(|_| Error::Host(format!("host has no method '{}'", name)))?;

        let returned = method
            .apply(&self.target, args)
            .map_err(|e| host_error(name, &e))?;

        match returned.dyn_into::<Promise>() {
            Ok(promise) => JsFuture::from(promise).await.map_err(|e| host_error(name, &e)),
            Err(value) => Ok(value),
        }
    }
}

impl SlideHost for JsSlideHost {
    async fn slide_ids(&mut self) -> Result<Vec<String>> {
        let value = self.call("getSlideIds", &Array::new()).await?;
        if !Array::is_array(&value) {
            return Err(Error::Host("getSlideIds did not return an array".into()));
        }
        Array::from(&value)
            .iter()
            .map(|id| {
                id.as_string()
                    .ok_or_else(|| Error::Host("slide id is not a string".into()))
            })
            .collect()
    }

    async fn insert_slides_from_base64(&mut self, request: &InsertRequest) -> Result<()> {
        let source_ids: Array = request
            .source_slide_ids
            .iter()
            .map(|id| JsValue::from_str(&host_slide_ref(id)))
            .collect();

        let options = Object::new();
        set(&options, "formatting", &JsValue::from_str(request.formatting.as_str()))?;
        set(
            &options,
            "targetSlideId",
            &JsValue::from_str(&host_slide_ref(&request.target_slide_id)),
        )?;
        set(&options, "sourceSlideIds", &source_ids)?;

        let args = Array::of2(&JsValue::from_str(&request.base64), &options);
        self.call("insertSlidesFromBase64", &args).await?;
        Ok(())
    }

    async fn go_to_slide(&mut self, slide_id: &str) -> Result<()> {
        self.call("goToSlide", &Array::of1(&JsValue::from_str(slide_id)))
            .await?;
        Ok(())
    }
}

fn set(target: &Object, key: &str, value: &JsValue) -> Result<()> {
    Reflect::set(target, &JsValue::from_str(key), value)
        .map(|_| ())
        .map_err(|e| host_error(key, &e))
}

/// Describe a JavaScript exception or rejection.
fn host_error(context: &str, value: &JsValue) -> Error {
    let message = value
        .as_string()
        .or_else(|| {
            Reflect::get(value, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{:?}", value));
    Error::Host(format!("{}: {}", context, message))
}

#[cfg(all(target_arch = "wasm32", test))]
mod wasm_tests {
    use super::*;
    use reuse_core::{insert_and_go_to_last, Formatting, InsertOutcome};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    /// Host object that records calls and appends one slide per insert.
    fn recording_host() -> JsValue {
        js_sys::eval(
            r#"({
                ids: ["256#", "257#"],
                calls: [],
                getSlideIds() { return Promise.resolve(this.ids.slice()); },
                insertSlidesFromBase64(base64, options) {
                    this.calls.push({ base64, options });
                    this.ids.push("300#");
                    return Promise.resolve();
                },
                goToSlide(id) {
                    this.calls.push({ goTo: id });
                    return Promise.resolve();
                },
            })"#,
        )
        .expect("host object should evaluate")
    }

    fn get(target: &JsValue, path: &[&str]) -> JsValue {
        path.iter().fold(target.clone(), |value, key| {
            Reflect::get(&value, &JsValue::from_str(key)).expect("property should exist")
        })
    }

    #[wasm_bindgen_test]
    async fn wasm_insert_passes_host_options_and_navigates() {
        let target = recording_host();
        let mut host = JsSlideHost::new(target.clone());
        let request = InsertRequest {
            base64: "UEsDBA==".into(),
            target_slide_id: "257".into(),
            source_slide_ids: vec!["260".into(), "261#".into()],
            formatting: Formatting::UseDestinationTheme,
        };

        let outcome = insert_and_go_to_last(&mut host, &request).await.unwrap();
        assert_eq!(outcome, InsertOutcome::Navigated("300#".into()));

        let calls = Array::from(&get(&target, &["calls"]));
        assert_eq!(calls.length(), 2);

        let insert = calls.get(0);
        assert_eq!(get(&insert, &["base64"]).as_string().as_deref(), Some("UEsDBA=="));
        assert_eq!(
            get(&insert, &["options", "formatting"]).as_string().as_deref(),
            Some("UseDestinationTheme")
        );
        assert_eq!(
            get(&insert, &["options", "targetSlideId"]).as_string().as_deref(),
            Some("257#")
        );
        let sources: Vec<String> = Array::from(&get(&insert, &["options", "sourceSlideIds"]))
            .iter()
            .filter_map(|id| id.as_string())
            .collect();
        assert_eq!(sources, vec!["260#", "261#"]);

        assert_eq!(get(&calls.get(1), &["goTo"]).as_string().as_deref(), Some("300"));
    }

    #[wasm_bindgen_test]
    async fn wasm_missing_host_method_is_host_error() {
        let mut host = JsSlideHost::new(Object::new().into());
        let err = host.slide_ids().await.unwrap_err();
        assert!(matches!(err, Error::Host(message) if message.contains("getSlideIds")));
    }
}
