//! Node.js bindings for the stateless helpers.
//!
//! Only pure functions are exported; the loader and template registry need a
//! document and stay on the Rust side.

use napi::bindgen_prelude::*;
use napi_derive::napi;

use crate::dom::Location;

/// Arguments may be any JS value; strings are used as-is.
#[napi]
pub fn translate(key: String, args: Option<Vec<serde_json::Value>>) -> String {
    crate::translate::translate_values(&key, &args.unwrap_or_default())
}

#[napi]
pub fn expand_template_string(template: String, data: serde_json::Value) -> Result<String> {
    match data {
        serde_json::Value::Object(map) => Ok(crate::template::expand(&template, &map)),
        _ => Err(Error::from_reason("template data must be an object")),
    }
}

#[napi]
pub fn get_cookie(cookies: String, name: String) -> Option<String> {
    crate::cookie::get_cookie(&cookies, &name)
}

#[napi]
pub fn csrf_safe_method(method: String) -> bool {
    crate::csrf::csrf_safe_method(&method)
}

/// `page_url` is the absolute URL of the current page.
#[napi]
pub fn same_origin(page_url: String, url: String) -> Result<bool> {
    let location = Location::parse(&page_url).map_err(|e| Error::from_reason(e.to_string()))?;
    Ok(crate::csrf::Origin::new(&location).same_origin(&url))
}

#[napi]
pub fn get_order_by(old_order: String, new_order: String) -> String {
    crate::ordering::get_order_by(&old_order, &new_order)
}

