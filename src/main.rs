use std::collections::BTreeMap;
use std::io::{self, Read};
use std::process;
use std::sync::Mutex;

use admin_page_kit::{
    HttpClient, Location, MemoryDocument, PageError, PageKit, PageOptions, Request, Response,
    Transport,
};
use anyhow::{bail, Context};
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KitInput {
    location: String,
    #[serde(default)]
    cookie: String,
    #[serde(default)]
    document: DocumentInput,
    #[serde(default)]
    load: Vec<LoadInput>,
    #[serde(default)]
    templates: Vec<TemplateInput>,
    #[serde(default)]
    requests: Vec<RequestInput>,
    #[serde(default)]
    options: PageOptions,
}

/// What the page already contains before the kit runs.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DocumentInput {
    #[serde(default)]
    scripts: Vec<String>,
    #[serde(default)]
    stylesheets: Vec<String>,
    #[serde(default)]
    elements: Vec<ElementInput>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ElementInput {
    #[serde(default = "default_tag")]
    tag: String,
    id: String,
    #[serde(default)]
    html: String,
}

fn default_tag() -> String {
    "div".into()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoadInput {
    kind: String,
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TemplateInput {
    name: String,
    selector: String,
    #[serde(default)]
    data: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RequestInput {
    method: String,
    url: String,
}

#[derive(Debug, Serialize)]
struct KitOutput {
    html: String,
    expanded: BTreeMap<String, String>,
    requests: Vec<PreparedRequest>,
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
struct PreparedRequest {
    method: String,
    url: String,
    headers: BTreeMap<String, String>,
}

/// Records requests instead of sending them.
#[derive(Debug, Default)]
struct DryRun {
    sent: Mutex<Vec<Request>>,
}

impl Transport for DryRun {
    fn send(&self, request: Request) -> Result<Response, PageError> {
        self.sent
            .lock()
            .map_err(|_| PageError::Transport("dry-run log poisoned".into()))?
            .push(request);
        Ok(Response {
            status: 204,
            body: String::new(),
        })
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run() {
        eprintln!("[admin-page-kit] {:#}", err);
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let mut stdin_payload = String::new();
    io::stdin()
        .read_to_string(&mut stdin_payload)
        .context("failed to read stdin")?;

    if stdin_payload.trim().is_empty() {
        bail!("stdin payload is empty");
    }

    let input: KitInput = serde_json::from_str(&stdin_payload).context("invalid input JSON")?;
    let output = execute(input)?;

    let rendered = serde_json::to_string_pretty(&output).context("failed to encode output")?;
    println!("{}", rendered);
    Ok(())
}

fn execute(input: KitInput) -> anyhow::Result<KitOutput> {
    let location = Location::parse(&input.location)?;
    let doc = build_document(location, &input);
    let kit = PageKit::with_options(doc.clone(), input.options);

    // Everything requested here predates ready and is queued.
    for item in &input.load {
        // Unknown kinds already raised a page alert, which ends up in `warnings`.
        let _ = kit.load_resource_named(&item.kind, &item.url);
    }
    kit.on_ready();

    let mut expanded = BTreeMap::new();
    for tpl in &input.templates {
        kit.add_template(&tpl.name, &tpl.selector);
        expanded.insert(tpl.name.clone(), kit.expand_template(&tpl.name, &tpl.data));
    }

    let client = HttpClient::new(DryRun::default()).with_interceptor(kit.csrf_interceptor()?);
    for req in &input.requests {
        let method = Method::from_bytes(req.method.as_bytes())
            .with_context(|| format!("invalid method {:?}", req.method))?;
        client
            .request(method, &req.url)
            .send()
            .with_context(|| format!("{} {}", req.method, req.url))?;
    }

    let sent = client
        .transport()
        .sent
        .lock()
        .map_err(|_| anyhow::anyhow!("dry-run log poisoned"))?;
    let requests = sent
        .iter()
        .map(|r| PreparedRequest {
            method: r.method.to_string(),
            url: r.url.clone(),
            headers: r
                .headers
                .iter()
                .filter_map(|(name, value)| {
                    Some((name.as_str().to_string(), value.to_str().ok()?.to_string()))
                })
                .collect(),
        })
        .collect();

    Ok(KitOutput {
        html: doc.to_html(),
        expanded,
        requests,
        warnings: doc.alerts(),
    })
}

fn build_document(location: Location, input: &KitInput) -> MemoryDocument {
    let mut doc = MemoryDocument::new(location).with_cookie(input.cookie.clone());
    for src in &input.document.scripts {
        doc = doc.with_script(src);
    }
    for href in &input.document.stylesheets {
        doc = doc.with_stylesheet(href);
    }
    for el in &input.document.elements {
        doc.insert_element(&el.tag, &el.id, &el.html);
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn run_json(input: Value) -> KitOutput {
        execute(serde_json::from_value(input).unwrap()).unwrap()
    }

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn markup_in_elements_is_visible_to_loader_and_templates() {
        let out = run_json(json!({
            "location": "http://example.com/",
            "document": {
                "elements": [{
                    "id": "wrap",
                    "html": "<script src=\"/a.js\"></script><div id=\"row\">#NAME#</div>"
                }]
            },
            "load": [{"kind": "script", "url": "/a.js"}],
            "templates": [{"name": "row", "selector": "#row", "data": {"name": "x"}}]
        }));
        assert_eq!(count(&out.html, "src=\"/a.js\""), 1);
        assert_eq!(out.expanded["row"], "x");
    }

    #[test]
    fn loads_are_queued_then_flushed_in_order() {
        let out = run_json(json!({
            "location": "http://example.com/",
            "document": {"scripts": ["/jquery.js"]},
            "load": [
                {"kind": "javascript", "url": "/b.js"},
                {"kind": "css", "url": "/b.css"},
                {"kind": "script", "url": "/jquery.js"},
                {"kind": "script", "url": "/b.js"}
            ]
        }));
        assert_eq!(count(&out.html, "/jquery.js"), 1);
        assert_eq!(count(&out.html, "/b.js"), 1);
        assert!(out.html.find("/jquery.js").unwrap() < out.html.find("/b.js").unwrap());
        assert!(out.html.find("/b.css").unwrap() < out.html.find("</head>").unwrap());
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn unknown_kinds_become_warnings() {
        let out = run_json(json!({
            "location": "http://example.com/",
            "load": [{"kind": "font", "url": "/f.woff"}]
        }));
        assert_eq!(out.warnings, vec!["Don't know how to load item of type font once"]);
        assert!(!out.html.contains("/f.woff"));
    }

    #[test]
    fn requests_carry_the_csrf_header() {
        let out = run_json(json!({
            "location": "http://example.com/admin/",
            "cookie": "sessionid=s; csrftoken=abc123",
            "requests": [
                {"method": "POST", "url": "/save/"},
                {"method": "GET", "url": "/list/"},
                {"method": "POST", "url": "http://evil.com/"}
            ]
        }));
        let value = serde_json::to_value(&out).unwrap();
        assert_eq!(
            value["requests"],
            json!([
                {"method": "POST", "url": "/save/", "headers": {"x-csrftoken": "abc123"}},
                {"method": "GET", "url": "/list/", "headers": {}},
                {"method": "POST", "url": "http://evil.com/", "headers": {}}
            ])
        );
    }

    #[test]
    fn token_with_line_breaks_is_dropped() {
        let out = run_json(json!({
            "location": "http://example.com/",
            "cookie": "csrftoken=abc%0D%0AX-Evil%3A%201",
            "requests": [{"method": "POST", "url": "/save/"}]
        }));
        assert!(out.requests[0].headers.is_empty());
    }

    #[test]
    fn output_has_the_four_top_level_fields() {
        let out = run_json(json!({"location": "http://example.com/"}));
        let value = serde_json::to_value(&out).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["expanded", "html", "requests", "warnings"]);
        assert!(value["html"].as_str().unwrap().starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn unknown_input_fields_are_rejected() {
        let input = json!({"location": "http://example.com/", "extra": 1});
        assert!(serde_json::from_value::<KitInput>(input).is_err());
    }

    #[test]
    fn bad_method_fails() {
        let input = json!({
            "location": "http://example.com/",
            "requests": [{"method": "PO ST", "url": "/"}]
        });
        assert!(execute(serde_json::from_value(input).unwrap()).is_err());
    }
}
