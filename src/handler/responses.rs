use httpkit::Result;
use httpkit::http::request::Request;
use httpkit::http::response::Response;
use httpkit::http::status::HttpStatus;
use serde_json::{Map, Value, json};

pub fn welcome() -> Response {
    html(HttpStatus::Ok, "<h1>Welcome to httpkit!</h1>".to_string())
}

pub fn error(status: HttpStatus) -> Response {
    html(status, format!("<h1>{} {}</h1>", status.code(), status.reason()))
}

/// What the request resolved to, as JSON.
pub fn echo(req: &mut Request) -> Result<Response> {
    let method = req.method()?.to_string();
    let uri = req.uri()?;

    let headers: Map<String, Value> = req
        .headers
        .iter_preserve_case()
        .map(|(name, values)| (name.to_string(), Value::from(values.join(", "))))
        .collect();
    let query: Map<String, Value> = req
        .query
        .all()
        .iter()
        .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
        .collect();

    Ok(json_response(json!({
        "method": method,
        "uri": uri,
        "query_string": req.query_string(),
        "client_ip": req.client_ip()?,
        "secure": req.is_secure()?,
        "query": query,
        "headers": headers,
    })))
}

/// Sends a JSON body back under `received`.
pub fn echo_json(req: &mut Request) -> Result<Response> {
    let received = req.to_json()?;
    Ok(json_response(json!({ "received": received })))
}

fn json_response(body: Value) -> Response {
    let body = body.to_string();
    let mut res = Response::from_status(HttpStatus::Ok);
    res.headers.set("Content-Type", "application/json", true);
    res.headers.set("Content-Length", body.len().to_string(), true);
    res.set_content(body);
    res
}

fn html(status: HttpStatus, body: String) -> Response {
    let mut res = Response::from_status(status);
    res.headers.set("Content-Type", "text/html", true);
    res.headers.set("Content-Length", body.len().to_string(), true);
    res.set_content(body);
    res
}
