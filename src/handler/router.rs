use httpkit::Result;
use httpkit::http::request::Request;
use httpkit::http::response::Response;
use httpkit::http::status::HttpStatus;
use httpkit::http::{HttpMethod, http_method_from_str};

use crate::handler::responses;

pub fn route(req: &mut Request) -> Result<Response> {
    let method = http_method_from_str(req.method()?);
    let path = req.request_uri().split('?').next().unwrap_or_default().to_string();

    match (method, path.as_str()) {
        (Some(HttpMethod::Get | HttpMethod::Head), "/") => Ok(responses::welcome()),
        (Some(HttpMethod::Get | HttpMethod::Head), "/echo") => responses::echo(req),
        (Some(HttpMethod::Post), "/echo") => responses::echo_json(req),

        (_, "/" | "/echo") => Ok(responses::error(HttpStatus::MethodNotAllowed)),
        _ => Ok(responses::error(HttpStatus::NotFound)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpkit::RequestConfig;
    use httpkit::http::parameters::ParameterBag;
    use httpkit::http::server_bag::ServerBag;
    use std::sync::Arc;

    fn request(uri: &str, method: &str, content: Option<&str>) -> Request {
        Request::create(
            uri,
            method,
            ParameterBag::default(),
            ServerBag::new([("CONTENT_TYPE", "application/json")]),
            content.map(str::to_string),
            Arc::new(RequestConfig::default()),
        )
        .unwrap()
    }

    #[test]
    fn routes_by_method_and_path() {
        assert_eq!(route(&mut request("/", "GET", None)).unwrap().status_code(), 200);
        assert_eq!(route(&mut request("/?page=2", "HEAD", None)).unwrap().status_code(), 200);
        assert_eq!(route(&mut request("/", "DELETE", None)).unwrap().status_code(), 405);
        assert_eq!(route(&mut request("/missing", "GET", None)).unwrap().status_code(), 404);
    }

    #[test]
    fn echo_reflects_the_request() {
        let res = route(&mut request("http://example.com/echo?b=2&a=1", "GET", None)).unwrap();
        let body: serde_json::Value = serde_json::from_str(res.content()).unwrap();
        assert_eq!(body["method"], "GET");
        assert_eq!(body["uri"], "http://example.com/echo?b=2&a=1");
        assert_eq!(body["query_string"], "a=1&b=2");
        assert_eq!(body["query"]["a"], "1");
    }

    #[test]
    fn echo_json_requires_a_json_body() {
        let res = route(&mut request("/echo", "POST", Some(r#"{"x": 1}"#))).unwrap();
        let body: serde_json::Value = serde_json::from_str(res.content()).unwrap();
        assert_eq!(body["received"]["x"], 1);

        assert!(route(&mut request("/echo", "POST", Some(""))).is_err());
    }
}
