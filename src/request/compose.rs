//! Pure merge of two request descriptions.

use serde_json::Value;

use super::Request;
use crate::values::values_of_json;

impl Request {
    /// Merge `other` over `self`, returning a new request.
    ///
    /// - `method`, `base_url`, `url`, `body`, `raw_body`, `get_body`,
    ///   `context`: `other` wins when set
    /// - `raw_query` from `other` replaces the query; otherwise structured
    ///   queries are merged with `self`'s values first
    /// - `header` and `values` are merged, `self`'s values first
    /// - `other`'s options are placed before `self`'s
    /// - `last_error` is never cleared; `other`'s is adopted if `self` has none
    /// - `other`'s hooks are registered as the most recent batch
    pub fn with(&self, other: Request) -> Request {
        let mut out = self.clone();
        let Request {
            method,
            base_url,
            url,
            query,
            raw_query,
            body,
            raw_body,
            get_body,
            header,
            context,
            values,
            last_error,
            options,
            extension,
        } = other;

        if method.is_some() {
            out.method = method;
        }
        if !base_url.is_empty() {
            out.base_url = base_url;
        }
        if !url.is_empty() {
            out.url = url;
        }

        if raw_body.is_some() {
            out.raw_body = raw_body;
        }
        if body.is_some() {
            out.body = body;
        }
        if get_body.is_some() {
            out.get_body = get_body;
        }
        if context.is_some() {
            out.context = context;
        }

        if !raw_query.is_empty() {
            out.raw_query = raw_query;
        } else {
            out.query = merge_query(out.query.take(), query);
        }

        out.header.merge(&header);
        out.values.merge(&values);

        let mut merged = options;
        merged.append(&mut out.options);
        out.options = merged;

        if out.last_error.is_none() {
            out.last_error = last_error;
        }
        if !extension.is_empty() {
            out.extension.with(extension.hooks().iter().cloned());
        }
        out
    }
}

fn merge_query(base: Option<Value>, over: Option<Value>) -> Option<Value> {
    let (base, over) = match (base, over) {
        (None, over) => return over,
        (base, None) => return base,
        (Some(base), Some(over)) => (base, over),
    };

    match (values_of_json(&base), values_of_json(&over)) {
        (Ok(a), Ok(b)) => Some(a.with_merge(&b).into()),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "query merge failed, using override query as-is");
            Some(over)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::extension::Hook;
    use crate::request::{Context, RequestOption};
    use bytes::Bytes;
    use http::Method;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_override() {
        let base = Request {
            method: Some(Method::GET),
            query: Some(json!({"a": ["a"]})),
            ..Default::default()
        };
        let out = base.with(Request {
            method: Some(Method::POST),
            base_url: "http://wener.me".into(),
            raw_body: Some(Bytes::from_static(b"HELLO")),
            query: Some(json!({"b": ["b"]})),
            context: Some(Context::background()),
            ..Default::default()
        });

        assert_eq!(out.method, Some(Method::POST));
        assert_eq!(out.base_url, "http://wener.me");
        assert_eq!(out.raw_body.as_deref(), Some(&b"HELLO"[..]));
        assert!(out.context.is_some());
        assert_eq!(out.query, Some(json!({"a": ["a"], "b": ["b"]})));
        // base untouched
        assert_eq!(base.method, Some(Method::GET));
        assert!(base.raw_body.is_none());
    }

    #[test]
    fn test_empty_override_keeps_base() {
        let base = Request::new()
            .method(Method::PUT)
            .base_url("http://h")
            .url("/x")
            .query(&json!({"k": "v"}))
            .body(&json!({"n": 1}))
            .header("accept", "text/plain")
            .value("trace", "1");

        let out = base.with(Request::default());
        assert_eq!(out.method, base.method);
        assert_eq!(out.base_url, base.base_url);
        assert_eq!(out.url, base.url);
        assert_eq!(out.query, base.query);
        assert_eq!(out.body, base.body);
        assert_eq!(out.header, base.header);
        assert_eq!(out.values, base.values);
        assert!(out.options.is_empty());
    }

    #[test]
    fn test_headers_merge_associative() {
        let a = Request::new().header("x", "a");
        let b = Request::new().header("x", "b").header("y", "b");
        let c = Request::new().header("x", "c");

        let left = a.with(b.clone()).with(c.clone());
        let right = a.with(b.with(c));
        assert_eq!(left.header, right.header);
        assert_eq!(left.header.get_all("x"), ["a", "b", "c"]);
    }

    #[test]
    fn test_raw_query_replaces() {
        let out = Request::new()
            .query(&json!({"a": "1"}))
            .with(Request::new().raw_query("b=2").query(&json!({"c": "3"})));
        assert_eq!(out.raw_query, "b=2");
        assert_eq!(out.query, Some(json!({"a": "1"})));
    }

    #[test]
    fn test_query_taken_when_base_has_none() {
        let out = Request::new().with(Request::new().query(&json!({"a": "1"})));
        assert_eq!(out.query, Some(json!({"a": "1"})));

        let kept = Request::new()
            .query(&json!({"a": "1"}))
            .with(Request::new());
        assert_eq!(kept.query, Some(json!({"a": "1"})));
    }

    #[test]
    fn test_query_merge_degrades_to_override() {
        let out = Request::new()
            .query(&5)
            .with(Request::new().query(&json!({"a": "1"})));
        assert_eq!(out.query, Some(json!({"a": "1"})));

        let out = Request::new()
            .query(&json!({"a": "1"}))
            .with(Request::new().query(&"scalar"));
        assert_eq!(out.query, Some(json!("scalar")));
    }

    #[test]
    fn test_override_options_come_first() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mark = |name: &'static str| {
            let seen = seen.clone();
            RequestOption::apply(move |_| seen.lock().unwrap().push(name))
        };

        let base = Request::new().option(mark("base"));
        let mut out = base
            .with(Request::new().option(mark("first override")))
            .with(Request::new().option(mark("second override")))
            .url("http://h");
        out.reconcile().unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            ["second override", "first override", "base"]
        );
    }

    #[test]
    fn test_last_error_is_kept() {
        let broken = Request {
            last_error: Some(Error::custom("broken")),
            ..Default::default()
        };
        let out = broken.with(Request::new().url("/x"));
        assert!(out.last_error.is_some());

        let adopted = Request::new().with(broken);
        assert_eq!(adopted.last_error.unwrap().to_string(), "broken");
    }

    #[test]
    fn test_override_hooks_are_registered() {
        let base = Request::new().with_hook([Hook::new("base")]);
        let out = base.with(Request::new().with_hook([Hook::new("over")]));
        let names: Vec<_> = out.extension.hooks().iter().map(|h| h.name.clone()).collect();
        assert_eq!(names, ["over", "base"]);
    }

    #[test]
    fn test_derived_override_does_not_duplicate_hooks() {
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let base = Request::new()
            .base_url("http://h")
            .with_hook([Hook::new("count").on_request(move |_| {
                *counter.lock().unwrap() += 1;
                Ok(())
            })]);

        let prepared = base.with(base.clone().url("/x")).new_request().unwrap();
        assert_eq!(prepared.resolved.extension.hooks().len(), 1);
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_nested_clone_does_not_duplicate_hook_options() {
        let base = Request::new()
            .url("http://h")
            .option(Hook::new("literal").on_response(|_| Ok(())));
        let mut out = base.clone().option(base);
        out.reconcile().unwrap();
        assert_eq!(out.extension.hooks().len(), 1);
    }
}
