//! One-shot resolution of deferred options, method, query and URL.

use std::collections::VecDeque;

use http::Method;
use url::Url;

use super::{Context, Request, RequestOption};
use crate::error::{Error, Result};
use crate::extension::Extension;
use crate::values::{values_of_json, Values};

impl Request {
    /// Apply options in place and resolve the executable form.
    ///
    /// Terminal on the first error, which is also stored in `last_error`.
    /// Calling it again after a failure returns the same error.
    ///
    /// The query is folded into `url`, leaving `query` and `raw_query`
    /// empty, so reconciling a resolved request changes nothing.
    pub fn reconcile(&mut self) -> Result<()> {
        if let Some(err) = &self.last_error {
            return Err(err.clone());
        }

        let mut queue = VecDeque::new();
        self.surface_options(&mut queue);
        self.apply_options(queue)?;

        if self.method.is_none() {
            self.method = Some(Method::GET);
        }

        if self.raw_query.is_empty() {
            if let Some(query) = &self.query {
                match values_of_json(query) {
                    Ok(values) => self.raw_query = values.encode(),
                    Err(e) => return Err(self.fail(Error::BuildQuery(Box::new(e)))),
                }
            }
        }

        if let Err(e) = self.resolve_url() {
            return Err(self.fail(e));
        }

        if self.context.is_none() {
            self.context = Some(Context::background());
        }

        tracing::debug!(
            method = %self.method.as_ref().unwrap_or(&Method::GET),
            url = %self.url,
            hooks = self.extension.hooks().len(),
            "request reconciled"
        );
        Ok(())
    }

    /// Options left in `self.options` by the previous step (a nested request,
    /// or a mutator that pushed more) run next, ahead of the rest.
    fn surface_options(&mut self, queue: &mut VecDeque<RequestOption>) {
        let surfaced = std::mem::take(&mut self.options);
        register_hooks(&mut self.extension, &surfaced);
        for option in surfaced.into_iter().rev() {
            queue.push_front(option);
        }
    }

    fn apply_options(&mut self, mut queue: VecDeque<RequestOption>) -> Result<()> {
        while let Some(option) = queue.pop_front() {
            match option {
                RequestOption::Request(nested) => *self = self.with(*nested),
                RequestOption::Apply(f) => f(&mut *self),
                RequestOption::TryApply(f) => {
                    if let Err(e) = f(&mut *self) {
                        self.fail(e);
                    }
                }
                RequestOption::Hook(_) => {}
                RequestOption::Custom(custom) => {
                    let extension = self.extension.clone();
                    match extension.handle_option(self, &custom) {
                        Ok(true) => {}
                        Ok(false) => {
                            self.fail(Error::InvalidOption(custom.type_name()));
                        }
                        Err(e) => {
                            self.fail(e);
                        }
                    }
                }
            }

            if let Some(err) = &self.last_error {
                return Err(err.clone());
            }
            self.surface_options(&mut queue);
        }
        Ok(())
    }

    fn resolve_url(&mut self) -> Result<()> {
        let target = if self.url.is_empty() {
            self.base_url.clone()
        } else if self.url.starts_with('/') && !self.base_url.is_empty() {
            format!("{}{}", self.base_url, self.url)
        } else {
            self.url.clone()
        };

        let mut parsed = Url::parse(&target)?;
        if !self.raw_query.is_empty() {
            let mut query = Values::parse(&self.raw_query);
            if let Some(existing) = parsed.query() {
                query.merge(&Values::parse(existing));
            }
            parsed.set_query(Some(&query.encode()));
        }

        self.url = parsed.to_string();
        self.query = None;
        self.raw_query.clear();
        Ok(())
    }
}

/// Register hook literals so that, for equal orders, earlier-declared hooks
/// end up ahead of later ones and ahead of previously registered hooks.
fn register_hooks(extension: &mut Extension, options: &[RequestOption]) {
    for option in options.iter().rev() {
        if let RequestOption::Hook(hook) = option {
            extension.with([hook.clone()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::Hook;
    use serde::Serialize;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    fn resolved(mut req: Request) -> Request {
        req.reconcile().unwrap();
        req
    }

    #[test]
    fn test_url_build() {
        let base = Request::new().base_url("https://wener.me").url("/token");
        assert_eq!(resolved(base.clone()).url, "https://wener.me/token");

        let out = resolved(base.clone().query(&json!({"name": ["wener"]})));
        assert_eq!(out.url, "https://wener.me/token?name=wener");

        let out = resolved(base.clone().query(&BTreeMap::from([("name", "wener")])));
        assert_eq!(out.url, "https://wener.me/token?name=wener");

        let out = resolved(base.query(&json!({"name": "wener", "age": 18})));
        assert_eq!(out.url, "https://wener.me/token?age=18&name=wener");
    }

    #[test]
    fn test_url_fallbacks() {
        let out = resolved(Request::new().base_url("http://h/only"));
        assert_eq!(out.url, "http://h/only");

        let out = resolved(Request::new().base_url("http://ignored").url("http://abs/x"));
        assert_eq!(out.url, "http://abs/x");

        let mut bad = Request::new().url("/relative-without-base");
        assert!(matches!(bad.reconcile(), Err(Error::InvalidUrl(_))));
        assert!(bad.last_error.is_some());
    }

    #[test]
    fn test_url_is_normalized_with_or_without_query() {
        let out = resolved(Request::new().base_url("https://h"));
        assert_eq!(out.url, "https://h/");

        let out = resolved(Request::new().base_url("https://h").raw_query("a=1"));
        assert_eq!(out.url, "https://h/?a=1");
    }

    #[test]
    fn test_reconcile_twice_is_a_no_op() {
        let mut req = Request::new()
            .base_url("https://h")
            .url("/token")
            .query(&json!({"name": ["wener"]}));
        req.reconcile().unwrap();
        let first = req.url.clone();
        assert_eq!(first, "https://h/token?name=wener");
        assert!(req.query.is_none());
        assert!(req.raw_query.is_empty());

        req.reconcile().unwrap();
        assert_eq!(req.url, first);

        let prepared = req.new_request().unwrap();
        assert_eq!(prepared.request.uri(), "https://h/token?name=wener");

        let mut raw = Request::new().url("http://h/p?b=1").raw_query("a=1");
        raw.reconcile().unwrap();
        raw.reconcile().unwrap();
        assert_eq!(raw.url, "http://h/p?a=1&b=1");
    }

    #[test]
    fn test_query_added_after_reconcile_merges_once() {
        let mut req = Request::new().url("http://h/p").raw_query("a=1");
        req.reconcile().unwrap();

        let mut next = req.with(Request::new().query(&json!({"b": 2})));
        next.reconcile().unwrap();
        assert_eq!(next.url, "http://h/p?a=1&b=2");
    }

    #[test]
    fn test_raw_query_merges_with_url_query() {
        let out = resolved(
            Request::new()
                .url("http://h/p?b=url&a=url")
                .raw_query("a=raw&c=3"),
        );
        assert_eq!(out.url, "http://h/p?a=raw&a=url&b=url&c=3");
    }

    #[test]
    fn test_query_determinism() {
        #[derive(Serialize)]
        struct Age {
            age: i32,
        }
        #[derive(Serialize)]
        struct Name {
            name: &'static str,
        }

        let a = Request::new().query(&Age { age: 18 });
        let b = Request::new().query(&Name { name: "wener" });
        let base = Request::new().url("http://h/");

        let one = resolved(base.with(a.clone()).with(b.clone()));
        let two = resolved(base.with(b).with(a));
        assert_eq!(one.url, "http://h/?age=18&name=wener");
        assert_eq!(one.url, two.url);
    }

    #[test]
    fn test_defaults() {
        let out = resolved(Request::new().url("http://h"));
        assert_eq!(out.method, Some(Method::GET));
        assert!(out.context.is_some());
        assert!(out.options.is_empty());
    }

    #[test]
    fn test_method_override() {
        let out = resolved(
            Request::new()
                .method(Method::GET)
                .url("http://h")
                .with(Request::new().method(Method::POST)),
        );
        assert_eq!(out.method, Some(Method::POST));
    }

    #[test]
    fn test_build_query_error() {
        let mut req = Request::new().url("http://h").query(&[1, 2]);
        let err = req.reconcile().unwrap_err();
        assert!(matches!(err, Error::BuildQuery(_)));
        assert!(err.to_string().starts_with("build query values"));
    }

    #[test]
    fn test_invalid_option_leaves_method_unset() {
        struct Unknown;
        let mut req = Request::new()
            .url("http://h")
            .option(RequestOption::custom(Unknown));

        let err = req.reconcile().unwrap_err();
        assert!(matches!(err, Error::InvalidOption(name) if name.ends_with("Unknown")));
        assert!(req.method.is_none());

        // sticky
        assert!(matches!(req.reconcile(), Err(Error::InvalidOption(_))));
    }

    #[test]
    fn test_option_error_aborts() {
        let reached = Arc::new(Mutex::new(false));
        let flag = reached.clone();
        let mut req = Request::new()
            .url("http://h")
            .option(RequestOption::try_apply(|_| Err(Error::custom("eof"))))
            .option(RequestOption::apply(move |_| *flag.lock().unwrap() = true));

        assert_eq!(req.reconcile().unwrap_err().to_string(), "eof");
        assert!(!*reached.lock().unwrap());
        assert!(req.method.is_none());
    }

    #[test]
    fn test_custom_option_handled_by_hook() {
        struct Port(u16);
        let hook = Hook::new("port").handle_option(|req, opt| match opt.downcast_ref::<Port>() {
            Some(Port(p)) => {
                req.url = format!("http://localhost:{p}/");
                Ok(true)
            }
            None => Ok(false),
        });

        let out = resolved(
            Request::new()
                .option(RequestOption::custom(Port(8080)))
                .option(hook),
        );
        assert_eq!(out.url, "http://localhost:8080/");
    }

    #[test]
    fn test_nested_request_option() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mark = |name: &'static str| {
            let seen = seen.clone();
            RequestOption::apply(move |_| seen.lock().unwrap().push(name))
        };

        let nested = Request::new()
            .method(Method::DELETE)
            .header("x-nested", "1")
            .option(mark("nested"));
        let out = resolved(
            Request::new()
                .url("http://h")
                .option(nested)
                .option(mark("after")),
        );

        assert_eq!(out.method, Some(Method::DELETE));
        assert_eq!(out.header.get("x-nested"), "1");
        assert_eq!(*seen.lock().unwrap(), ["nested", "after"]);
    }

    #[test]
    fn test_options_pushed_by_mutator_run_next() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mark = {
            let seen = seen.clone();
            move |name: &'static str| {
                let seen = seen.clone();
                RequestOption::apply(move |_| seen.lock().unwrap().push(name))
            }
        };

        let pushed = mark("pushed");
        let out = resolved(
            Request::new()
                .url("http://h")
                .option(RequestOption::apply(move |req| {
                    req.options.push(pushed.clone());
                    req.options.push(Hook::new("pushed-hook").into());
                }))
                .option(mark("after")),
        );

        assert_eq!(*seen.lock().unwrap(), ["pushed", "after"]);
        assert!(out.extension.hooks().iter().any(|h| h.name == "pushed-hook"));
        assert!(out.options.is_empty());
    }

    #[test]
    fn test_hook_prescan_order() {
        let out = resolved(
            Request::new()
                .url("http://h")
                .with_hook([Hook::new("direct")])
                .option(Hook::new("first"))
                .option(Hook::new("second"))
                .option(Hook::new("high").order(5)),
        );
        let names: Vec<_> = out.extension.hooks().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, ["high", "first", "second", "direct"]);
    }

    #[test]
    fn test_hooks_visible_to_earlier_options() {
        let mut req = Request::new()
            .url("http://h")
            .option(RequestOption::try_apply(|req| {
                if req.extension.hooks().iter().any(|h| h.name == "late") {
                    Ok(())
                } else {
                    Err(Error::custom("hook not registered"))
                }
            }))
            .option(Hook::new("late"));
        req.reconcile().unwrap();
    }
}
