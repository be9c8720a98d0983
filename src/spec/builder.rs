use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::assertion::{AssertError, AssertionResult, Expectation, evaluate_all};
use crate::http::{Method, Request, Response};
use crate::spec::capture::Capture;
use crate::spec::context::SpecContext;
use crate::store::Interpolator;
use crate::utils::{ResponseFormat, ResponseFormatter};
use crate::{Result, SpecError};

/// 一个请求加上它的断言与捕获指令
///
/// ```ignore
/// Spec::post("/products")
///     .with_json(json!({"title": "X", "price": 10}))
///     .expect_status(201)
///     .stores("productId", "id")
///     .send(&mut ctx)
///     .await?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Spec {
    method: Method,
    url: String,
    json: Option<Value>,
    query: BTreeMap<String, String>,
    timeout: Option<Duration>,
    expectations: Vec<Expectation>,
    captures: Vec<Capture>,
    inspect: bool,
}

/// 一次完整的请求/响应交换
#[derive(Debug, Clone)]
pub struct Exchange {
    pub request: Request,
    pub response: Response,
    pub results: Vec<AssertionResult>,
}

impl Exchange {
    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    pub fn failures(&self) -> Vec<AssertionResult> {
        self.results.iter().filter(|r| !r.passed).cloned().collect()
    }

    /// 有断言失败时返回聚合的 AssertionFailure
    pub fn into_response(self) -> Result<Response> {
        if self.passed() {
            Ok(self.response)
        } else {
            Err(SpecError::AssertionFailure {
                results: self.failures(),
            })
        }
    }
}

impl Spec {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            json: None,
            query: BTreeMap::new(),
            timeout: None,
            expectations: Vec::new(),
            captures: Vec::new(),
            inspect: false,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::Patch, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    pub fn with_json(mut self, json: Value) -> Self {
        self.json = Some(json);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.insert(key.into(), value.to_string());
        self
    }

    pub fn with_query_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        for (key, value) in params {
            self.query.insert(key.into(), value.to_string());
        }
        self
    }

    /// 覆盖默认超时
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn expect(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }

    pub fn expect_status(self, code: u16) -> Self {
        self.expect(Expectation::Status(code))
    }

    pub fn expect_json_like(self, partial: Value) -> Self {
        self.expect(Expectation::JsonLike(partial))
    }

    pub fn expect_json_length(self, expected: usize) -> Self {
        self.expect(Expectation::JsonLength {
            path: None,
            expected,
        })
    }

    pub fn expect_json_length_at(self, path: impl Into<String>, expected: usize) -> Self {
        self.expect(Expectation::JsonLength {
            path: Some(path.into()),
            expected,
        })
    }

    pub fn expect_json_schema(self, schema: Value) -> Self {
        self.expect(Expectation::JsonSchema(schema))
    }

    /// 断言全部通过后，把 `path` 处的值存为 `name`
    pub fn stores(mut self, name: &str, path: &str) -> Self {
        self.captures.push(Capture::parse(name, path));
        self
    }

    /// 收到响应后打印出来
    pub fn inspect(mut self) -> Self {
        self.inspect = true;
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn expectations(&self) -> &[Expectation] {
        &self.expectations
    }

    pub fn captures(&self) -> &[Capture] {
        &self.captures
    }

    pub fn is_inspect(&self) -> bool {
        self.inspect
    }

    /// 替换占位符，生成可发送的请求
    pub fn build_request(&self, ctx: &SpecContext) -> Result<Request> {
        let store = ctx.store();

        let url = Interpolator::interpolate(&self.url, store)?;
        let json = self
            .json
            .as_ref()
            .map(|json| Interpolator::interpolate_json(json, store))
            .transpose()?;

        let mut query_params = BTreeMap::new();
        for (key, value) in &self.query {
            query_params.insert(key.clone(), Interpolator::interpolate(value, store)?);
        }

        Ok(Request {
            method: self.method,
            url: ctx.resolve_url(&url)?,
            json,
            query_params,
            timeout: self.timeout.unwrap_or_else(|| ctx.default_timeout()),
        })
    }

    /// 替换期望值中的占位符（jsonLike 与 schema 中的字符串）
    fn resolve_expectations(&self, ctx: &SpecContext) -> Result<Vec<Expectation>> {
        let store = ctx.store();
        self.expectations
            .iter()
            .map(|expectation| match expectation {
                Expectation::JsonLike(partial) => {
                    Ok(Expectation::JsonLike(Interpolator::interpolate_json(partial, store)?))
                }
                Expectation::JsonSchema(schema) => {
                    Ok(Expectation::JsonSchema(Interpolator::interpolate_json(schema, store)?))
                }
                other => Ok(other.clone()),
            })
            .collect()
    }

    /// 发送请求并求值所有断言
    ///
    /// 顺序：发送 -> 断言 -> 捕获。断言有失败时不捕获，结果中包含全部断言；
    /// 捕获路径不存在时追加一条失败结果。
    /// 传输错误和未定义引用直接返回错误，不求值任何断言
    pub async fn execute(&self, ctx: &mut SpecContext) -> Result<Exchange> {
        let test_name = ctx
            .current_test()
            .map(str::to_string)
            .unwrap_or_else(|| self.to_string());

        let prepared = self
            .build_request(ctx)
            .and_then(|request| Ok((request, self.resolve_expectations(ctx)?)));
        let (request, expectations) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                self.report_abort(ctx, &test_name, &e);
                return Err(e);
            }
        };

        let response = match ctx.client().execute(&request).await {
            Ok(response) => response,
            Err(e) => {
                self.report_abort(ctx, &test_name, &e);
                return Err(e);
            }
        };

        if self.inspect {
            print_inspect(&request, &response);
        }

        let mut results = evaluate_all(&expectations, &response);
        for result in &results {
            ctx.report(&test_name, result);
        }

        if results.iter().all(|r| r.passed) {
            for capture in &self.captures {
                if let Err(e) = capture.apply(&response, ctx.store_mut()) {
                    // 捕获失败记为一条失败结果，之后的捕获不再执行
                    let failure = AssertionResult::aborted(
                        capture.describe(),
                        AssertError::PathNotFound(e.to_string()),
                    );
                    ctx.report(&test_name, &failure);
                    results.push(failure);
                    break;
                }
            }
        } else if !self.captures.is_empty() {
            debug!(test = %test_name, "assertions failed, captures skipped");
        }

        Ok(Exchange {
            request,
            response,
            results,
        })
    }

    /// 发送请求；有断言失败时返回 AssertionFailure
    pub async fn send(&self, ctx: &mut SpecContext) -> Result<Response> {
        self.execute(ctx).await?.into_response()
    }

    /// 发送请求并返回 body 中 `path` 处的值
    pub async fn returns(&self, ctx: &mut SpecContext, path: &str) -> Result<Value> {
        let response = self.send(ctx).await?;
        Ok(response.value_at(path)?.clone())
    }

    /// 请求没有得到响应时，向 reporter 记一条失败
    fn report_abort(&self, ctx: &SpecContext, test_name: &str, error: &SpecError) {
        let cause = match error {
            SpecError::Transport(msg) => AssertError::Transport(msg.clone()),
            SpecError::UnboundReference(name) => AssertError::UnboundReference(name.clone()),
            SpecError::PathNotFound(reference) => AssertError::PathNotFound(reference.clone()),
            other => AssertError::InvalidRequest(other.to_string()),
        };
        ctx.report(test_name, &AssertionResult::aborted(self.to_string(), cause));
    }
}

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

fn print_inspect(request: &Request, response: &Response) {
    println!("{} {}", request.method, request.full_url());
    if let Some(json) = &request.json {
        println!("{}", serde_json::to_string_pretty(json).unwrap_or_else(|_| json.to_string()));
    }
    let formatter = ResponseFormatter::new(ResponseFormat::Verbose);
    match formatter.format(response) {
        Ok(formatted) => {
            for line in formatted.lines() {
                println!("   {}", line);
            }
        }
        Err(e) => println!("   Failed to format response: {}", e),
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Client;
    use crate::reporter::Reporter;
    use serde_json::json;

    fn context() -> SpecContext {
        SpecContext::new(Client::new(), Reporter::shared())
            .with_base_url("https://api.escuelajs.co/api/v1")
            .unwrap()
    }

    #[test]
    fn test_builder_collects_configuration() {
        let spec = Spec::post("/products")
            .with_json(json!({"title": "X", "price": 10}))
            .with_query("offset", 0)
            .with_timeout(Duration::from_secs(5))
            .expect_status(201)
            .expect_json_like(json!({"title": "X"}))
            .stores("productId", "id");

        assert_eq!(spec.method(), Method::Post);
        assert_eq!(spec.url(), "/products");
        assert_eq!(spec.query().get("offset"), Some(&"0".to_string()));
        assert_eq!(spec.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(spec.expectations().len(), 2);
        assert_eq!(spec.captures(), &[Capture::parse("productId", "id")]);
        assert_eq!(spec.to_string(), "POST /products");
    }

    #[test]
    fn test_build_request_interpolates_everything() {
        let mut ctx = context();
        ctx.store_mut().set("productId", json!(42));
        ctx.store_mut().set("categoryId", json!(3));

        let spec = Spec::put("/products/$S{productId}")
            .with_json(json!({"categoryId": "$S{categoryId}", "title": "p-$S{productId}"}))
            .with_query("categoryId", "$S{categoryId}");
        let request = spec.build_request(&ctx).unwrap();

        assert_eq!(
            request.url.as_str(),
            "https://api.escuelajs.co/api/v1/products/42"
        );
        assert_eq!(request.json, Some(json!({"categoryId": 3, "title": "p-42"})));
        assert_eq!(request.query_params.get("categoryId"), Some(&"3".to_string()));
        assert_eq!(request.timeout, Duration::from_millis(30_000));
    }

    #[test]
    fn test_build_request_unbound_reference() {
        let ctx = context();
        let err = Spec::get("/users/$S{userId}").build_request(&ctx).unwrap_err();
        assert!(matches!(err, SpecError::UnboundReference(name) if name == "userId"));
    }

    #[test]
    fn test_resolve_expectations() {
        let mut ctx = context();
        ctx.store_mut().set("uniqueEmail", json!("test1@email.com"));

        let spec = Spec::post("/users")
            .expect_status(201)
            .expect_json_like(json!({"email": "$S{uniqueEmail}"}));
        assert_eq!(
            spec.resolve_expectations(&ctx).unwrap(),
            vec![
                Expectation::Status(201),
                Expectation::JsonLike(json!({"email": "test1@email.com"})),
            ]
        );

        let unbound = Spec::get("/users").expect_json_like(json!({"id": "$S{userId}"}));
        assert!(unbound.resolve_expectations(&ctx).is_err());
    }

    #[test]
    fn test_exchange_into_response_aggregates_failures() {
        let response = Response::new(
            400,
            reqwest::header::HeaderMap::new(),
            "{}".to_string(),
            Duration::from_millis(1),
        )
        .unwrap();
        let request = Spec::get("/users").build_request(&context()).unwrap();
        let expectations = vec![Expectation::Status(200), Expectation::JsonLike(json!({"id": 1}))];
        let exchange = Exchange {
            request,
            results: evaluate_all(&expectations, &response),
            response,
        };

        match exchange.into_response() {
            Err(SpecError::AssertionFailure { results }) => assert_eq!(results.len(), 2),
            other => panic!("expected AssertionFailure, got {:?}", other.map(|r| r.status)),
        }
    }
}
