use super::handler::RequestValidator;
use super::params::RequestParameters;
use super::raw::RawRequest;
use crate::error::ValidationError;
use std::sync::Arc;
use tracing::{info, info_span};

/// Receives the one error of a failed validation run.
pub trait FailureReporter: Send + Sync {
    fn report(&self, route: &str, err: &ValidationError);
}

/// Logs failures at `info` with the error's structured fields.
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report(&self, route: &str, err: &ValidationError) {
        info!(
            route = %route,
            kind = %err.kind,
            parameter = err.parameter.as_deref().unwrap_or("-"),
            value = err.value.as_deref().unwrap_or("-"),
            "Rejected request: {}",
            err.message
        );
    }
}

/// Per-request state shared by the validators of one chain.
#[derive(Debug, Default)]
pub struct ValidationContext {
    pub parameters: Option<RequestParameters>,
}

impl ValidationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a validator's result into whatever earlier validators produced.
    pub fn record(&mut self, parameters: RequestParameters) {
        match &mut self.parameters {
            Some(existing) => existing.merge(parameters),
            None => self.parameters = Some(parameters),
        }
    }
}

impl RequestValidator {
    /// Validate and merge the result into `ctx`.
    pub fn handle(&self, req: &RawRequest, ctx: &mut ValidationContext) -> Result<(), ValidationError> {
        let parameters = self.validate(req)?;
        ctx.record(parameters);
        Ok(())
    }
}

/// Ordered validators for one route. The first failure stops the chain and is
/// handed to every reporter.
#[derive(Clone, Default)]
pub struct ValidationChain {
    route: String,
    validators: Vec<Arc<RequestValidator>>,
    reporters: Vec<Arc<dyn FailureReporter>>,
}

impl std::fmt::Debug for ValidationChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationChain")
            .field("route", &self.route)
            .field("validators", &self.validators.len())
            .field("reporters", &self.reporters.len())
            .finish()
    }
}

impl ValidationChain {
    pub fn new(route: impl Into<String>) -> Self {
        ValidationChain {
            route: route.into(),
            validators: Vec::new(),
            reporters: Vec::new(),
        }
    }

    pub fn with_validator(mut self, validator: Arc<RequestValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn FailureReporter>) -> Self {
        self.reporters.push(reporter);
        self
    }

    pub fn run(&self, req: &RawRequest) -> Result<RequestParameters, ValidationError> {
        let _span = info_span!("validate", route = %self.route).entered();
        let mut ctx = ValidationContext::new();
        for validator in &self.validators {
            if let Err(err) = validator.handle(req, &mut ctx) {
                for reporter in &self.reporters {
                    reporter.report(&self.route, &err);
                }
                return Err(err);
            }
        }
        Ok(ctx.parameters.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::spec::{ParameterLocation, ParameterSpec};
    use crate::validator::{ValidatorFactory, ValidatorOptions};
    use crate::value::ParameterValue;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);

    impl FailureReporter for Collect {
        fn report(&self, route: &str, err: &ValidationError) {
            self.0.lock().unwrap().push(format!("{route}:{}", err.kind));
        }
    }

    fn validator(params: Vec<ParameterSpec>) -> Arc<RequestValidator> {
        let options = ValidatorOptions::default();
        let factory = ValidatorFactory::new(&options, None);
        Arc::new(RequestValidator::compile(&params, None, &factory).unwrap())
    }

    #[test]
    fn test_chain_merges_results() {
        let chain = ValidationChain::new("GET /items")
            .with_validator(validator(vec![ParameterSpec::new(
                "limit",
                ParameterLocation::Query,
                json!({"type": "integer"}),
            )]))
            .with_validator(validator(vec![ParameterSpec::new(
                "offset",
                ParameterLocation::Query,
                json!({"type": "integer"}),
            )]));
        let params = chain
            .run(&RawRequest::new().with_query_string("limit=5&offset=10"))
            .unwrap();
        assert_eq!(params.query["limit"], ParameterValue::Integer(5));
        assert_eq!(params.query["offset"], ParameterValue::Integer(10));
    }

    #[test]
    fn test_chain_stops_and_reports_once() {
        let reporter = Arc::new(Collect::default());
        let chain = ValidationChain::new("GET /items")
            .with_validator(validator(vec![ParameterSpec::new(
                "limit",
                ParameterLocation::Query,
                json!({"type": "integer"}),
            )
            .required(true)]))
            .with_validator(validator(vec![ParameterSpec::new(
                "offset",
                ParameterLocation::Query,
                json!({"type": "integer"}),
            )
            .required(true)]))
            .with_reporter(reporter.clone());
        let err = chain.run(&RawRequest::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.parameter.as_deref(), Some("limit"));
        assert_eq!(*reporter.0.lock().unwrap(), vec!["GET /items:NOT_FOUND".to_string()]);
    }
}
