use crate::spec::ParameterLocation;
use crate::value::ParameterValue;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Validated parameters of one request, grouped by location.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestParameters {
    pub path: BTreeMap<String, ParameterValue>,
    pub query: BTreeMap<String, ParameterValue>,
    pub header: BTreeMap<String, ParameterValue>,
    pub cookie: BTreeMap<String, ParameterValue>,
    pub form: BTreeMap<String, ParameterValue>,
    pub body: Option<ParameterValue>,
}

impl RequestParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location(&self, location: ParameterLocation) -> &BTreeMap<String, ParameterValue> {
        match location {
            ParameterLocation::Path => &self.path,
            ParameterLocation::Query => &self.query,
            ParameterLocation::Header => &self.header,
            ParameterLocation::Cookie => &self.cookie,
            ParameterLocation::BodyForm => &self.form,
        }
    }

    pub fn location_mut(
        &mut self,
        location: ParameterLocation,
    ) -> &mut BTreeMap<String, ParameterValue> {
        match location {
            ParameterLocation::Path => &mut self.path,
            ParameterLocation::Query => &mut self.query,
            ParameterLocation::Header => &mut self.header,
            ParameterLocation::Cookie => &mut self.cookie,
            ParameterLocation::BodyForm => &mut self.form,
        }
    }

    pub fn get(&self, location: ParameterLocation, name: &str) -> Option<&ParameterValue> {
        self.location(location).get(name)
    }

    /// Record a value; objects already present for `name` are merged field by field.
    pub fn insert(&mut self, location: ParameterLocation, name: impl Into<String>, value: ParameterValue) {
        let map = self.location_mut(location);
        let name = name.into();
        match map.get_mut(&name) {
            Some(existing) => existing.merge(value),
            None => {
                map.insert(name, value);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
            && self.query.is_empty()
            && self.header.is_empty()
            && self.cookie.is_empty()
            && self.form.is_empty()
            && self.body.is_none()
    }

    /// Fold a later result into this one. Later values win per key.
    pub fn merge(&mut self, other: RequestParameters) {
        let RequestParameters {
            path,
            query,
            header,
            cookie,
            form,
            body,
        } = other;
        for (location, map) in [
            (ParameterLocation::Path, path),
            (ParameterLocation::Query, query),
            (ParameterLocation::Header, header),
            (ParameterLocation::Cookie, cookie),
            (ParameterLocation::BodyForm, form),
        ] {
            self.location_mut(location).extend(map);
        }
        if body.is_some() {
            self.body = body;
        }
    }

    pub fn to_json(&self) -> Value {
        let section = |map: &BTreeMap<String, ParameterValue>| {
            Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
        };
        json!({
            "path": section(&self.path),
            "query": section(&self.query),
            "header": section(&self.header),
            "cookie": section(&self.cookie),
            "form": section(&self.form),
            "body": self.body.as_ref().map_or(Value::Null, ParameterValue::to_json),
        })
    }
}
