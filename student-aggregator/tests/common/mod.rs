#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, Once};
use student_aggregator::{
    AggregatorError, CandidateRecord, Field, FieldValue, HttpResponse, HttpTransport, Quality, Result, SourceKind,
};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// One request as seen by the transport.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub url: String,
    pub query: BTreeMap<String, String>,
}

/// Replays canned responses in order. Once the script runs out, every call
/// gets the fallback (a network error when none is set).
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse>>>,
    fallback: Option<HttpResponse>,
    seen: Mutex<Vec<SeenRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<HttpResponse>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub fn statuses(statuses: &[u16]) -> Self {
        Self::new(
            statuses
                .iter()
                .map(|status| Ok(HttpResponse::with_status(*status, "{}")))
                .collect(),
        )
    }

    pub fn with_fallback(mut self, response: HttpResponse) -> Self {
        self.fallback = Some(response);
        self
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse> {
        self.seen.lock().unwrap().push(SeenRequest {
            url: url.to_string(),
            query: query.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        });
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(response) => response,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| AggregatorError::Network("script exhausted".to_string())),
        }
    }
}

/// Record with explicit identifiers and text fields.
pub fn record(source: SourceKind, quality: Quality, ids: &[&str], fields: &[(Field, &str)]) -> CandidateRecord {
    CandidateRecord::new(
        source,
        quality,
        ids.iter().map(|id| id.to_string()),
        fields
            .iter()
            .map(|(field, value)| (*field, FieldValue::text(*value)))
            .collect(),
    )
}
