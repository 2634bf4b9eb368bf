// Shared fixtures for integration tests
#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use streamscribe::store::{MemoryStore, NewSessionRecord, SessionStore, StoredSession};
use streamscribe::{Decoder, Hypothesis, RecognizerEngine};

/// One scripted decoder reaction per audio chunk
pub enum Step {
    Partial(&'static str),
    Final(&'static str),
    Fail(&'static str),
}

/// Decoder that replays a fixed script, then reports empty partials
pub struct ScriptedDecoder {
    script: VecDeque<Step>,
    trailing: String,
    pub flushes: Arc<AtomicUsize>,
}

impl ScriptedDecoder {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            script: script.into(),
            trailing: String::new(),
            flushes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_trailing(mut self, trailing: &str) -> Self {
        self.trailing = trailing.to_string();
        self
    }

    pub fn boxed(self) -> Box<dyn Decoder> {
        Box::new(self)
    }
}

#[async_trait::async_trait]
impl Decoder for ScriptedDecoder {
    async fn feed(&mut self, _chunk: &[u8]) -> Result<Hypothesis> {
        match self.script.pop_front() {
            Some(Step::Partial(text)) => Ok(Hypothesis::Partial(text.to_string())),
            Some(Step::Final(text)) => Ok(Hypothesis::Final(text.to_string())),
            Some(Step::Fail(reason)) => Err(anyhow!(reason)),
            None => Ok(Hypothesis::Partial(String::new())),
        }
    }

    async fn flush(&mut self) -> Result<String> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(std::mem::take(&mut self.trailing))
    }
}

/// Engine whose decoders never produce text; optionally refuses to allocate
pub struct StubEngine {
    pub available: bool,
}

#[async_trait::async_trait]
impl RecognizerEngine for StubEngine {
    async fn create_decoder(&self, _session_id: &str) -> Result<Box<dyn Decoder>> {
        if !self.available {
            bail!("decoder service offline");
        }
        Ok(ScriptedDecoder::new(Vec::new()).boxed())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// MemoryStore that counts `create_session` calls
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    pub creates: AtomicUsize,
}

impl CountingStore {
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SessionStore for CountingStore {
    async fn create_session(&self, record: NewSessionRecord) -> Result<StoredSession> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create_session(record).await
    }

    async fn list_sessions(&self, skip: usize, limit: usize) -> Result<Vec<StoredSession>> {
        self.inner.list_sessions(skip, limit).await
    }

    async fn get_session(&self, id: &str) -> Result<Option<StoredSession>> {
        self.inner.get_session(id).await
    }

    async fn delete_session(&self, id: &str) -> Result<bool> {
        self.inner.delete_session(id).await
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Store whose writes always fail
pub struct FailingStore;

#[async_trait::async_trait]
impl SessionStore for FailingStore {
    async fn create_session(&self, record: NewSessionRecord) -> Result<StoredSession> {
        bail!("disk full while writing {}", record.id)
    }

    async fn list_sessions(&self, _skip: usize, _limit: usize) -> Result<Vec<StoredSession>> {
        Ok(Vec::new())
    }

    async fn get_session(&self, _id: &str) -> Result<Option<StoredSession>> {
        Ok(None)
    }

    async fn delete_session(&self, _id: &str) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "failing"
    }
}

pub fn counting_store() -> Arc<CountingStore> {
    Arc::new(CountingStore::default())
}
