use futures::FutureExt;
use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use tokio::sync::oneshot;

use crate::domain::computing_status::notification::ObservationKey;
use crate::domain::computing_status::running_status::RawStatus;
use crate::domain::computing_status::status_fetcher::StatusFetcher;
use crate::error::FetchError;

/// Scripted answer to one fetch. `Err` stands for a transport failure.
pub type MockAnswer = Result<RawStatus, String>;

#[derive(Debug)]
enum ScriptedResponse {
    Ready(MockAnswer),
    Gated(oneshot::Receiver<MockAnswer>),
}

/// Fetcher answering from a script, one entry per call, in call order.
///
/// Gated entries resolve only when the test sends through the returned
/// sender, which lets tests choose the order in which fetches complete.
/// Once the script is empty the fallback answer is used.
#[derive(Debug, Default)]
pub struct MockStatusFetcher {
    script: Mutex<VecDeque<ScriptedResponse>>,
    fallback: Option<MockAnswer>,
    calls: Mutex<Vec<ObservationKey>>,
}

impl MockStatusFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn always(raw: &str) -> Self {
        Self { fallback: Some(Ok(Some(raw.to_string()))), ..Self::default() }
    }

    pub fn push_ready(&self, raw: Option<&str>) {
        self.push(ScriptedResponse::Ready(Ok(raw.map(str::to_string))));
    }

    pub fn push_failure(&self, reason: &str) {
        self.push(ScriptedResponse::Ready(Err(reason.to_string())));
    }

    pub fn push_gated(&self) -> oneshot::Sender<MockAnswer> {
        let (tx, rx) = oneshot::channel();
        self.push(ScriptedResponse::Gated(rx));
        tx
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn called_keys(&self) -> Vec<ObservationKey> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn push(&self, response: ScriptedResponse) {
        self.script.lock().unwrap_or_else(PoisonError::into_inner).push_back(response);
    }
}

fn into_fetch_result(answer: MockAnswer) -> Result<RawStatus, FetchError> {
    answer.map_err(FetchError::Aborted)
}

impl StatusFetcher for MockStatusFetcher {
    fn fetch_status(&self, key: &ObservationKey) -> BoxFuture<'static, Result<RawStatus, FetchError>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(key.clone());
        let next = self.script.lock().unwrap_or_else(PoisonError::into_inner).pop_front();

        match next {
            Some(ScriptedResponse::Ready(answer)) => futures::future::ready(into_fetch_result(answer)).boxed(),
            Some(ScriptedResponse::Gated(rx)) => async move {
                match rx.await {
                    Ok(answer) => into_fetch_result(answer),
                    Err(_) => Err(FetchError::Aborted("gate dropped".to_string())),
                }
            }
            .boxed(),
            None => {
                let answer = self.fallback.clone().unwrap_or_else(|| Err("no scripted response".to_string()));
                futures::future::ready(into_fetch_result(answer)).boxed()
            }
        }
    }
}
